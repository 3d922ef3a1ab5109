//! SMD → Igor Binary Wave conversion.
//!
//! Builds wave objects from a parsed SMD file; writing them to disk is the
//! caller's job (via `ibw-io`). Two products: the hyperspectral data cube of
//! one detector, and a 1-D spectral axis in a chosen unit.

use crate::error::SmdError;
use crate::note::NoteGenerator;
use crate::parser::{SimpleCubeParser, SpectralUnit};
use ibw_core::wave::{BinaryWave5, WaveError};
use thiserror::Error;

/// IBW spatial axis order. SMD stores spatial dimensions as Z, Y, X; Igor
/// convention is X, Y, Z, so axis `i` of the output maps to SMD axis `2-i`.
pub const IBW_SPATIAL_AXES: [&str; 3] = ["X", "Y", "Z"];

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Smd(#[from] SmdError),
    #[error(transparent)]
    Wave(#[from] WaveError),
}

/// Builds IBW wave objects from one parsed SMD file.
pub struct IbwConverter<'a> {
    smd_data: &'a SimpleCubeParser,
}

impl<'a> IbwConverter<'a> {
    pub fn new(smd_data: &'a SimpleCubeParser) -> Self {
        Self { smd_data }
    }

    pub fn smd_data(&self) -> &SimpleCubeParser {
        self.smd_data
    }

    /// Build the hyperspectral image wave for one detector.
    ///
    /// The cube is transposed from SMD order `(Z, Y, X, R)` to IBW order
    /// `(X, Y, Z, R)`, and carries the acquisition timestamp, per-axis
    /// units and `(start, step)` scaling, and the generated note.
    pub fn make_body(&self, name: &str, detector_id: usize) -> Result<BinaryWave5, ConvertError> {
        let arr = self.smd_data.detector_array(detector_id)?.transpose_spatial();
        let (shape, data) = arr.into_parts();
        let mut wave = BinaryWave5::from_f32(name, &shape, data)?;

        wave.set_creation_time(self.smd_data.creation_datetime());

        // spatial units and scales, reversed into IBW axis order
        let units = self.smd_data.spatial_units();
        let scales = self.smd_data.spatial_scales();
        for axis in 0..IBW_SPATIAL_AXES.len() {
            let smd_axis = 2 - axis;
            wave.set_axis_unit(axis, units[smd_axis])?;
            let (start, step) = scales[smd_axis];
            wave.set_axis_scale(axis, start, step)?;
        }

        let mut notegen = NoteGenerator::new(self.smd_data);
        notegen.set_detector_id(detector_id);
        wave.set_note(&notegen.generate()?);

        Ok(wave)
    }

    /// Build the 1-D spectral axis wave for one detector, in the given unit.
    /// No metadata beyond the name is attached.
    pub fn make_spectral_axis(
        &self,
        name: &str,
        detector_id: usize,
        unit: SpectralUnit,
    ) -> Result<BinaryWave5, ConvertError> {
        let axis = self.smd_data.spectral_axis(detector_id, unit)?;
        let len = axis.len();
        Ok(BinaryWave5::from_f32(name, &[len], axis)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{sample_file, SampleSmd};
    use ibw_core::wave::WaveData;

    fn parse_default() -> SimpleCubeParser {
        SimpleCubeParser::from_bytes(&sample_file(&SampleSmd::default())).unwrap()
    }

    #[test]
    fn test_make_body_transposes_spatial_axes() {
        let parser = parse_default();
        let wave = IbwConverter::new(&parser).make_body("map1", 0).unwrap();

        // SMD (Z=2, Y=3, X=4, R=5) -> IBW (X=4, Y=3, Z=2, R=5)
        assert_eq!(wave.shape(), &[4, 3, 2, 5]);

        let original = parser.detector_array(0).unwrap();
        let WaveData::Float32(data) = wave.data() else {
            panic!("body wave must be f32");
        };
        // spot-check wave[x][y][z][r] == cube[z][y][x][r]
        let idx = |x: usize, y: usize, z: usize, r: usize| ((x * 3 + y) * 2 + z) * 5 + r;
        assert_eq!(data[idx(3, 1, 0, 2)], original.get(0, 1, 3, 2));
        assert_eq!(data[idx(0, 2, 1, 4)], original.get(1, 2, 0, 4));
    }

    #[test]
    fn test_make_body_metadata() {
        let parser = parse_default();
        let wave = IbwConverter::new(&parser).make_body("map1", 0).unwrap();

        assert_eq!(wave.creation_time(), Some(parser.creation_datetime()));

        // axis metadata in X, Y, Z order (SMD header is Z, Y, X)
        assert_eq!(wave.axis_unit(0), "um");
        assert_eq!(wave.axis_scale(0), (5.0, 1.0)); // X
        assert_eq!(wave.axis_scale(1), (3.0, 3.0)); // Y
        assert_eq!(wave.axis_scale(2), (0.0, 2.0)); // Z

        assert!(wave.note().starts_with("<Acquisition date>"));
        assert!(wave.note().contains("Exposure Time: 1 s"));
    }

    #[test]
    fn test_make_spectral_axis() {
        let parser = parse_default();
        let converter = IbwConverter::new(&parser);

        let wave = converter
            .make_spectral_axis("ramanshift", 0, SpectralUnit::InvCm)
            .unwrap();
        assert_eq!(wave.shape(), &[5]);
        assert_eq!(wave.note(), "");
        assert_eq!(wave.creation_time(), None);

        let WaveData::Float32(axis) = wave.data() else {
            panic!("axis wave must be f32");
        };
        assert_eq!(axis[0], 0.0);
        assert_eq!(axis[1], (1.0f32 / 532.0 - 1.0f32 / 533.0) * 1e7);
    }

    #[test]
    fn test_propagates_component_errors() {
        let parser = parse_default();
        let converter = IbwConverter::new(&parser);

        assert!(matches!(
            converter.make_body("map1", 7),
            Err(ConvertError::Smd(SmdError::InvalidDetector { id: 7, count: 1 }))
        ));
        assert!(matches!(
            converter.make_spectral_axis("axis", 7, SpectralUnit::Nm),
            Err(ConvertError::Smd(SmdError::InvalidDetector { .. }))
        ));
        // the wave library's own name check still applies
        assert!(matches!(
            converter.make_body("0bad name", 0),
            Err(ConvertError::Wave(WaveError::Name(_)))
        ));
    }
}
