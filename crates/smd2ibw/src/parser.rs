//! SMD file parsing.
//!
//! An SMD file is an XML-like header terminated by the literal marker
//! `</SCANDATA>\r\n`, followed by a dense payload of little-endian f32
//! samples in row-major `[Z][Y][X][R]` order, where `R` concatenates the
//! spectral axes of all detectors.
//!
//! `SmdReader` handles any SMD file at the byte level: header parsing, body
//! access, and byte-verbatim save. `SimpleCubeParser` adds the array model
//! for the supported single-channel/single-series layout; files with more
//! channels or series per detector are rejected outright.

use crate::cube::Cube;
use crate::error::SmdError;
use crate::header::{ChannelInfo, DataCalibration, SmdHeader};
use chrono::NaiveDateTime;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Header/body boundary marker. The header bytes keep the marker.
pub const XML_BORDER: &[u8] = b"</SCANDATA>\r\n";

/// Speed of light in m/s, as used by the reference tool.
pub const LIGHT_C: f32 = 2.998e8;

/// Raman shift scale: converts 1/nm to 1/cm.
const RAMAN_SHIFT_SCALE: f32 = 1e7;

// ─── Spectral axis units ────────────────────────────────────────────────────

/// Unit of a derived spectral axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralUnit {
    /// Native wavelength (nm).
    Nm,
    /// Raman shift (cm-1), relative to the excitation wavelength.
    InvCm,
    /// Brillouin frequency shift (GHz), relative to the excitation
    /// wavelength.
    GigaHz,
}

pub const SPECTRAL_UNITS: [SpectralUnit; 3] =
    [SpectralUnit::Nm, SpectralUnit::InvCm, SpectralUnit::GigaHz];

impl SpectralUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpectralUnit::Nm => "nm",
            SpectralUnit::InvCm => "cm-1",
            SpectralUnit::GigaHz => "GHz",
        }
    }
}

impl fmt::Display for SpectralUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectralUnit {
    type Err = SmdError;

    fn from_str(s: &str) -> Result<Self, SmdError> {
        match s {
            "nm" => Ok(SpectralUnit::Nm),
            "cm-1" => Ok(SpectralUnit::InvCm),
            "GHz" => Ok(SpectralUnit::GigaHz),
            other => Err(SmdError::InvalidUnit(other.to_string())),
        }
    }
}

// ─── Generic reader ─────────────────────────────────────────────────────────

/// Byte-level view of an SMD file: parsed header plus the raw body buffer.
#[derive(Debug, Clone)]
pub struct SmdReader {
    header: SmdHeader,
    body: Vec<u8>,
}

impl SmdReader {
    /// Split a raw file buffer at the boundary marker and parse the header.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, SmdError> {
        let pos = find_border(buffer)
            .ok_or_else(|| SmdError::Format("header boundary marker not found".into()))?;
        let split = pos + XML_BORDER.len();

        let header = SmdHeader::parse(buffer[..split].to_vec())?;
        Ok(Self {
            header,
            body: buffer[split..].to_vec(),
        })
    }

    /// Load an SMD file into memory and parse it.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, SmdError> {
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn header(&self) -> &SmdHeader {
        &self.header
    }

    pub fn creation_datetime(&self) -> NaiveDateTime {
        self.header.frame_header.creation_datetime
    }

    /// Excitation laser wavelength in nm.
    pub fn excite_nm(&self) -> f64 {
        self.header.frame_options.excitation_nm
    }

    /// Grating groove density (grooves/mm).
    pub fn grating_groove(&self) -> u32 {
        self.header.frame_options.grating_groove
    }

    /// Grating central wavelength in nm.
    pub fn central_wavelength(&self) -> f64 {
        self.header.frame_options.central_wavelength
    }

    pub fn detector_count(&self) -> usize {
        self.header.frame_options.multi_detection_count()
    }

    pub fn data_calibrations(&self) -> &[DataCalibration] {
        &self.header.data_calibrations
    }

    /// Spatial pixel counts in Z, Y, X order.
    pub fn spatial_size(&self) -> [usize; 3] {
        self.header.stage_parameters.spatial_size()
    }

    /// Per-axis `(start, step)` real-space scaling in Z, Y, X order.
    pub fn spatial_scales(&self) -> [(f64, f64); 3] {
        self.header.stage_parameters.spatial_scales()
    }

    /// Per-axis unit names in Z, Y, X order.
    pub fn spatial_units(&self) -> [&str; 3] {
        self.header.stage_parameters.spatial_units()
    }

    /// Real-space coordinate arrays (`start + i*step`) in Z, Y, X order.
    pub fn spatial_axes(&self) -> [Vec<f64>; 3] {
        let sizes = self.spatial_size();
        let scales = self.spatial_scales();
        std::array::from_fn(|i| {
            let (start, step) = scales[i];
            (0..sizes[i]).map(|n| start + n as f64 * step).collect()
        })
    }

    /// Raw payload bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replace the payload bytes. The header is untouched.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Write header + current body verbatim. Fields this crate never touches
    /// pass through byte-for-byte.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SmdError> {
        let mut buffer = Vec::with_capacity(self.header.buffer().len() + self.body.len());
        buffer.extend_from_slice(self.header.buffer());
        buffer.extend_from_slice(&self.body);
        fs::write(path, buffer)?;
        Ok(())
    }
}

fn find_border(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(XML_BORDER.len())
        .position(|window| window == XML_BORDER)
}

// ─── Single-channel cube parser ─────────────────────────────────────────────

/// Parser for SMD files with one channel per detector and one series per
/// channel. The payload is held as a 4-D cube `[Z][Y][X][R]` with the
/// detectors' spectral axes concatenated along `R`.
#[derive(Debug, Clone)]
pub struct SimpleCubeParser {
    reader: SmdReader,
    detectors: Vec<ChannelInfo>,
    cube: Cube,
}

impl SimpleCubeParser {
    pub fn new(reader: SmdReader) -> Result<Self, SmdError> {
        Self::validate(&reader)?;

        let detectors: Vec<ChannelInfo> = reader
            .data_calibrations()
            .iter()
            .map(|calib| calib.channels[0].clone())
            .collect();

        let [z, y, x] = reader.spatial_size();
        let r = detectors.iter().map(|d| d.size).sum();
        let cube = Cube::from_le_bytes([z, y, x, r], reader.body())?;

        Ok(Self {
            reader,
            detectors,
            cube,
        })
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<Self, SmdError> {
        Self::new(SmdReader::from_bytes(buffer)?)
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, SmdError> {
        Self::new(SmdReader::read_file(path)?)
    }

    /// Reject layouts with more than one channel per detector or more than
    /// one series per channel.
    fn validate(reader: &SmdReader) -> Result<(), SmdError> {
        for (id, calib) in reader.data_calibrations().iter().enumerate() {
            if calib.channel_count != 1 {
                return Err(SmdError::UnsupportedFormat {
                    detector: id,
                    kind: "channels",
                    count: calib.channel_count,
                });
            }
            for channel in &calib.channels {
                if channel.series_count != 1 {
                    return Err(SmdError::UnsupportedFormat {
                        detector: id,
                        kind: "series",
                        count: channel.series_count,
                    });
                }
            }
        }
        Ok(())
    }

    /// The underlying byte-level reader.
    pub fn reader(&self) -> &SmdReader {
        &self.reader
    }

    pub fn creation_datetime(&self) -> NaiveDateTime {
        self.reader.creation_datetime()
    }

    pub fn excite_nm(&self) -> f64 {
        self.reader.excite_nm()
    }

    pub fn grating_groove(&self) -> u32 {
        self.reader.grating_groove()
    }

    pub fn central_wavelength(&self) -> f64 {
        self.reader.central_wavelength()
    }

    pub fn detector_count(&self) -> usize {
        self.reader.detector_count()
    }

    pub fn spatial_size(&self) -> [usize; 3] {
        self.reader.spatial_size()
    }

    pub fn spatial_scales(&self) -> [(f64, f64); 3] {
        self.reader.spatial_scales()
    }

    pub fn spatial_units(&self) -> [&str; 3] {
        self.reader.spatial_units()
    }

    /// The single channel of each detector, in detector order.
    pub fn detectors(&self) -> &[ChannelInfo] {
        &self.detectors
    }

    /// Spectral sample count per detector, in detector order.
    pub fn detector_sizes(&self) -> Vec<usize> {
        self.detectors.iter().map(|d| d.size).collect()
    }

    /// Device name per detector, in detector order.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors
            .iter()
            .map(|d| d.device_name.as_str())
            .collect()
    }

    /// Shape of the full cube, `[Z, Y, X, R]`.
    pub fn full_shape(&self) -> [usize; 4] {
        self.cube.shape()
    }

    pub fn full_array(&self) -> &Cube {
        &self.cube
    }

    /// Replace the cube. The new array must have exactly the original shape;
    /// the body buffer is re-serialized from it.
    pub fn change_values(&mut self, array: Cube) -> Result<(), SmdError> {
        if array.shape() != self.cube.shape() {
            return Err(SmdError::ShapeMismatch {
                expected: self.cube.shape(),
                got: array.shape(),
            });
        }
        self.reader.set_body(array.to_le_bytes());
        self.cube = array;
        Ok(())
    }

    fn check_detector_id(&self, detector_id: usize) -> Result<(), SmdError> {
        if detector_id >= self.detector_count() {
            return Err(SmdError::InvalidDetector {
                id: detector_id,
                count: self.detector_count(),
            });
        }
        Ok(())
    }

    /// The given detector's `[Z][Y][X][size]` block of the cube.
    pub fn detector_array(&self, detector_id: usize) -> Result<Cube, SmdError> {
        self.check_detector_id(detector_id)?;

        let start = self.detectors[..detector_id]
            .iter()
            .map(|d| d.size)
            .sum();
        Ok(self.cube.slice_last(start, self.detectors[detector_id].size))
    }

    /// Shape of one detector's block, `[Z, Y, X, size]`.
    pub fn detector_array_shape(&self, detector_id: usize) -> Result<[usize; 4], SmdError> {
        self.check_detector_id(detector_id)?;
        let [z, y, x] = self.spatial_size();
        Ok([z, y, x, self.detectors[detector_id].size])
    }

    /// Spectral sample count of one detector.
    pub fn spectral_size(&self, detector_id: usize) -> Result<usize, SmdError> {
        self.check_detector_id(detector_id)?;
        Ok(self.detectors[detector_id].size)
    }

    /// The detector's native wavelength axis, in nm.
    pub fn channel_axis_array(&self, detector_id: usize) -> Result<&[f32], SmdError> {
        self.check_detector_id(detector_id)?;
        Ok(&self.detectors[detector_id].axis_array)
    }

    /// The detector's spectral axis in the requested unit.
    ///
    /// The whole computation stays in single precision, and the GHz form
    /// divides c in m/s by wavelengths in nm, exactly as the reference tool
    /// does; keep both so output values stay bit-compatible.
    pub fn spectral_axis(
        &self,
        detector_id: usize,
        unit: SpectralUnit,
    ) -> Result<Vec<f32>, SmdError> {
        self.check_detector_id(detector_id)?;

        let excite = self.excite_nm() as f32;
        let wavelength = &self.detectors[detector_id].axis_array;
        let axis = match unit {
            SpectralUnit::Nm => wavelength.clone(),
            SpectralUnit::InvCm => wavelength
                .iter()
                .map(|&wl| (1.0 / excite - 1.0 / wl) * RAMAN_SHIFT_SCALE)
                .collect(),
            SpectralUnit::GigaHz => wavelength
                .iter()
                .map(|&wl| LIGHT_C / excite - LIGHT_C / wl)
                .collect(),
        };
        Ok(axis)
    }
}
