//! In-memory model of a version-5 Igor binary wave.
//!
//! A wave is a named numeric array of up to four dimensions with per-axis
//! unit strings and `(start, step)` scaling, an optional data unit, a
//! creation timestamp, and a free-text note. Numeric payloads are kept in
//! row-major order here; `ibw-io` converts to Igor's column-major layout
//! (first dimension varies fastest) at encode time.

use crate::header::MAX_DIMS;
use crate::name::{validate_name, NameError};
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaveError {
    #[error("invalid wave name: {0}")]
    Name(#[from] NameError),
    #[error("wave must have between 1 and {MAX_DIMS} dimensions (got {0})")]
    BadDimCount(usize),
    #[error("dimension {dim} has zero size")]
    ZeroDim { dim: usize },
    #[error("shape {shape:?} implies {expected} points, data holds {got}")]
    PointCountMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
    #[error("axis index {axis} out of range for a {ndim}-dimensional wave")]
    AxisOutOfRange { axis: usize, ndim: usize },
}

/// Numeric payload of a wave.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveData {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl WaveData {
    pub fn len(&self) -> usize {
        match self {
            WaveData::Float32(v) => v.len(),
            WaveData::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        match self {
            WaveData::Float32(_) => 4,
            WaveData::Float64(_) => 8,
        }
    }
}

/// A version-5 Igor binary wave.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryWave5 {
    name: String,
    shape: Vec<usize>,
    data: WaveData,
    axis_units: [String; MAX_DIMS],
    axis_scales: [(f64, f64); MAX_DIMS], // (start, step)
    data_unit: String,
    note: String,
    creation_time: Option<NaiveDateTime>,
}

impl BinaryWave5 {
    fn new(name: &str, shape: &[usize], data: WaveData) -> Result<Self, WaveError> {
        validate_name(name)?;

        if shape.is_empty() || shape.len() > MAX_DIMS {
            return Err(WaveError::BadDimCount(shape.len()));
        }
        if let Some(dim) = shape.iter().position(|&n| n == 0) {
            return Err(WaveError::ZeroDim { dim });
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(WaveError::PointCountMismatch {
                shape: shape.to_vec(),
                expected,
                got: data.len(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            shape: shape.to_vec(),
            data,
            axis_units: Default::default(),
            axis_scales: [(0.0, 1.0); MAX_DIMS],
            data_unit: String::new(),
            note: String::new(),
            creation_time: None,
        })
    }

    /// Build a single-precision wave from row-major data.
    pub fn from_f32(name: &str, shape: &[usize], data: Vec<f32>) -> Result<Self, WaveError> {
        Self::new(name, shape, WaveData::Float32(data))
    }

    /// Build a double-precision wave from row-major data.
    pub fn from_f64(name: &str, shape: &[usize], data: Vec<f64>) -> Result<Self, WaveError> {
        Self::new(name, shape, WaveData::Float64(data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of points.
    pub fn npnts(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &WaveData {
        &self.data
    }

    fn check_axis(&self, axis: usize) -> Result<(), WaveError> {
        if axis >= self.ndim() {
            return Err(WaveError::AxisOutOfRange {
                axis,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }

    /// Set the unit string of one axis.
    pub fn set_axis_unit(&mut self, axis: usize, unit: &str) -> Result<(), WaveError> {
        self.check_axis(axis)?;
        self.axis_units[axis] = unit.to_string();
        Ok(())
    }

    pub fn axis_unit(&self, axis: usize) -> &str {
        &self.axis_units[axis]
    }

    /// Set the `(start, step)` scaling of one axis.
    pub fn set_axis_scale(&mut self, axis: usize, start: f64, step: f64) -> Result<(), WaveError> {
        self.check_axis(axis)?;
        self.axis_scales[axis] = (start, step);
        Ok(())
    }

    pub fn axis_scale(&self, axis: usize) -> (f64, f64) {
        self.axis_scales[axis]
    }

    pub fn set_data_unit(&mut self, unit: &str) {
        self.data_unit = unit.to_string();
    }

    pub fn data_unit(&self) -> &str {
        &self.data_unit
    }

    pub fn set_note(&mut self, note: &str) {
        self.note = note.to_string();
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn set_creation_time(&mut self, dt: NaiveDateTime) {
        self.creation_time = Some(dt);
    }

    pub fn creation_time(&self) -> Option<NaiveDateTime> {
        self.creation_time
    }
}
