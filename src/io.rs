// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Loading raw output tensors from disk.
//!
//! Two formats are understood:
//!
//! - `.json`: `{"shape": [1, 84, 8400], "data": [...]}`
//! - anything else: raw little-endian `f32` values, with the shape supplied
//!   separately (for example a dump of the inference engine's output buffer).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DecodeError, Result};

/// A raw output tensor with its shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TensorFile {
    /// Tensor dimensions, e.g. `[1, 84, 8400]`.
    pub shape: Vec<usize>,
    /// Flat row-major values.
    pub data: Vec<f32>,
}

impl TensorFile {
    /// Check that `data` holds exactly as many values as `shape` implies.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ShapeError`] on mismatch.
    pub fn validate(&self) -> Result<()> {
        let expected = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| DecodeError::ShapeError(format!("shape {:?} overflows", self.shape)))?;
        if expected != self.data.len() {
            return Err(DecodeError::ShapeError(format!(
                "tensor file has {} values but shape {:?} implies {expected}",
                self.data.len(),
                self.shape
            )));
        }
        Ok(())
    }
}

/// Load a tensor from `path`.
///
/// # Arguments
///
/// * `path` - A `.json` tensor file or a raw little-endian `f32` dump.
/// * `shape` - Required for raw dumps. For JSON files, if given it must match
///   the shape stored in the file.
///
/// # Errors
///
/// Returns [`DecodeError::Io`] if the file cannot be read,
/// [`DecodeError::ParseError`] for malformed contents or a raw dump without a
/// shape, and [`DecodeError::ShapeError`] if data and shape disagree.
pub fn load_tensor<P: AsRef<Path>>(path: P, shape: Option<&[usize]>) -> Result<TensorFile> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let tensor = if is_json {
        let file: TensorFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        if let Some(shape) = shape.filter(|s| *s != file.shape.as_slice()) {
            return Err(DecodeError::ShapeError(format!(
                "{} declares shape {:?}, expected {shape:?}",
                path.display(),
                file.shape
            )));
        }
        file
    } else {
        let shape = shape.ok_or_else(|| {
            DecodeError::ParseError(format!(
                "raw tensor file {} needs an explicit shape",
                path.display()
            ))
        })?;
        TensorFile {
            shape: shape.to_vec(),
            data: parse_f32_le(&fs::read(path)?)?,
        }
    };

    tensor.validate()?;
    Ok(tensor)
}

/// Parse a comma- or `x`-separated shape such as `1,84,8400`.
///
/// # Errors
///
/// Returns [`DecodeError::ParseError`] on an empty shape or non-numeric dimension.
pub fn parse_shape(s: &str) -> Result<Vec<usize>> {
    let dims = s
        .split([',', 'x'])
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .map_err(|_| DecodeError::ParseError(format!("invalid shape '{s}'")))
        })
        .collect::<Result<Vec<_>>>()?;
    if dims.is_empty() {
        return Err(DecodeError::ParseError("empty shape".to_string()));
    }
    Ok(dims)
}

fn parse_f32_le(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::ParseError(format!(
            "raw tensor size {} is not a multiple of 4 bytes",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
