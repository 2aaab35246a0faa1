//! Segmentation volume reading for label preflight checks
//!
//! Surface extraction itself is delegated to FreeSurfer tools; this module
//! only reads a segmentation far enough to report which label codes it
//! contains, so structures that would produce an empty mask can be flagged
//! before any tool runs.
//!
//! Supports NIfTI (`.nii`, `.nii.gz`) through the `nifti` crate and
//! FreeSurfer MGH (`.mgh`, `.mgz`).

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::Array;
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiObject};

use crate::catalogue::{LabelCatalogue, StructureLabelSpec};
use crate::error::{BrainprintError, Result};

/// MGH header length; voxel data starts right after it.
const MGH_HEADER_BYTES: usize = 284;

/// Label census of a segmentation volume.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVolume {
    pub dims: (usize, usize, usize),
    /// Voxel count per non-negative integer label (background included)
    pub label_counts: BTreeMap<u32, usize>,
}

/// Check if bytes are gzip compressed
fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn gunzip(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::new();
    GzDecoder::new(Cursor::new(bytes))
        .read_to_end(&mut out)
        .map_err(|e| format!("gzip decompression failed: {}", e))?;
    Ok(out)
}

fn count_labels(values: impl Iterator<Item = f64>) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for v in values {
        let label = v.round();
        if label >= 0.0 && label <= u32::MAX as f64 {
            *counts.entry(label as u32).or_insert(0) += 1;
        }
    }
    counts
}

fn load_nifti_labels(bytes: &[u8]) -> std::result::Result<LabelVolume, String> {
    let obj: InMemNiftiObject = if is_gzip(bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes)))
            .map_err(|e| format!("Failed to read gzipped NIfTI: {}", e))?
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))
            .map_err(|e| format!("Failed to read NIfTI: {}", e))?
    };

    let ndim = obj.header().dim[0] as usize;
    if ndim < 3 {
        return Err(format!("Expected at least 3D volume, got {}D", ndim));
    }

    let volume = obj.into_volume();
    let array: Array<f64, _> = volume
        .into_ndarray()
        .map_err(|e| format!("Failed to convert to ndarray: {}", e))?;

    let shape = array.shape().to_vec();
    if shape.len() < 3 {
        return Err(format!("Expected at least 3D array, got {}D", shape.len()));
    }

    Ok(LabelVolume {
        dims: (shape[0], shape[1], shape[2]),
        label_counts: count_labels(array.iter().copied()),
    })
}

fn be_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn load_mgh_labels(bytes: &[u8]) -> std::result::Result<LabelVolume, String> {
    if bytes.len() < MGH_HEADER_BYTES {
        return Err(format!("File too small ({} bytes, need at least {})", bytes.len(), MGH_HEADER_BYTES));
    }
    let version = be_i32(bytes, 0);
    if version != 1 {
        return Err(format!("Unsupported MGH version {}", version));
    }
    let dims = [be_i32(bytes, 4), be_i32(bytes, 8), be_i32(bytes, 12), be_i32(bytes, 16)];
    if dims.iter().any(|&d| d < 1) {
        return Err(format!("Invalid MGH dimensions {:?}", dims));
    }
    let (nx, ny, nz, nframes) = (dims[0] as usize, dims[1] as usize, dims[2] as usize, dims[3] as usize);
    let data_type = be_i32(bytes, 20);

    // MRI_UCHAR = 0, MRI_INT = 1, MRI_FLOAT = 3, MRI_SHORT = 4
    let width = match data_type {
        0 => 1,
        1 | 3 => 4,
        4 => 2,
        other => return Err(format!("Unsupported MGH data type {}", other)),
    };
    // Only the first frame carries labels
    let end = nx
        .checked_mul(ny)
        .and_then(|n| n.checked_mul(nz))
        .and_then(|n| n.checked_mul(width))
        .and_then(|n| n.checked_add(MGH_HEADER_BYTES))
        .ok_or_else(|| format!("MGH dimensions overflow: {}x{}x{}", nx, ny, nz))?;
    if bytes.len() < end {
        return Err(format!(
            "Truncated MGH data: need {} bytes for {}x{}x{}x{}, have {}",
            end, nx, ny, nz, nframes, bytes.len()
        ));
    }
    let data = &bytes[MGH_HEADER_BYTES..end];

    let label_counts = match data_type {
        0 => count_labels(data.iter().map(|&b| b as f64)),
        1 => count_labels(data.chunks_exact(4).map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64)),
        3 => count_labels(data.chunks_exact(4).map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64)),
        _ => count_labels(data.chunks_exact(2).map(|c| i16::from_be_bytes([c[0], c[1]]) as f64)),
    };

    Ok(LabelVolume {
        dims: (nx, ny, nz),
        label_counts,
    })
}

impl LabelVolume {
    /// Read a segmentation volume, choosing the decoder by file extension.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| BrainprintError::parse(path, e.to_string()))?;
        let name = path.to_string_lossy();
        let parsed = if name.ends_with(".mgz") || name.ends_with(".mgh") {
            if is_gzip(&bytes) {
                gunzip(&bytes).and_then(|raw| load_mgh_labels(&raw))
            } else {
                load_mgh_labels(&bytes)
            }
        } else {
            load_nifti_labels(&bytes)
        };
        parsed.map_err(|reason| BrainprintError::parse(path, reason))
    }

    pub fn contains(&self, code: u32) -> bool {
        self.label_counts.contains_key(&code)
    }

    /// Structures of `catalogue` none of whose codes occur in this volume.
    ///
    /// Binarizing such a structure yields an empty mask and marching cubes
    /// will fail on it.
    pub fn missing_structures(&self, catalogue: &LabelCatalogue) -> Vec<&'static StructureLabelSpec> {
        catalogue
            .iter()
            .filter(|s| !s.label_codes.iter().any(|&c| self.contains(c)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn encode_mgh(dims: (usize, usize, usize), labels: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; MGH_HEADER_BYTES];
    let header = [1, dims.0 as i32, dims.1 as i32, dims.2 as i32, 1, 0];
    for (i, v) in header.iter().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&v.to_be_bytes());
    }
    bytes.extend_from_slice(labels);
    bytes
}
