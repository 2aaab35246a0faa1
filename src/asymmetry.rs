//! Lateral shape asymmetry from eigenvalue spectra
//!
//! For every selected left/right pair the first two spectrum entries are
//! dropped and the remaining eigenvalues are compared under a
//! [`DistanceMetric`]. Pairs with non-finite values score NaN and are
//! reported as [`AsymmetryDiagnostic`]s; they never abort the batch.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalogue::{select_pairs, StructurePair};
use crate::error::{BrainprintError, Result};

/// Leading spectrum entries that carry no shape-discriminative information.
pub const TRIMMED_ENTRIES: usize = 2;

/// ShapeDNA distance between two spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceMetric {
    /// `euc`
    #[default]
    Euclidean,
    /// `cityblock`
    CityBlock,
    /// `chebyshev`
    Chebyshev,
}

impl FromStr for DistanceMetric {
    type Err = BrainprintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "euc" | "euclidean" => Ok(DistanceMetric::Euclidean),
            "cityblock" | "manhattan" => Ok(DistanceMetric::CityBlock),
            "chebyshev" => Ok(DistanceMetric::Chebyshev),
            other => Err(BrainprintError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistanceMetric::Euclidean => "euc",
            DistanceMetric::CityBlock => "cityblock",
            DistanceMetric::Chebyshev => "chebyshev",
        })
    }
}

impl TryFrom<String> for DistanceMetric {
    type Error = BrainprintError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DistanceMetric> for String {
    fn from(m: DistanceMetric) -> Self {
        m.to_string()
    }
}

/// Distance between two equally long spectra.
///
/// Callers check lengths; `score_pairs` scores mismatched pairs NaN.
pub fn compute_distance(a: &[f64], b: &[f64], metric: DistanceMetric) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "spectra differ in length");
    let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
    match metric {
        DistanceMetric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
        DistanceMetric::CityBlock => diffs.sum(),
        DistanceMetric::Chebyshev => diffs.fold(0.0, f64::max),
    }
}

/// Why a pair was scored NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetryDiagnostic {
    pub key: String,
    pub left: &'static str,
    pub right: &'static str,
    pub reason: String,
}

/// Distances keyed by `"{left}_{right}"`, plus notices for NaN pairs.
#[derive(Debug, Clone, Default)]
pub struct AsymmetryReport {
    pub distances: BTreeMap<String, f64>,
    pub diagnostics: Vec<AsymmetryDiagnostic>,
}

impl AsymmetryReport {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.distances.get(key).copied()
    }
}

fn trimmed<'a>(spectra: &'a BTreeMap<String, Vec<f64>>, name: &str) -> Result<&'a [f64]> {
    let spectrum = spectra
        .get(name)
        .ok_or_else(|| BrainprintError::MissingSpectrum(name.to_string()))?;
    Ok(spectrum.get(TRIMMED_ENTRIES..).unwrap_or(&[]))
}

/// Score the given pairs.
///
/// A structure named by a pair but absent from `spectra` is an error.
pub fn score_pairs(
    spectra: &BTreeMap<String, Vec<f64>>,
    pairs: &[StructurePair],
    metric: DistanceMetric,
) -> Result<AsymmetryReport> {
    let mut report = AsymmetryReport::default();
    for pair in pairs {
        let left = trimmed(spectra, pair.left)?;
        let right = trimmed(spectra, pair.right)?;
        let key = pair.key();

        if left.len() != right.len() {
            warn!(
                left = pair.left,
                right = pair.right,
                left_len = left.len(),
                right_len = right.len(),
                "spectra differ in length, skipping asymmetry computation"
            );
            report.diagnostics.push(AsymmetryDiagnostic {
                key: key.clone(),
                left: pair.left,
                right: pair.right,
                reason: format!(
                    "{} has {} eigenvalues, {} has {}",
                    pair.left,
                    left.len(),
                    pair.right,
                    right.len()
                ),
            });
            report.distances.insert(key, f64::NAN);
            continue;
        }

        let has_non_finite = left.iter().chain(right).any(|v| !v.is_finite());
        if has_non_finite {
            warn!(
                left = pair.left,
                right = pair.right,
                "non-finite eigenvalues, skipping asymmetry computation"
            );
            report.diagnostics.push(AsymmetryDiagnostic {
                key: key.clone(),
                left: pair.left,
                right: pair.right,
                reason: format!("NaNs found for {} or {}", pair.left, pair.right),
            });
            report.distances.insert(key, f64::NAN);
        } else {
            report.distances.insert(key, compute_distance(left, right, metric));
        }
    }
    Ok(report)
}

/// Score the subcortical pairs plus the cortical and cerebellar pairs not
/// skipped by the flags.
pub fn compute_asymmetry(
    spectra: &BTreeMap<String, Vec<f64>>,
    metric: DistanceMetric,
    skip_cortex: bool,
    skip_cerebellum: bool,
) -> Result<AsymmetryReport> {
    score_pairs(spectra, &select_pairs(skip_cortex, skip_cerebellum), metric)
}
