//! Eigenvalue spectra per surface
//!
//! The Laplace-Beltrami eigen-decomposition is supplied by the caller through
//! [`SpectrumSolver`]. This module wraps it with mesh ingestion, optional
//! normalization/reweighting, and the per-structure failure policy: a
//! structure whose spectrum cannot be computed gets an all-NaN row instead of
//! aborting the run.
//!
//! Each stored spectrum is `[area, volume, ev0, ev1, ...]`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BrainprintError, Result};
use crate::mesh::{read_mesh, TriaMesh};

/// Spectrum per structure name.
pub type Spectra = BTreeMap<String, Vec<f64>>;

/// Computes the first `num` Laplace-Beltrami eigenvalues of a mesh, ascending.
pub trait SpectrumSolver {
    fn eigenvalues(&self, mesh: &TriaMesh, num: usize) -> Result<Vec<f64>>;
}

impl<S: SpectrumSolver + ?Sized> SpectrumSolver for &S {
    fn eigenvalues(&self, mesh: &TriaMesh, num: usize) -> Result<Vec<f64>> {
        (**self).eigenvalues(mesh, num)
    }
}

/// Eigenvalue normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Normalization {
    #[default]
    None,
    /// Scale by surface area; `geometry` is accepted as an alias since
    /// area is the geometric measure of a triangle mesh
    Surface,
    /// Scale by enclosed volume to the power 2/3
    Volume,
}

impl FromStr for Normalization {
    type Err = BrainprintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Normalization::None),
            "surface" | "geometry" => Ok(Normalization::Surface),
            "volume" => Ok(Normalization::Volume),
            other => Err(BrainprintError::UnknownNormalization(other.to_string())),
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Normalization::None => "none",
            Normalization::Surface => "surface",
            Normalization::Volume => "volume",
        })
    }
}

impl TryFrom<String> for Normalization {
    type Error = BrainprintError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Normalization> for String {
    fn from(n: Normalization) -> Self {
        n.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumOptions {
    /// Number of eigenvalues requested from the solver
    pub num: usize,
    pub norm: Normalization,
    pub reweight: bool,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            num: 50,
            norm: Normalization::None,
            reweight: false,
        }
    }
}

/// Apply normalization and then reweighting to raw eigenvalues.
pub fn apply_eigenvalue_options(eigenvalues: &mut [f64], mesh: &TriaMesh, options: &SpectrumOptions) {
    let scale = match options.norm {
        Normalization::None => 1.0,
        Normalization::Surface => mesh.area(),
        Normalization::Volume => mesh.volume().powf(2.0 / 3.0),
    };
    if scale != 1.0 {
        eigenvalues.iter_mut().for_each(|ev| *ev *= scale);
    }
    if options.reweight {
        for (i, ev) in eigenvalues.iter_mut().enumerate() {
            *ev /= (i + 1) as f64;
        }
    }
}

/// Spectrum of one surface file: `[area, volume, eigenvalues...]`.
pub fn compute_surface_brainprint<S: SpectrumSolver>(
    path: &Path,
    solver: &S,
    options: &SpectrumOptions,
) -> Result<Vec<f64>> {
    let mesh = read_mesh(path)?;
    let mut eigenvalues = solver.eigenvalues(&mesh, options.num)?;
    apply_eigenvalue_options(&mut eigenvalues, &mesh, options);

    let mut spectrum = Vec::with_capacity(eigenvalues.len() + 2);
    spectrum.push(mesh.area());
    spectrum.push(mesh.volume());
    spectrum.extend(eigenvalues);
    Ok(spectrum)
}

/// Spectra for every surface. Failures become `num + 2` NaN entries.
pub fn compute_brainprint<S: SpectrumSolver>(
    surfaces: &BTreeMap<String, PathBuf>,
    solver: &S,
    options: &SpectrumOptions,
) -> Spectra {
    let nan_row = || vec![f64::NAN; options.num + 2];
    surfaces
        .iter()
        .map(|(name, path)| {
            let spectrum = match compute_surface_brainprint(path, solver, options) {
                Ok(spectrum) if spectrum.len() > 2 => {
                    debug!(structure = %name, n = spectrum.len() - 2, "computed spectrum");
                    spectrum
                }
                Ok(_) => {
                    warn!(structure = %name, "solver returned no eigenvalues");
                    nan_row()
                }
                Err(e) => {
                    warn!(structure = %name, error = %e, "spectrum computation failed");
                    nan_row()
                }
            };
            (name.clone(), spectrum)
        })
        .collect()
}
