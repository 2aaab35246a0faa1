//! End-to-end BrainPrint run for one subject
//!
//! surfaces → spectra → (optional) asymmetry → CSV export → temp cleanup

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::asymmetry::{compute_asymmetry, AsymmetryReport};
use crate::catalogue::{LabelCatalogue, ASEG_CATALOGUE, CEREBELLUM_CATALOGUE};
use crate::command::{CommandRunner, FreeSurferTools};
use crate::config::{validate_config, BrainprintConfig};
use crate::error::{BrainprintError, Result};
use crate::export::export_results;
use crate::spectrum::{compute_brainprint, Spectra, SpectrumSolver};
use crate::surfaces::{SurfaceBuilder, SurfaceMap, SURFACES_DIR, TEMP_DIR};
use crate::volume::LabelVolume;

/// `FREESURFER_HOME` must point at a FreeSurfer installation.
pub fn validate_environment() -> Result<()> {
    match env::var_os("FREESURFER_HOME") {
        Some(home) if !home.is_empty() => Ok(()),
        _ => Err(BrainprintError::Environment(
            "FreeSurfer not found: FREESURFER_HOME is not set".to_string(),
        )),
    }
}

fn resolve_program(program: &str, search_path: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let search_path = search_path?;
    env::split_paths(search_path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

/// Every configured FreeSurfer binary must be found on `PATH` (or exist,
/// when configured as a path).
pub fn check_tools(tools: &FreeSurferTools) -> Result<()> {
    let path = env::var_os("PATH");
    let missing: Vec<&str> = tools
        .programs()
        .into_iter()
        .filter(|p| resolve_program(p, path.as_deref()).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BrainprintError::Environment(format!(
            "FreeSurfer tools not found on PATH: {}",
            missing.join(", ")
        )))
    }
}

/// `<subjects_dir>/<subject_id>`, which must be a directory.
pub fn validate_subject_dir(subjects_dir: &Path, subject_id: &str) -> Result<PathBuf> {
    let subject_dir = subjects_dir.join(subject_id);
    if subject_dir.is_dir() {
        Ok(subject_dir)
    } else {
        Err(BrainprintError::InvalidSubject(subject_dir))
    }
}

/// Create `surfaces/` and `temp/` under the destination, which defaults to
/// `<subject_dir>/brainprint`.
pub fn create_output_paths(subject_dir: &Path, destination: Option<&Path>) -> Result<PathBuf> {
    let destination = destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| subject_dir.join("brainprint"));
    fs::create_dir_all(destination.join(SURFACES_DIR))?;
    fs::create_dir_all(destination.join(TEMP_DIR))?;
    Ok(destination)
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct BrainprintResult {
    pub destination: PathBuf,
    pub surfaces: SurfaceMap,
    pub eigenvalues: Spectra,
    pub distances: Option<AsymmetryReport>,
    /// CSV files written
    pub exported: Vec<PathBuf>,
}

/// Runs the analysis for subjects of one FreeSurfer subjects directory.
pub struct Brainprint<R, S> {
    subjects_dir: PathBuf,
    config: BrainprintConfig,
    builder: SurfaceBuilder<R>,
    solver: S,
}

impl<R: CommandRunner, S: SpectrumSolver> Brainprint<R, S> {
    pub fn new(subjects_dir: impl Into<PathBuf>, config: BrainprintConfig, runner: R, solver: S) -> Result<Self> {
        validate_config(&config)?;
        let builder = SurfaceBuilder::new(runner, config.tools.clone());
        Ok(Self {
            subjects_dir: subjects_dir.into(),
            config,
            builder,
            solver,
        })
    }

    pub fn config(&self) -> &BrainprintConfig {
        &self.config
    }

    /// Check `FREESURFER_HOME` and that the configured tools are installed.
    pub fn validate_installation(&self) -> Result<()> {
        validate_environment()?;
        check_tools(&self.config.tools)
    }

    /// Log structures whose label codes never occur in the segmentation.
    fn preflight(&self, subject_dir: &Path, catalogue: &LabelCatalogue) {
        let path = catalogue.source.volume_path(subject_dir);
        match LabelVolume::open(&path) {
            Ok(volume) => {
                for spec in volume.missing_structures(catalogue) {
                    warn!(
                        structure = spec.name,
                        codes = %spec.code_suffix(),
                        volume = %path.display(),
                        "no voxels carry this structure's labels; extraction will fail"
                    );
                }
            }
            Err(e) => warn!(error = %e, "label preflight skipped"),
        }
    }

    pub fn run(&self, subject_id: &str, destination: Option<&Path>) -> Result<BrainprintResult> {
        let subject_dir = validate_subject_dir(&self.subjects_dir, subject_id)?;
        let destination = create_output_paths(&subject_dir, destination)?;
        info!(subject = subject_id, destination = %destination.display(), "starting brainprint");

        if self.config.check_labels {
            self.preflight(&subject_dir, &ASEG_CATALOGUE);
            if !self.config.skip_cerebellum {
                self.preflight(&subject_dir, &CEREBELLUM_CATALOGUE);
            }
        }

        let surfaces = self.builder.build_all_surfaces(
            &subject_dir,
            &destination,
            self.config.skip_cortex,
            self.config.skip_cerebellum,
        )?;

        let eigenvalues = compute_brainprint(&surfaces, &self.solver, &self.config.spectrum_options());

        let distances = if self.config.asymmetry {
            Some(compute_asymmetry(
                &eigenvalues,
                self.config.asymmetry_distance,
                self.config.skip_cortex,
                self.config.skip_cerebellum,
            )?)
        } else {
            None
        };

        let csv_path = destination.join(format!("{}.brainprint.csv", subject_id));
        let exported = export_results(&csv_path, &eigenvalues, distances.as_ref())?;

        self.cleanup(&destination)?;
        info!(subject = subject_id, "brainprint finished; eigenvalue rows start with area and volume");

        Ok(BrainprintResult {
            destination,
            surfaces,
            eigenvalues,
            distances,
            exported,
        })
    }

    /// Remove `temp/` unless configured to keep it.
    pub fn cleanup(&self, destination: &Path) -> Result<()> {
        let temp = destination.join(TEMP_DIR);
        if !self.config.keep_temp && temp.exists() {
            fs::remove_dir_all(&temp)?;
        }
        Ok(())
    }
}
