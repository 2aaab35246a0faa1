//! Surface extraction from segmentation volumes
//!
//! Per structure: binarize the label codes into a mask, run `mri_pretess`
//! when `mri/norm.mgz` exists, extract the label-1 isosurface with marching
//! cubes, and convert the result to VTK under `surfaces/`. Intermediate files
//! live in `temp/` under a fresh UUID so concurrent or repeated runs never
//! collide.
//!
//! Extraction is all-or-nothing: the first failing step aborts the structure
//! and the batch it belongs to.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::catalogue::{
    LabelCatalogue, SegmentationSource, StructureLabelSpec, ASEG_CATALOGUE, CEREBELLUM_CATALOGUE,
    CORTICAL_SURFACES,
};
use crate::command::{CommandRunner, FreeSurferTools, ToolCommand};
use crate::error::{BrainprintError, ExtractionStage, Result};
use crate::mesh::surf_to_vtk;

/// Foreground value written by the binarize step.
const MASK_LABEL: u32 = 1;

/// Optional reference volume for topology correction.
pub const NORM_RELATIVE_PATH: &str = "mri/norm.mgz";

pub const SURFACES_DIR: &str = "surfaces";
pub const TEMP_DIR: &str = "temp";

/// Surface path per structure name.
pub type SurfaceMap = BTreeMap<String, PathBuf>;

/// Final VTK path of a volumetric structure.
pub fn structure_surface_path(destination: &Path, source: SegmentationSource, spec: &StructureLabelSpec) -> PathBuf {
    destination
        .join(SURFACES_DIR)
        .join(format!("{}.final.{}.vtk", source.prefix(), spec.code_suffix()))
}

/// Runs the FreeSurfer extraction chain through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct SurfaceBuilder<R> {
    runner: R,
    tools: FreeSurferTools,
}

impl<R: CommandRunner> SurfaceBuilder<R> {
    pub fn new(runner: R, tools: FreeSurferTools) -> Self {
        Self { runner, tools }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run one step and require that it produced `expected`.
    fn step(
        &self,
        stage: ExtractionStage,
        structure: &str,
        command: ToolCommand,
        expected: &Path,
    ) -> Result<()> {
        debug!(%stage, structure, command = %command, "running extraction step");
        let failure = |reason: String| BrainprintError::Extraction {
            stage,
            structure: structure.to_string(),
            command: command.to_string(),
            reason,
        };

        let output = self
            .runner
            .run(&command)
            .map_err(|e| failure(format!("could not start: {}", e)))?;
        if !output.is_success() {
            return Err(failure(output.failure_reason()));
        }
        if !expected.is_file() {
            return Err(failure(format!("expected output {} was not created", expected.display())));
        }
        Ok(())
    }

    /// Extract one structure's surface from its segmentation volume.
    pub fn extract(
        &self,
        subject_dir: &Path,
        destination: &Path,
        spec: &StructureLabelSpec,
        source: SegmentationSource,
    ) -> Result<PathBuf> {
        if spec.label_codes.is_empty() {
            return Err(BrainprintError::Extraction {
                stage: ExtractionStage::Binarize,
                structure: spec.name.to_string(),
                command: String::new(),
                reason: "structure has no label codes".to_string(),
            });
        }

        let volume = source.volume_path(subject_dir);
        let norm = subject_dir.join(NORM_RELATIVE_PATH);

        let temp_dir = destination.join(TEMP_DIR);
        fs::create_dir_all(&temp_dir)?;
        fs::create_dir_all(destination.join(SURFACES_DIR))?;

        let temp_name = format!("{}.{}", source.prefix(), Uuid::new_v4());
        let mask = temp_dir.join(format!("{}.mgz", temp_name));
        let raw_surface = temp_dir.join(format!("{}.surf", temp_name));
        let output = structure_surface_path(destination, source, spec);

        // Binarize before pretess: pretess rescales label volumes with codes above 255
        self.step(
            ExtractionStage::Binarize,
            spec.name,
            self.tools.binarize(&volume, spec.label_codes, &mask),
            &mask,
        )?;

        if norm.is_file() {
            self.step(
                ExtractionStage::Pretess,
                spec.name,
                self.tools.pretess(&mask, MASK_LABEL, &norm, &mask),
                &mask,
            )?;
        } else {
            debug!(structure = spec.name, "no norm.mgz, skipping pretess");
        }

        self.step(
            ExtractionStage::MarchingCubes,
            spec.name,
            self.tools.marching_cubes(&mask, MASK_LABEL, &raw_surface),
            &raw_surface,
        )?;

        self.step(
            ExtractionStage::Convert,
            spec.name,
            self.tools.convert(&raw_surface, &output),
            &output,
        )?;

        info!(structure = spec.name, path = %output.display(), "extracted surface");
        Ok(output)
    }

    /// Extract every structure of a catalogue; the first failure aborts.
    pub fn extract_all(
        &self,
        subject_dir: &Path,
        destination: &Path,
        catalogue: &LabelCatalogue,
    ) -> Result<SurfaceMap> {
        catalogue
            .iter()
            .map(|spec| {
                let path = self.extract(subject_dir, destination, spec, catalogue.source)?;
                Ok((spec.name.to_string(), path))
            })
            .collect()
    }

    /// Volumetric structures, plus cerebellar and cortical surfaces unless
    /// skipped.
    pub fn build_all_surfaces(
        &self,
        subject_dir: &Path,
        destination: &Path,
        skip_cortex: bool,
        skip_cerebellum: bool,
    ) -> Result<SurfaceMap> {
        let mut surfaces = self.extract_all(subject_dir, destination, &ASEG_CATALOGUE)?;
        if !skip_cerebellum {
            surfaces.extend(self.extract_all(subject_dir, destination, &CEREBELLUM_CATALOGUE)?);
        }
        if !skip_cortex {
            surfaces.extend(create_cortical_surfaces(subject_dir, destination)?);
        }
        Ok(surfaces)
    }
}

/// Convert the white and pial FreeSurfer surfaces of both hemispheres.
pub fn create_cortical_surfaces(subject_dir: &Path, destination: &Path) -> Result<SurfaceMap> {
    let surfaces_dir = destination.join(SURFACES_DIR);
    fs::create_dir_all(&surfaces_dir)?;
    CORTICAL_SURFACES
        .iter()
        .map(|s| {
            let source = subject_dir.join("surf").join(s.surface);
            let output = surfaces_dir.join(format!("{}.vtk", s.surface));
            let path = surf_to_vtk(&source, &output)?;
            info!(structure = s.name, path = %path.display(), "converted cortical surface");
            Ok((s.name.to_string(), path))
        })
        .collect()
}
