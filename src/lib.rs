//! BrainPrint: shape-spectral asymmetry of bilateral brain structures
//!
//! This crate turns a FreeSurfer subject into per-structure triangle meshes,
//! hands them to a Laplace-Beltrami eigen-solver, and scores left/right
//! shape differences from the resulting spectra.
//!
//! # Modules
//! - `catalogue`: Structure label tables and bilateral pairs
//! - `command`: External tool invocation (`mri_binarize`, `mri_mc`, ...)
//! - `surfaces`: Per-structure surface extraction
//! - `mesh`: Triangle meshes, VTK and FreeSurfer surface I/O
//! - `volume`: Segmentation label census (NIfTI / MGH)
//! - `spectrum`: Eigenvalue spectra per surface
//! - `asymmetry`: Lateral ShapeDNA distances
//! - `export`: CSV output
//! - `config`: TOML configuration with environment overrides
//! - `pipeline`: End-to-end run for one subject

// Data
pub mod catalogue;
pub mod error;

// Extraction
pub mod command;
pub mod surfaces;

// I/O modules
pub mod mesh;
pub mod volume;
pub mod export;

// Analysis
pub mod spectrum;
pub mod asymmetry;

// Orchestration
pub mod config;
pub mod pipeline;

pub use asymmetry::{compute_asymmetry, AsymmetryDiagnostic, AsymmetryReport, DistanceMetric};
pub use catalogue::{select_pairs, SegmentationSource, StructureLabelSpec, StructurePair};
pub use command::{CommandOutput, CommandRunner, FreeSurferTools, SystemRunner, ToolCommand};
pub use config::BrainprintConfig;
pub use error::{BrainprintError, ExtractionStage, Result};
pub use mesh::{read_mesh, TriaMesh};
pub use pipeline::{Brainprint, BrainprintResult};
pub use spectrum::{Spectra, SpectrumSolver};
pub use surfaces::SurfaceBuilder;
