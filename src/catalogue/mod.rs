//! Static catalogues of anatomical structures and bilateral pairs
//!
//! Label codes follow the FreeSurfer colour lookup table for `aseg` and the
//! CerebNet lookup table for the cerebellar sub-parcellation.

mod labels;
mod pairs;

pub use labels::{
    CorticalSurfaceSpec, LabelCatalogue, SegmentationSource, StructureLabelSpec,
    ASEG_CATALOGUE, CEREBELLUM_CATALOGUE, CORTICAL_SURFACES,
};
pub use pairs::{select_pairs, StructurePair, CEREBELLUM_PAIRS, CORTICAL_PAIRS, SUBCORTICAL_PAIRS};
