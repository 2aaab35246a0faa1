//! Structure label tables
//!
//! Combined aseg structures:
//! - Striatum: Caudate + Putamen + Accumbens (per hemisphere)
//! - CorpusCallosum: 5 subregions
//! - Cerebellum: brainstem + (left+right) cerebellum WM and GM
//! - Ventricles: (left+right) lat.vent + inf.lat.vent + choroid plexus + 3rd vent + CSF
//! - Lateral-Ventricle: lat.vent + inf.lat.vent + choroid plexus
//! - 3rd-Ventricle: 3rd-Ventricle + CSF

use std::fmt;
use std::path::{Path, PathBuf};

/// Segmentation volume a structure is binarized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentationSource {
    /// FreeSurfer `aseg.mgz`
    Aseg,
    /// CerebNet cerebellar sub-parcellation
    Cerebellum,
}

impl SegmentationSource {
    /// Volume path relative to the subject directory.
    pub fn relative_path(&self) -> &'static str {
        match self {
            SegmentationSource::Aseg => "mri/aseg.mgz",
            SegmentationSource::Cerebellum => "mri/cerebellum.CerebNet.nii.gz",
        }
    }

    pub fn volume_path(&self, subject_dir: &Path) -> PathBuf {
        subject_dir.join(self.relative_path())
    }

    /// Prefix used for temporary and final file names.
    pub fn prefix(&self) -> &'static str {
        match self {
            SegmentationSource::Aseg => "aseg",
            SegmentationSource::Cerebellum => "cereb",
        }
    }
}

impl fmt::Display for SegmentationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A named structure and the segmentation labels it is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureLabelSpec {
    pub name: &'static str,
    pub label_codes: &'static [u32],
}

impl StructureLabelSpec {
    /// Codes joined with `_`, as used in the final surface file name.
    pub fn code_suffix(&self) -> String {
        self.label_codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// An ordered table of structures sharing one segmentation source.
#[derive(Debug, Clone, Copy)]
pub struct LabelCatalogue {
    pub source: SegmentationSource,
    pub structures: &'static [StructureLabelSpec],
}

impl LabelCatalogue {
    pub fn get(&self, name: &str) -> Option<&'static StructureLabelSpec> {
        self.structures.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static StructureLabelSpec> {
        self.structures.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.structures.iter().map(|s| s.name)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

const fn spec(name: &'static str, label_codes: &'static [u32]) -> StructureLabelSpec {
    StructureLabelSpec { name, label_codes }
}

const ASEG_STRUCTURES: &[StructureLabelSpec] = &[
    spec("CorpusCallosum", &[251, 252, 253, 254, 255]),
    spec("Cerebellum", &[7, 8, 16, 46, 47]),
    spec("Ventricles", &[4, 5, 14, 24, 31, 43, 44, 63]),
    spec("3rd-Ventricle", &[14, 24]),
    spec("4th-Ventricle", &[15]),
    spec("Brain-Stem", &[16]),
    spec("Left-Striatum", &[11, 12, 26]),
    spec("Left-Lateral-Ventricle", &[4, 5, 31]),
    spec("Left-Cerebellum-White-Matter", &[7]),
    spec("Left-Cerebellum-Cortex", &[8]),
    spec("Left-Thalamus-Proper", &[10]),
    spec("Left-Caudate", &[11]),
    spec("Left-Putamen", &[12]),
    spec("Left-Pallidum", &[13]),
    spec("Left-Hippocampus", &[17]),
    spec("Left-Amygdala", &[18]),
    spec("Left-Accumbens-area", &[26]),
    spec("Left-VentralDC", &[28]),
    spec("Right-Striatum", &[50, 51, 58]),
    spec("Right-Lateral-Ventricle", &[43, 44, 63]),
    spec("Right-Cerebellum-White-Matter", &[46]),
    spec("Right-Cerebellum-Cortex", &[47]),
    spec("Right-Thalamus-Proper", &[49]),
    spec("Right-Caudate", &[50]),
    spec("Right-Putamen", &[51]),
    spec("Right-Pallidum", &[52]),
    spec("Right-Hippocampus", &[53]),
    spec("Right-Amygdala", &[54]),
    spec("Right-Accumbens-area", &[58]),
    spec("Right-VentralDC", &[60]),
];

// Lobule codes follow the CerebNet lookup table; vermis entries sit between
// the hemispheric ones.
const CEREBELLUM_STRUCTURES: &[StructureLabelSpec] = &[
    spec("Cbm_Left_I_IV", &[601]),
    spec("Cbm_Right_I_IV", &[602]),
    spec("Cbm_Left_V", &[603]),
    spec("Cbm_Right_V", &[604]),
    spec("Cbm_Left_VI", &[605]),
    spec("Cbm_Vermis_VI", &[606]),
    spec("Cbm_Right_VI", &[607]),
    spec("Cbm_Left_CrusI", &[608]),
    spec("Cbm_Right_CrusI", &[610]),
    spec("Cbm_Left_CrusII", &[611]),
    spec("Cbm_Right_CrusII", &[613]),
    spec("Cbm_Left_VIIb", &[614]),
    spec("Cbm_Right_VIIb", &[616]),
    spec("Cbm_Left_VIIIa", &[617]),
    spec("Cbm_Right_VIIIa", &[619]),
    spec("Cbm_Left_VIIIb", &[620]),
    spec("Cbm_Right_VIIIb", &[622]),
    spec("Cbm_Left_IX", &[623]),
    spec("Cbm_Vermis_IX", &[624]),
    spec("Cbm_Right_IX", &[625]),
    spec("Cbm_Left_X", &[626]),
    spec("Cbm_Vermis_X", &[627]),
    spec("Cbm_Right_X", &[628]),
    spec("Cbm_Vermis_VII", &[630]),
    spec("Cbm_Vermis_VIII", &[631]),
    spec("Cbm_Vermis", &[631, 630, 627, 624, 606]),
];

/// Structures binarized from `aseg.mgz`.
pub const ASEG_CATALOGUE: LabelCatalogue = LabelCatalogue {
    source: SegmentationSource::Aseg,
    structures: ASEG_STRUCTURES,
};

/// Lobules and vermis aggregates from the CerebNet segmentation.
pub const CEREBELLUM_CATALOGUE: LabelCatalogue = LabelCatalogue {
    source: SegmentationSource::Cerebellum,
    structures: CEREBELLUM_STRUCTURES,
};

/// A FreeSurfer surface that only needs format conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorticalSurfaceSpec {
    pub name: &'static str,
    /// File name under `<subject>/surf/`
    pub surface: &'static str,
}

pub const CORTICAL_SURFACES: &[CorticalSurfaceSpec] = &[
    CorticalSurfaceSpec { name: "lh-white-2d", surface: "lh.white" },
    CorticalSurfaceSpec { name: "rh-white-2d", surface: "rh.white" },
    CorticalSurfaceSpec { name: "lh-pial-2d", surface: "lh.pial" },
    CorticalSurfaceSpec { name: "rh-pial-2d", surface: "rh.pial" },
];
