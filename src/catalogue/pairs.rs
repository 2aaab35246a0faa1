//! Bilateral structure pairs

/// Left/right counterparts compared by the asymmetry scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructurePair {
    pub left: &'static str,
    pub right: &'static str,
}

impl StructurePair {
    /// Result key, `"{left}_{right}"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.left, self.right)
    }
}

const fn pair(left: &'static str, right: &'static str) -> StructurePair {
    StructurePair { left, right }
}

pub const SUBCORTICAL_PAIRS: &[StructurePair] = &[
    pair("Left-Striatum", "Right-Striatum"),
    pair("Left-Lateral-Ventricle", "Right-Lateral-Ventricle"),
    pair("Left-Cerebellum-White-Matter", "Right-Cerebellum-White-Matter"),
    pair("Left-Cerebellum-Cortex", "Right-Cerebellum-Cortex"),
    pair("Left-Thalamus-Proper", "Right-Thalamus-Proper"),
    pair("Left-Caudate", "Right-Caudate"),
    pair("Left-Putamen", "Right-Putamen"),
    pair("Left-Pallidum", "Right-Pallidum"),
    pair("Left-Hippocampus", "Right-Hippocampus"),
    pair("Left-Amygdala", "Right-Amygdala"),
    pair("Left-Accumbens-area", "Right-Accumbens-area"),
    pair("Left-VentralDC", "Right-VentralDC"),
];

pub const CEREBELLUM_PAIRS: &[StructurePair] = &[
    pair("Cbm_Left_I_IV", "Cbm_Right_I_IV"),
    pair("Cbm_Left_V", "Cbm_Right_V"),
    pair("Cbm_Left_VI", "Cbm_Right_VI"),
    pair("Cbm_Left_CrusI", "Cbm_Right_CrusI"),
    pair("Cbm_Left_CrusII", "Cbm_Right_CrusII"),
    pair("Cbm_Left_VIIb", "Cbm_Right_VIIb"),
    pair("Cbm_Left_VIIIa", "Cbm_Right_VIIIa"),
    pair("Cbm_Left_VIIIb", "Cbm_Right_VIIIb"),
    pair("Cbm_Left_IX", "Cbm_Right_IX"),
    pair("Cbm_Left_X", "Cbm_Right_X"),
];

pub const CORTICAL_PAIRS: &[StructurePair] = &[
    pair("lh-white-2d", "rh-white-2d"),
    pair("lh-pial-2d", "rh-pial-2d"),
];

/// Pairs to score: subcortical always, then cortical, then cerebellar.
pub fn select_pairs(skip_cortex: bool, skip_cerebellum: bool) -> Vec<StructurePair> {
    let mut pairs = SUBCORTICAL_PAIRS.to_vec();
    if !skip_cortex {
        pairs.extend_from_slice(CORTICAL_PAIRS);
    }
    if !skip_cerebellum {
        pairs.extend_from_slice(CEREBELLUM_PAIRS);
    }
    pairs
}
