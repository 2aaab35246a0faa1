//! End-to-end runs with scripted tools and a geometric stand-in solver

mod common;

use std::fs;

use brainprint::catalogue::{select_pairs, ASEG_CATALOGUE, CEREBELLUM_CATALOGUE, CORTICAL_SURFACES};
use brainprint::{Brainprint, BrainprintConfig, BrainprintError, DistanceMetric};

use common::{make_subject, AreaSolver, ScriptedRunner};

fn config(asymmetry: bool) -> BrainprintConfig {
    BrainprintConfig {
        num: 5,
        asymmetry,
        check_labels: false,
        ..BrainprintConfig::default()
    }
}

#[test]
fn test_full_run_with_asymmetry() {
    let root = tempfile::tempdir().unwrap();
    make_subject(root.path(), "bert", true);

    let bp = Brainprint::new(root.path(), config(true), ScriptedRunner::default(), AreaSolver).unwrap();
    let result = bp.run("bert", None).unwrap();

    let expected_surfaces = ASEG_CATALOGUE.len() + CEREBELLUM_CATALOGUE.len() + CORTICAL_SURFACES.len();
    assert_eq!(result.destination, root.path().join("bert/brainprint"));
    assert_eq!(result.surfaces.len(), expected_surfaces);
    assert_eq!(result.eigenvalues.len(), expected_surfaces);
    assert!(result.eigenvalues.values().all(|s| s.len() == 7));

    let distances = result.distances.expect("asymmetry requested");
    assert_eq!(distances.len(), select_pairs(false, false).len());

    // Scripted meshes depend only on the label-code string length
    let hippocampus = distances.get("Left-Hippocampus_Right-Hippocampus").unwrap();
    assert_eq!(hippocampus, 0.0);
    let lateral = distances.get("Left-Lateral-Ventricle_Right-Lateral-Ventricle").unwrap();
    assert!(lateral > 0.0);
    // rh surfaces are larger than lh in the fixture
    assert!(distances.get("lh-pial-2d_rh-pial-2d").unwrap() > 0.0);
    assert!(distances.diagnostics.is_empty());

    assert_eq!(result.exported.len(), 2);
    assert!(result.destination.join("bert.brainprint.csv").is_file());
    assert!(result.destination.join("bert.brainprint.asymmetry.csv").is_file());
    assert!(!result.destination.join("temp").exists());
}

#[test]
fn test_run_without_asymmetry_keeps_temp() {
    let root = tempfile::tempdir().unwrap();
    make_subject(root.path(), "bert", false);
    let out = tempfile::tempdir().unwrap();

    let mut cfg = config(false);
    cfg.keep_temp = true;
    cfg.skip_cortex = true;
    cfg.skip_cerebellum = true;
    let bp = Brainprint::new(root.path(), cfg, ScriptedRunner::default(), AreaSolver).unwrap();
    let result = bp.run("bert", Some(out.path())).unwrap();

    assert!(result.distances.is_none());
    assert_eq!(result.surfaces.len(), ASEG_CATALOGUE.len());
    assert_eq!(result.exported, vec![out.path().join("bert.brainprint.csv")]);
    assert!(out.path().join("temp").is_dir());

    let csv = fs::read_to_string(out.path().join("bert.brainprint.csv")).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("row,"));
    assert!(header.contains("Left-Hippocampus"));
    assert_eq!(csv.lines().count(), 1 + 7);
}

#[test]
fn test_extraction_failure_aborts_run() {
    let root = tempfile::tempdir().unwrap();
    make_subject(root.path(), "bert", false);

    let runner = ScriptedRunner::failing("mris_convert", 4);
    let bp = Brainprint::new(root.path(), config(true), runner, AreaSolver).unwrap();
    let err = bp.run("bert", None).unwrap_err();
    assert!(matches!(err, BrainprintError::Extraction { .. }));
    assert!(!root.path().join("bert/brainprint/bert.brainprint.csv").exists());
}

#[test]
fn test_unknown_subject() {
    let root = tempfile::tempdir().unwrap();
    let bp = Brainprint::new(root.path(), config(false), ScriptedRunner::default(), AreaSolver).unwrap();
    assert!(matches!(bp.run("nobody", None), Err(BrainprintError::InvalidSubject(_))));
}

#[test]
fn test_invalid_config_rejected() {
    let mut cfg = config(true);
    cfg.num = 0;
    cfg.asymmetry_distance = DistanceMetric::CityBlock;
    assert!(matches!(
        Brainprint::new("/subjects", cfg, ScriptedRunner::default(), AreaSolver),
        Err(BrainprintError::Config(_))
    ));
}
