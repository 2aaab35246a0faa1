//! Surface extraction against a scripted FreeSurfer stand-in

mod common;

use std::fs;

use brainprint::catalogue::{ASEG_CATALOGUE, CEREBELLUM_CATALOGUE, CORTICAL_SURFACES};
use brainprint::mesh::read_vtk;
use brainprint::{read_mesh, BrainprintError, ExtractionStage, FreeSurferTools, SegmentationSource, SurfaceBuilder};

use common::{make_subject, ScriptedRunner};

#[test]
fn test_extract_is_deterministic_across_runs() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", true);
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let spec = ASEG_CATALOGUE.get("Left-Striatum").unwrap();

    let builder = SurfaceBuilder::new(ScriptedRunner::default(), FreeSurferTools::default());
    let a = builder.extract(&subject, out_a.path(), spec, SegmentationSource::Aseg).unwrap();
    let b = builder.extract(&subject, out_b.path(), spec, SegmentationSource::Aseg).unwrap();

    assert_eq!(a, out_a.path().join("surfaces/aseg.final.11_12_26.vtk"));
    assert_eq!(read_vtk(&a).unwrap(), read_vtk(&b).unwrap());

    // Temporary names differ between the two calls
    let masks: Vec<_> = builder
        .runner()
        .calls
        .borrow()
        .iter()
        .filter(|c| c.program == "mri_binarize")
        .map(|c| c.args.last().cloned().unwrap())
        .collect();
    assert_eq!(masks.len(), 2);
    assert_ne!(
        masks[0].to_string_lossy().rsplit('/').next(),
        masks[1].to_string_lossy().rsplit('/').next()
    );
}

#[test]
fn test_temp_files_namespaced_by_source() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", false);
    let out = tempfile::tempdir().unwrap();
    let spec = CEREBELLUM_CATALOGUE.get("Cbm_Left_V").unwrap();

    let builder = SurfaceBuilder::new(ScriptedRunner::default(), FreeSurferTools::default());
    let path = builder
        .extract(&subject, out.path(), spec, SegmentationSource::Cerebellum)
        .unwrap();
    assert_eq!(path, out.path().join("surfaces/cereb.final.603.vtk"));

    let calls = builder.runner().calls.borrow();
    let binarize = &calls[0];
    assert_eq!(binarize.args[1], subject.join("mri/cerebellum.CerebNet.nii.gz").into_os_string());
    let mask = binarize.args.last().unwrap().to_string_lossy().into_owned();
    assert!(mask.starts_with(&out.path().join("temp/cereb.").to_string_lossy().into_owned()));
    assert!(mask.ends_with(".mgz"));
}

#[test]
fn test_extract_all_covers_catalogue() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", false);
    let out = tempfile::tempdir().unwrap();

    let builder = SurfaceBuilder::new(ScriptedRunner::default(), FreeSurferTools::default());
    let surfaces = builder.extract_all(&subject, out.path(), &ASEG_CATALOGUE).unwrap();
    assert_eq!(surfaces.len(), ASEG_CATALOGUE.len());
    for name in ASEG_CATALOGUE.names() {
        assert!(read_mesh(&surfaces[name]).is_ok(), "{} not readable", name);
    }
    // 3rd-Ventricle and Ventricles share codes but not output paths
    assert_ne!(surfaces["3rd-Ventricle"], surfaces["Ventricles"]);
}

#[test]
fn test_binarize_failure_aborts_batch() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", true);
    let out = tempfile::tempdir().unwrap();

    let builder = SurfaceBuilder::new(ScriptedRunner::failing("mri_binarize", 0), FreeSurferTools::default());
    let err = builder.extract_all(&subject, out.path(), &ASEG_CATALOGUE).unwrap_err();

    match err {
        BrainprintError::Extraction { stage, structure, reason, .. } => {
            assert_eq!(stage, ExtractionStage::Binarize);
            assert_eq!(structure, ASEG_CATALOGUE.structures[0].name);
            assert!(reason.contains("scripted failure"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing ran after the failed binarize
    assert_eq!(builder.runner().programs(), vec!["mri_binarize"]);
}

#[test]
fn test_mid_pipeline_failure_names_stage() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", false);
    let out = tempfile::tempdir().unwrap();

    // Third structure's marching cubes fails
    let builder = SurfaceBuilder::new(ScriptedRunner::failing("mri_mc", 2), FreeSurferTools::default());
    let err = builder.extract_all(&subject, out.path(), &ASEG_CATALOGUE).unwrap_err();
    assert!(matches!(err, BrainprintError::Extraction { stage: ExtractionStage::MarchingCubes, .. }));
    assert_eq!(builder.runner().count("mri_binarize"), 3);
    assert_eq!(builder.runner().count("mris_convert"), 2);
}

#[test]
fn test_build_all_surfaces_flags() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", false);

    let out = tempfile::tempdir().unwrap();
    let builder = SurfaceBuilder::new(ScriptedRunner::default(), FreeSurferTools::default());
    let all = builder.build_all_surfaces(&subject, out.path(), false, false).unwrap();
    assert_eq!(
        all.len(),
        ASEG_CATALOGUE.len() + CEREBELLUM_CATALOGUE.len() + CORTICAL_SURFACES.len()
    );
    assert_eq!(all["lh-white-2d"], out.path().join("surfaces/lh.white.vtk"));
    assert!(all["rh-pial-2d"].is_file());

    let out = tempfile::tempdir().unwrap();
    let builder = SurfaceBuilder::new(ScriptedRunner::default(), FreeSurferTools::default());
    let volumetric = builder.build_all_surfaces(&subject, out.path(), true, true).unwrap();
    assert_eq!(volumetric.len(), ASEG_CATALOGUE.len());
    assert_eq!(builder.runner().count("mri_binarize"), ASEG_CATALOGUE.len());
    assert!(!out.path().join("surfaces/lh.white.vtk").exists());
}

#[test]
fn test_cortical_conversion_fails_on_corrupt_surface() {
    let root = tempfile::tempdir().unwrap();
    let subject = make_subject(root.path(), "bert", false);
    fs::write(subject.join("surf/rh.pial"), b"not a surface").unwrap();
    let out = tempfile::tempdir().unwrap();

    let err = brainprint::surfaces::create_cortical_surfaces(&subject, out.path()).unwrap_err();
    match err {
        BrainprintError::Parse { path, .. } => assert_eq!(path, subject.join("surf/rh.pial")),
        other => panic!("unexpected error: {other}"),
    }
}
