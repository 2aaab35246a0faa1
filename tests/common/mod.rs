//! Common test utilities for brainprint integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use brainprint::mesh::write_vtk;
use brainprint::{BrainprintError, CommandOutput, CommandRunner, Result, SpectrumSolver, ToolCommand, TriaMesh};

/// Closed tetrahedron scaled by `s`.
pub fn tetrahedron(s: f64) -> TriaMesh {
    TriaMesh::new(
        vec![[0.0, 0.0, 0.0], [s, 0.0, 0.0], [0.0, s, 0.0], [0.0, 0.0, s]],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

/// Encode a mesh as a FreeSurfer binary triangle surface.
pub fn encode_fssurf(mesh: &TriaMesh) -> Vec<u8> {
    let mut bytes = vec![0xff, 0xff, 0xfe];
    bytes.extend_from_slice(b"created by test on today\n\n");
    bytes.extend_from_slice(&(mesh.n_vertices() as i32).to_be_bytes());
    bytes.extend_from_slice(&(mesh.n_faces() as i32).to_be_bytes());
    for v in &mesh.vertices {
        for &c in v {
            bytes.extend_from_slice(&(c as f32).to_be_bytes());
        }
    }
    for f in &mesh.faces {
        for &i in f {
            bytes.extend_from_slice(&(i as i32).to_be_bytes());
        }
    }
    bytes
}

/// Subject tree with `mri/` and the four cortical surfaces.
pub fn make_subject(root: &Path, id: &str, with_norm: bool) -> PathBuf {
    let subject = root.join(id);
    fs::create_dir_all(subject.join("mri")).unwrap();
    fs::create_dir_all(subject.join("surf")).unwrap();
    fs::write(subject.join("mri/aseg.mgz"), b"").unwrap();
    fs::write(subject.join("mri/cerebellum.CerebNet.nii.gz"), b"").unwrap();
    if with_norm {
        fs::write(subject.join("mri/norm.mgz"), b"").unwrap();
    }
    for (i, name) in ["lh.white", "rh.white", "lh.pial", "rh.pial"].iter().enumerate() {
        let scale = if name.starts_with("lh") { 1.0 } else { 1.0 + 0.1 * i as f64 };
        fs::write(subject.join("surf").join(name), encode_fssurf(&tetrahedron(scale))).unwrap();
    }
    subject
}

/// Stand-in for the FreeSurfer tools.
///
/// Records every command. Successful calls create the file named by the
/// last argument; `mris_convert` writes a tetrahedron whose size depends
/// only on the input file contents, so identical inputs give identical
/// meshes.
#[derive(Default)]
pub struct ScriptedRunner {
    pub calls: RefCell<Vec<ToolCommand>>,
    /// Fail the n-th (0-based) invocation of this program
    pub fail_on: Option<(String, usize)>,
}

impl ScriptedRunner {
    pub fn failing(program: &str, nth: usize) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_on: Some((program.to_string(), nth)),
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.program.clone()).collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.program == program).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        let previous = self.count(&command.program);
        self.calls.borrow_mut().push(command.clone());

        if let Some((program, nth)) = &self.fail_on {
            if *program == command.program && *nth == previous {
                return Ok(CommandOutput::failure(1, "scripted failure"));
            }
        }

        let output = PathBuf::from(command.args.last().cloned().unwrap_or_default());
        match command.program.as_str() {
            // --i <volume> --match <codes...> --o <mask>: the mask records the codes
            "mri_binarize" => {
                let codes: Vec<String> = command.args[3..command.args.len() - 2]
                    .iter()
                    .map(|a| a.to_string_lossy().into_owned())
                    .collect();
                fs::write(&output, codes.join(" "))?;
            }
            "mri_pretess" => {}
            "mri_mc" => {
                let mask = fs::read_to_string(&command.args[0])?;
                fs::write(&output, mask)?;
            }
            "mris_convert" => {
                let surface = fs::read_to_string(&command.args[0])?;
                let scale = 1.0 + surface.len() as f64 / 10.0;
                write_vtk(&tetrahedron(scale), &output)?;
            }
            other => {
                return Err(BrainprintError::Environment(format!("unexpected program {}", other)));
            }
        }
        Ok(CommandOutput::success())
    }
}

/// Eigenvalues `area * (1, 2, 3, ...)`: identical meshes give identical
/// spectra.
pub struct AreaSolver;

impl SpectrumSolver for AreaSolver {
    fn eigenvalues(&self, mesh: &TriaMesh, num: usize) -> Result<Vec<f64>> {
        let area = mesh.area();
        Ok((1..=num).map(|k| area * k as f64).collect())
    }
}
