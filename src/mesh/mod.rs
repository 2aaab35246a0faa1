//! Triangle meshes and the file formats they travel in
//!
//! - `vtk`: legacy ASCII VTK POLYDATA (the portable format handed to the
//!   eigen-decomposition)
//! - `freesurfer`: FreeSurfer binary triangle surfaces (`lh.white`, ...)

mod freesurfer;
mod vtk;

use std::collections::HashMap;
use std::path::Path;

use crate::error::{BrainprintError, Result};

pub use freesurfer::{read_fssurf, surf_to_vtk};
pub use vtk::{parse_vtk, read_vtk, write_vtk};

/// Triangle mesh with vertex coordinates in mm.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriaMesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[usize; 3]>,
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

impl TriaMesh {
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Check the mesh is usable for spectral analysis.
    ///
    /// Rejects empty meshes, out-of-range face indices, degenerate index
    /// triples and non-finite coordinates.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.vertices.is_empty() {
            return Err("mesh has no vertices".to_string());
        }
        if self.faces.is_empty() {
            return Err("mesh has no triangles".to_string());
        }
        let n = self.vertices.len();
        for (i, f) in self.faces.iter().enumerate() {
            if f.iter().any(|&v| v >= n) {
                return Err(format!("triangle {} references vertex outside 0..{}", i, n));
            }
            if f[0] == f[1] || f[1] == f[2] || f[2] == f[0] {
                return Err(format!("triangle {} repeats a vertex", i));
            }
        }
        if let Some(i) = self.vertices.iter().position(|v| v.iter().any(|c| !c.is_finite())) {
            return Err(format!("vertex {} has non-finite coordinates", i));
        }
        Ok(())
    }

    /// Total surface area.
    pub fn area(&self) -> f64 {
        self.faces
            .iter()
            .map(|&[i0, i1, i2]| {
                let v0 = self.vertices[i0];
                let n = cross(sub(self.vertices[i1], v0), sub(self.vertices[i2], v0));
                0.5 * dot(n, n).sqrt()
            })
            .sum()
    }

    /// Every undirected edge is shared by exactly two triangles.
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for &[v0, v1, v2] in &self.faces {
            for &(a, b) in &[(v0, v1), (v1, v2), (v2, v0)] {
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        edges.values().all(|&count| count == 2)
    }

    /// Enclosed volume via the divergence theorem; 0 for open meshes.
    ///
    /// The sign of the triple products depends on orientation, so the
    /// magnitude is returned.
    pub fn volume(&self) -> f64 {
        if !self.is_closed() {
            return 0.0;
        }
        let signed: f64 = self
            .faces
            .iter()
            .map(|&[i0, i1, i2]| {
                dot(self.vertices[i0], cross(self.vertices[i1], self.vertices[i2]))
            })
            .sum();
        (signed / 6.0).abs()
    }
}

/// Read a VTK mesh and reject anything that is not a valid triangle mesh.
///
/// This is the only entry point used before handing a surface to the
/// spectrum solver; malformed meshes are reported, never repaired.
pub fn read_mesh(path: &Path) -> Result<TriaMesh> {
    let mesh = read_vtk(path)?;
    mesh.validate()
        .map_err(|reason| BrainprintError::parse(path, reason))?;
    Ok(mesh)
}

#[cfg(test)]
pub(crate) fn unit_tetrahedron() -> TriaMesh {
    TriaMesh::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}
