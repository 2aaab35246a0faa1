//! FreeSurfer binary triangle surface reader
//!
//! Layout (big-endian): 3-byte magic `FF FF FE`, a "created by" line
//! terminated by two newlines, vertex count (i32), face count (i32),
//! vertex coordinates (f32 x3), face indices (i32 x3). Trailing tags
//! (volume geometry, cmdlines) are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use super::{write_vtk, TriaMesh};
use crate::error::{BrainprintError, Result};

const TRIANGLE_MAGIC: [u8; 3] = [0xff, 0xff, 0xfe];

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], String> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(format!(
                "unexpected end of data at byte {} (file is {} bytes)",
                self.pos,
                self.bytes.len()
            ));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn i32_be(&mut self) -> std::result::Result<i32, String> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32_be(&mut self) -> std::result::Result<f32, String> {
        let b = self.take(4)?;
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Skip past the next `\n`.
    fn skip_line(&mut self) -> std::result::Result<(), String> {
        match self.bytes[self.pos..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                self.pos += offset + 1;
                Ok(())
            }
            None => Err("unterminated header line".to_string()),
        }
    }
}

fn parse_fssurf(bytes: &[u8]) -> std::result::Result<TriaMesh, String> {
    let mut cur = Cursor { bytes, pos: 0 };
    if cur.take(3)? != TRIANGLE_MAGIC {
        return Err("not a FreeSurfer triangle surface (bad magic number)".to_string());
    }
    // "created by <user> on <date>\n\n"
    cur.skip_line()?;
    cur.skip_line()?;

    let n_vertices = cur.i32_be()?;
    let n_faces = cur.i32_be()?;
    if n_vertices < 0 || n_faces < 0 {
        return Err(format!("negative counts ({} vertices, {} faces)", n_vertices, n_faces));
    }
    let (n_vertices, n_faces) = (n_vertices as usize, n_faces as usize);
    // 12 bytes per vertex and per face
    let needed = (n_vertices as u64 + n_faces as u64) * 12;
    if needed > cur.remaining() as u64 {
        return Err(format!(
            "truncated surface: header declares {} vertices and {} faces, {} bytes remain",
            n_vertices,
            n_faces,
            cur.remaining()
        ));
    }

    let mut vertices = Vec::with_capacity(n_vertices);
    for _ in 0..n_vertices {
        let x = cur.f32_be()? as f64;
        let y = cur.f32_be()? as f64;
        let z = cur.f32_be()? as f64;
        vertices.push([x, y, z]);
    }

    let mut faces = Vec::with_capacity(n_faces);
    for i in 0..n_faces {
        let mut tri = [0usize; 3];
        for slot in tri.iter_mut() {
            let idx = cur.i32_be()?;
            if idx < 0 || idx as usize >= n_vertices {
                return Err(format!("face {} has invalid vertex index {}", i, idx));
            }
            *slot = idx as usize;
        }
        faces.push(tri);
    }

    Ok(TriaMesh::new(vertices, faces))
}

/// Read a FreeSurfer triangle surface such as `surf/lh.white`.
pub fn read_fssurf(path: &Path) -> Result<TriaMesh> {
    let bytes = fs::read(path).map_err(|e| BrainprintError::parse(path, e.to_string()))?;
    parse_fssurf(&bytes).map_err(|reason| BrainprintError::parse(path, reason))
}

/// Convert a FreeSurfer surface to VTK, returning the destination path.
pub fn surf_to_vtk(source: &Path, destination: &Path) -> Result<PathBuf> {
    let mesh = read_fssurf(source)?;
    write_vtk(&mesh, destination)?;
    Ok(destination.to_path_buf())
}

#[cfg(test)]
pub(crate) fn encode_fssurf(mesh: &TriaMesh) -> Vec<u8> {
    let mut bytes = TRIANGLE_MAGIC.to_vec();
    bytes.extend_from_slice(b"created by brainprint on today\n\n");
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
