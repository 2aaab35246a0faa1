//! Legacy ASCII VTK POLYDATA reader and writer

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::TriaMesh;
use crate::error::{BrainprintError, Result};

/// Read a triangle mesh from a legacy ASCII VTK file.
pub fn read_vtk(path: &Path) -> Result<TriaMesh> {
    let text = fs::read_to_string(path)
        .map_err(|e| BrainprintError::parse(path, e.to_string()))?;
    parse_vtk(&text).map_err(|reason| BrainprintError::parse(path, reason))
}

/// Parse legacy VTK text. Only `POLYGONS` made of triangles are accepted.
pub fn parse_vtk(text: &str) -> std::result::Result<TriaMesh, String> {
    let mut lines = text.lines().map(str::trim);

    let header = lines.next().ok_or("empty file")?;
    if !header.starts_with("# vtk DataFile") {
        return Err(format!("not a VTK file (header '{}')", header));
    }
    // Title line
    lines.next().ok_or("truncated header")?;
    let encoding = lines.next().ok_or("truncated header")?;
    if !encoding.eq_ignore_ascii_case("ASCII") {
        return Err(format!("unsupported encoding '{}', expected ASCII", encoding));
    }

    // Remaining content is whitespace-separated; sections are keyed by keyword.
    let mut tokens = lines
        .filter(|l| !l.is_empty())
        .flat_map(str::split_whitespace);

    let mut dataset_seen = false;
    let mut vertices: Option<Vec<[f64; 3]>> = None;
    let mut faces: Option<Vec<[usize; 3]>> = None;

    while let Some(keyword) = tokens.next() {
        match keyword.to_ascii_uppercase().as_str() {
            "DATASET" => {
                let kind = tokens.next().ok_or("missing dataset type")?;
                if !kind.eq_ignore_ascii_case("POLYDATA") {
                    return Err(format!("unsupported dataset '{}', expected POLYDATA", kind));
                }
                dataset_seen = true;
            }
            "POINTS" => {
                let n: usize = parse_token(tokens.next(), "point count")?;
                // Data type (float/double) is irrelevant for ASCII
                tokens.next().ok_or("missing point data type")?;
                // Counts come from the file; a point takes at least 6 bytes of text
                let mut points = Vec::with_capacity(n.min(text.len() / 6));
                for _ in 0..n {
                    let x: f64 = parse_token(tokens.next(), "point coordinate")?;
                    let y: f64 = parse_token(tokens.next(), "point coordinate")?;
                    let z: f64 = parse_token(tokens.next(), "point coordinate")?;
                    points.push([x, y, z]);
                }
                vertices = Some(points);
            }
            "POLYGONS" => {
                let n: usize = parse_token(tokens.next(), "polygon count")?;
                let _size: usize = parse_token(tokens.next(), "polygon list size")?;
                let mut tris = Vec::with_capacity(n.min(text.len() / 8));
                for i in 0..n {
                    let k: usize = parse_token(tokens.next(), "polygon size")?;
                    if k != 3 {
                        return Err(format!("polygon {} has {} vertices, expected triangles", i, k));
                    }
                    let a: usize = parse_token(tokens.next(), "polygon index")?;
                    let b: usize = parse_token(tokens.next(), "polygon index")?;
                    let c: usize = parse_token(tokens.next(), "polygon index")?;
                    tris.push([a, b, c]);
                }
                faces = Some(tris);
            }
            "POINT_DATA" | "CELL_DATA" => break,
            other => {
                if vertices.is_some() && faces.is_some() {
                    break;
                }
                return Err(format!("unsupported section '{}'", other));
            }
        }
    }

    if !dataset_seen {
        return Err("missing DATASET POLYDATA".to_string());
    }
    let vertices = vertices.ok_or("missing POINTS section")?;
    let faces = faces.ok_or("missing POLYGONS section")?;
    Ok(TriaMesh::new(vertices, faces))
}

fn parse_token<T: std::str::FromStr>(token: Option<&str>, what: &str) -> std::result::Result<T, String> {
    let token = token.ok_or_else(|| format!("unexpected end of file reading {}", what))?;
    token
        .parse()
        .map_err(|_| format!("invalid {} '{}'", what, token))
}

/// Write a triangle mesh as legacy ASCII VTK.
pub fn write_vtk(mesh: &TriaMesh, path: &Path) -> Result<()> {
    let mut out = String::with_capacity(32 * (mesh.n_vertices() + mesh.n_faces()) + 128);
    out.push_str("# vtk DataFile Version 1.0\n");
    out.push_str("vtk output\n");
    out.push_str("ASCII\n");
    out.push_str("DATASET POLYDATA\n");
    // Writing into a String cannot fail
    let _ = writeln!(out, "POINTS {} float", mesh.n_vertices());
    for v in &mesh.vertices {
        let _ = writeln!(out, "{} {} {}", v[0], v[1], v[2]);
    }
    let _ = writeln!(out, "POLYGONS {} {}", mesh.n_faces(), 4 * mesh.n_faces());
    for f in &mesh.faces {
        let _ = writeln!(out, "3 {} {} {}", f[0], f[1], f[2]);
    }
    fs::write(path, out)?;
    Ok(())
}
