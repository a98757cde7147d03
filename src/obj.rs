//! A minimal Wavefront OBJ reader: `v` and triangular `f` directives only.
//! Failure to open or parse the file is non-fatal, matching the original
//! renderer's silent-empty-vector behavior, but logged rather than ignored.

use crate::math::Vec3;
use std::fs;
use std::path::Path;

/// Parses `v`/`f` directives into a flat `[a, b, c, a, b, c, ...]` triangle
/// vertex stream. Returns an empty vector (with a warning logged) if the
/// file can't be opened or a line can't be parsed.
pub fn read_obj(path: impl AsRef<Path>) -> Vec<Vec3> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to open obj file");
            return Vec::new();
        }
    };

    let mut vertices = Vec::new();
    let mut triangles = Vec::new();

    for line in contents.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            continue;
        }

        match tokens[0] {
            "v" if tokens.len() >= 4 => match parse_vertex(&tokens) {
                Some(v) => vertices.push(v),
                None => {
                    tracing::warn!(path = %path.display(), %line, "malformed vertex line, skipping obj file");
                    return Vec::new();
                }
            },
            "f" if tokens.len() >= 4 => match parse_face(&tokens, &vertices) {
                Some(face_verts) => triangles.extend(face_verts),
                None => {
                    tracing::warn!(path = %path.display(), %line, "malformed face line, skipping obj file");
                    return Vec::new();
                }
            },
            _ => {}
        }
    }

    triangles
}

fn parse_vertex(tokens: &[&str]) -> Option<Vec3> {
    let x = tokens[1].parse().ok()?;
    let y = tokens[2].parse().ok()?;
    let z = tokens[3].parse().ok()?;
    Some(Vec3::new(x, y, z))
}

fn parse_face(tokens: &[&str], vertices: &[Vec3]) -> Option<[Vec3; 3]> {
    let index_of = |token: &str| -> Option<Vec3> {
        let index_str = token.split('/').next()?;
        let index: i64 = index_str.parse().ok()?;
        vertices.get((index - 1) as usize).copied()
    };
    Some([index_of(tokens[1])?, index_of(tokens[2])?, index_of(tokens[3])?])
}
