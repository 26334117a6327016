//! STL export of massing payloads.
//!
//! Every payload is decomposed into boxes ([`MassingMesh::volumes`]) and each
//! box is written as 12 triangles. STL is z-up, so plan coordinates `(x, z)`
//! become `(x, y)` and the massing height becomes `z`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::optimize::mesh::{MassBox, MassingMesh};

/// STL file format variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    /// ASCII text format (human-readable, larger file size)
    Ascii,
    /// Binary format (compact, faster to read/write)
    Binary,
}

/// One facet in STL (z-up) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub normal: [f64; 3],
    pub vertices: [[f64; 3]; 3],
}

impl Triangle {
    fn new(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Self {
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let cross = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let len = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
        let normal = if len > 1e-12 {
            [cross[0] / len, cross[1] / len, cross[2] / len]
        } else {
            [0.0, 0.0, 1.0]
        };
        Self {
            normal,
            vertices: [a, b, c],
        }
    }

    /// Signed volume of the tetrahedron spanned with the origin.
    pub fn signed_volume(&self) -> f64 {
        let [a, b, c] = self.vertices;
        (a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0]))
            / 6.0
    }
}

/// Triangulates a box with outward-facing normals.
pub fn box_triangles(b: &MassBox) -> [Triangle; 12] {
    let ([x0, y0, z0], [x1, y1, z1]) = b.corners();
    // Plan z becomes STL y, height becomes STL z
    let p = |x: f64, plan_z: f64, h: f64| [x, plan_z, h];
    let quads: [[[f64; 3]; 4]; 6] = [
        [p(x0, z0, y0), p(x0, z1, y0), p(x1, z1, y0), p(x1, z0, y0)],
        [p(x0, z0, y1), p(x1, z0, y1), p(x1, z1, y1), p(x0, z1, y1)],
        [p(x0, z0, y0), p(x1, z0, y0), p(x1, z0, y1), p(x0, z0, y1)],
        [p(x0, z1, y0), p(x0, z1, y1), p(x1, z1, y1), p(x1, z1, y0)],
        [p(x0, z0, y0), p(x0, z0, y1), p(x0, z1, y1), p(x0, z1, y0)],
        [p(x1, z0, y0), p(x1, z1, y0), p(x1, z1, y1), p(x1, z0, y1)],
    ];
    let mut tris = [Triangle::new([0.0; 3], [0.0; 3], [0.0; 3]); 12];
    for (i, [a, b, c, d]) in quads.into_iter().enumerate() {
        tris[2 * i] = Triangle::new(a, b, c);
        tris[2 * i + 1] = Triangle::new(a, c, d);
    }
    tris
}

/// All facets of a massing payload.
pub fn mesh_triangles(mesh: &MassingMesh) -> Vec<Triangle> {
    mesh.volumes().iter().flat_map(box_triangles).collect()
}

/// Writes a massing payload to an STL file.
///
/// # Example
/// ```no_run
/// use massing3d::io::stl::{write_stl, StlFormat};
/// use massing3d::optimize::MassingMesh;
/// use std::path::Path;
///
/// let mesh = MassingMesh::Courtyard {
///     outer_width: 50.0,
///     outer_depth: 40.0,
///     inner_width: 21.0,
///     inner_depth: 16.8,
///     height: 30.0,
///     origin: [0.0; 3],
/// };
/// write_stl(Path::new("option.stl"), &mesh, "courtyard", StlFormat::Binary).unwrap();
/// ```
pub fn write_stl(path: &Path, mesh: &MassingMesh, name: &str, format: StlFormat) -> Result<()> {
    let triangles = mesh_triangles(mesh);
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    let written = match format {
        StlFormat::Ascii => write_stl_ascii(writer, &triangles, name),
        StlFormat::Binary => write_stl_binary(writer, &triangles, name),
    };
    written.with_context(|| format!("Failed to write STL: {}", path.display()))
}

fn write_stl_ascii<W: Write>(mut writer: W, triangles: &[Triangle], name: &str) -> Result<()> {
    writeln!(writer, "solid {}", name)?;
    for tri in triangles {
        let [nx, ny, nz] = tri.normal;
        writeln!(writer, "  facet normal {} {} {}", nx, ny, nz)?;
        writeln!(writer, "    outer loop")?;
        for [x, y, z] in tri.vertices {
            writeln!(writer, "      vertex {} {} {}", x, y, z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", name)?;
    writer.flush()?;
    Ok(())
}

fn write_stl_binary<W: Write>(mut writer: W, triangles: &[Triangle], name: &str) -> Result<()> {
    // 80-byte header
    let mut header = [0u8; 80];
    let header_str = format!("binary STL - {}", name);
    let bytes = header_str.as_bytes();
    let len = bytes.len().min(80);
    header[..len].copy_from_slice(&bytes[..len]);
    writer.write_all(&header)?;

    writer.write_all(&(triangles.len() as u32).to_le_bytes())?;
    for tri in triangles {
        for v in std::iter::once(tri.normal).chain(tri.vertices) {
            for c in v {
                writer.write_all(&(c as f32).to_le_bytes())?;
            }
        }
        // Attribute byte count (unused)
        writer.write_all(&0u16.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the facets of an ASCII or binary STL file.
pub fn read_stl(path: &Path) -> Result<Vec<Triangle>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    // Binary headers may also start with "solid"
    match std::str::from_utf8(&bytes) {
        Ok(text) if text.starts_with("solid") && text.contains("endsolid") => {
            parse_stl_ascii(text, path)
        }
        _ => parse_stl_binary(&bytes, path),
    }
}

fn parse_triple(tokens: &[&str], path: &Path) -> Result<[f64; 3]> {
    if tokens.len() != 3 {
        bail!("Malformed STL line in {}", path.display());
    }
    let mut out = [0.0; 3];
    for (o, t) in out.iter_mut().zip(tokens) {
        *o = t
            .parse()
            .with_context(|| format!("Invalid number '{t}' in {}", path.display()))?;
    }
    Ok(out)
}

fn parse_stl_ascii(text: &str, path: &Path) -> Result<Vec<Triangle>> {
    let mut triangles = Vec::new();
    let mut normal = [0.0; 3];
    let mut verts: Vec<[f64; 3]> = Vec::with_capacity(3);

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["facet", "normal", rest @ ..] => {
                normal = parse_triple(rest, path)?;
                verts.clear();
            }
            ["vertex", rest @ ..] => verts.push(parse_triple(rest, path)?),
            ["endfacet"] => {
                let &[a, b, c] = verts.as_slice() else {
                    bail!("Facet without 3 vertices in {}", path.display());
                };
                triangles.push(Triangle {
                    normal,
                    vertices: [a, b, c],
                });
            }
            _ => {}
        }
    }
    Ok(triangles)
}

fn parse_stl_binary(bytes: &[u8], path: &Path) -> Result<Vec<Triangle>> {
    if bytes.len() < 84 {
        bail!("Binary STL too short: {}", path.display());
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    if bytes.len() < 84 + count * 50 {
        bail!(
            "Binary STL truncated: {} declares {} triangles",
            path.display(),
            count
        );
    }

    let f = |offset: usize| {
        f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]) as f64
    };
    let triple = |offset: usize| [f(offset), f(offset + 4), f(offset + 8)];

    Ok((0..count)
        .map(|i| {
            let base = 84 + i * 50;
            Triangle {
                normal: triple(base),
                vertices: [triple(base + 12), triple(base + 24), triple(base + 36)],
            }
        })
        .collect())
}

/// Enclosed volume of a closed triangle set (m3).
pub fn enclosed_volume(triangles: &[Triangle]) -> f64 {
    triangles.iter().map(Triangle::signed_volume).sum()
}
