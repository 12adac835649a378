//! CPU-side mesh generation for the scene pass. Meshes are rebuilt from a
//! base primitive whenever the tessellation levels change: the inner level
//! subdivides every face into `n^2` sub-triangles, the outer level shrinks
//! each facet toward its centroid so edges open up into a faceted look.
//! Flat (per-face) normals throughout.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

/// Base primitive selected with keys 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Cube,
    Icosahedron,
    Sphere,
    Icosphere,
}

impl MeshKind {
    pub const ALL: &[MeshKind] = &[
        MeshKind::Cube,
        MeshKind::Icosahedron,
        MeshKind::Sphere,
        MeshKind::Icosphere,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MeshKind::Cube => "cube",
            MeshKind::Icosahedron => "icosahedron",
            MeshKind::Sphere => "sphere",
            MeshKind::Icosphere => "icosphere",
        }
    }

    pub fn next(self) -> MeshKind {
        let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> MeshKind {
        let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Build the vertex list (non-indexed triangles) for a mesh at the given
/// tessellation levels. Levels are clamped to 1..=6; fractional values from
/// the session are floored so a mid-drag slider does not thrash rebuilds.
pub fn build(kind: MeshKind, inner: f32, outer: f32) -> Vec<MeshVertex> {
    let inner = (inner.floor() as u32).clamp(1, 6);
    let outer = (outer.floor() as u32).clamp(1, 6);

    let base = match kind {
        MeshKind::Cube => cube_triangles(),
        MeshKind::Icosahedron => icosahedron_triangles(),
        MeshKind::Sphere => sphere_triangles(24, 16),
        MeshKind::Icosphere => icosphere_triangles(2),
    };

    let shrink = 1.0 - 0.08 * (outer - 1) as f32;

    let mut vertices = Vec::with_capacity(base.len() * (inner * inner) as usize * 3);
    for tri in &base {
        for sub in subdivide(*tri, inner) {
            let centroid = (sub[0] + sub[1] + sub[2]) / 3.0;
            let normal = face_normal(sub);
            for p in sub {
                let shrunk = centroid + (p - centroid) * shrink;
                vertices.push(MeshVertex {
                    pos: shrunk.to_array(),
                    normal: normal.to_array(),
                });
            }
        }
    }
    vertices
}

fn face_normal(tri: [Vec3; 3]) -> Vec3 {
    let n = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
    if n.length_squared() > 1e-12 {
        n.normalize()
    } else {
        Vec3::Z
    }
}

/// Split one triangle into `n^2` sub-triangles by barycentric rows.
fn subdivide(tri: [Vec3; 3], n: u32) -> Vec<[Vec3; 3]> {
    let [a, b, c] = tri;
    let point = |i: u32, j: u32| {
        // i rows down from a, j steps along the row.
        let fi = i as f32 / n as f32;
        let fj = if i == 0 { 0.0 } else { j as f32 / i as f32 };
        let left = a.lerp(b, fi);
        let right = a.lerp(c, fi);
        left.lerp(right, fj)
    };

    let mut out = Vec::with_capacity((n * n) as usize);
    for i in 0..n {
        for j in 0..=i {
            // Upward triangle.
            out.push([point(i, j), point(i + 1, j), point(i + 1, j + 1)]);
            // Downward triangle, except at the row end.
            if j < i {
                out.push([point(i, j), point(i + 1, j + 1), point(i, j + 1)]);
            }
        }
    }
    out
}

fn cube_triangles() -> Vec<[Vec3; 3]> {
    let p = [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ];
    // Each face as two CCW triangles, outward-facing.
    let quads = [
        [4, 5, 6, 7], // +z
        [1, 0, 3, 2], // -z
        [5, 1, 2, 6], // +x
        [0, 4, 7, 3], // -x
        [7, 6, 2, 3], // +y
        [0, 1, 5, 4], // -y
    ];
    let mut tris = Vec::with_capacity(12);
    for q in quads {
        tris.push([p[q[0]], p[q[1]], p[q[2]]]);
        tris.push([p[q[0]], p[q[2]], p[q[3]]]);
    }
    tris
}

fn icosahedron_triangles() -> Vec<[Vec3; 3]> {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let v: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|(x, y, z)| Vec3::new(*x, *y, *z).normalize())
    .collect();

    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 3],
    ];
    FACES.iter().map(|f| [v[f[0]], v[f[1]], v[f[2]]]).collect()
}

/// UV sphere as a triangle soup (poles emit one triangle per slice).
fn sphere_triangles(slices: u32, stacks: u32) -> Vec<[Vec3; 3]> {
    use std::f32::consts::PI;
    let pt = |stack: u32, slice: u32| {
        let phi = PI * stack as f32 / stacks as f32;
        let theta = 2.0 * PI * slice as f32 / slices as f32;
        Vec3::new(
            phi.sin() * theta.cos(),
            phi.cos(),
            phi.sin() * theta.sin(),
        )
    };

    let mut tris = Vec::new();
    for stack in 0..stacks {
        for slice in 0..slices {
            let p00 = pt(stack, slice);
            let p01 = pt(stack, slice + 1);
            let p10 = pt(stack + 1, slice);
            let p11 = pt(stack + 1, slice + 1);
            if stack > 0 {
                tris.push([p00, p11, p01]);
            }
            if stack + 1 < stacks {
                tris.push([p00, p10, p11]);
            }
        }
    }
    tris
}

/// Icosahedron refined `depth` times with vertices re-projected onto the
/// unit sphere.
fn icosphere_triangles(depth: u32) -> Vec<[Vec3; 3]> {
    let mut tris = icosahedron_triangles();
    for _ in 0..depth {
        let mut next = Vec::with_capacity(tris.len() * 4);
        for [a, b, c] in tris {
            let ab = a.midpoint(b).normalize();
            let bc = b.midpoint(c).normalize();
            let ca = c.midpoint(a).normalize();
            next.push([a, ab, ca]);
            next.push([ab, b, bc]);
            next.push([ca, bc, c]);
            next.push([ab, bc, ca]);
        }
        tris = next;
    }
    tris
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_base_has_12_faces() {
        assert_eq!(cube_triangles().len(), 12);
    }

    #[test]
    fn inner_level_squares_triangle_count() {
        let base = build(MeshKind::Cube, 1.0, 1.0).len();
        for n in 2..=4u32 {
            let tess = build(MeshKind::Cube, n as f32, 1.0).len();
            assert_eq!(tess, base * (n * n) as usize, "inner level {n}");
        }
    }

    #[test]
    fn levels_are_clamped() {
        assert_eq!(
            build(MeshKind::Icosahedron, 0.0, 1.0).len(),
            build(MeshKind::Icosahedron, 1.0, 1.0).len()
        );
        assert_eq!(
            build(MeshKind::Icosahedron, 99.0, 1.0).len(),
            build(MeshKind::Icosahedron, 6.0, 1.0).len()
        );
    }

    #[test]
    fn outer_level_shrinks_facets_in_place() {
        let flat = build(MeshKind::Icosahedron, 2.0, 1.0);
        let open = build(MeshKind::Icosahedron, 2.0, 4.0);
        assert_eq!(flat.len(), open.len());
        // Facet centroids are unchanged; vertices move toward them.
        for chunk in 0..flat.len() / 3 {
            let c = |verts: &[MeshVertex]| {
                let mut s = Vec3::ZERO;
                for v in &verts[chunk * 3..chunk * 3 + 3] {
                    s += Vec3::from(v.pos);
                }
                s / 3.0
            };
            assert!((c(&flat) - c(&open)).length() < 1e-4);
        }
    }

    #[test]
    fn icosphere_vertices_on_unit_sphere() {
        for v in build(MeshKind::Icosphere, 1.0, 1.0) {
            let r = Vec3::from(v.pos).length();
            assert!((r - 1.0).abs() < 1e-4, "radius {r}");
        }
    }

    #[test]
    fn normals_are_unit_length() {
        for kind in MeshKind::ALL {
            for v in build(*kind, 2.0, 2.0) {
                let n = Vec3::from(v.normal).length();
                assert!((n - 1.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn kind_cycle_roundtrips() {
        for kind in MeshKind::ALL {
            assert_eq!(kind.next().prev(), *kind);
        }
    }
}
