use std::cell::OnceCell;
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::render::GpuGeometry;

/// Interleaved vertex layout shared by every primitive.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Texture coordinates, `v` pointing down the image.
    pub uv: [f32; 2],
}

impl Vertex {
    #[inline]
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Stable identity for a geometry, used as a GPU cache key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Indexed triangle list with counter-clockwise front faces.
///
/// GPU buffers are created on first draw and released when the geometry is
/// dropped; share a geometry between meshes through `Rc<Geometry>`.
pub struct Geometry {
    id: GeometryId,
    label: &'static str,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    pub(crate) gpu: OnceCell<GpuGeometry>,
}

impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geometry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("uploaded", &self.gpu.get().is_some())
            .finish()
    }
}

impl Geometry {
    pub fn from_parts(label: &'static str, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            id: GeometryId::next(),
            label,
            vertices,
            indices,
            gpu: OnceCell::new(),
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned box centered at the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        // (normal, u, v) with u × v = normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let uv = Vec2::new(a + 1.0, 1.0 - b) * 0.5;
                vertices.push(Vertex::new((n + u * a + v * b) * half, n, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::from_parts("box", vertices, indices)
    }

    /// Flat rectangle in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let half = Vec2::new(width, height) * 0.5;
        let vertices = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .map(|(u, v)| {
                let position = Vec3::new((u * 2.0 - 1.0) * half.x, (1.0 - v * 2.0) * half.y, 0.0);
                Vertex::new(position, Vec3::Z, Vec2::new(u, v))
            })
            .to_vec();
        // top-left, top-right, bottom-right, bottom-left
        Self::from_parts("plane", vertices, vec![0, 3, 2, 0, 2, 1])
    }

    /// Unit box.
    pub fn unit_box() -> Self {
        Self::cuboid(1.0, 1.0, 1.0)
    }

    /// UV sphere with `width_segments` around and `height_segments` pole to pole.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);

        let rings = (0..=h).map(|iy| {
            let phi = iy as f32 / h as f32 * PI;
            (phi, 0.0)
        });
        let (vertices, indices) = lat_long(radius, w, rings);
        Self::from_parts("sphere", vertices, indices)
    }

    /// Sphere split at the equator with a cylinder of `length` inserted.
    pub fn capsule(radius: f32, length: f32, cap_segments: u32, radial_segments: u32) -> Self {
        let cap = cap_segments.max(1);
        let radial = radial_segments.max(3);
        let half = length * 0.5;

        let top = (0..=cap).map(move |k| (k as f32 / cap as f32 * FRAC_PI_2, half));
        let bottom = (0..=cap).map(move |k| (FRAC_PI_2 + k as f32 / cap as f32 * FRAC_PI_2, -half));
        let (vertices, indices) = lat_long(radius, radial, top.chain(bottom));
        Self::from_parts("capsule", vertices, indices)
    }

    /// Cone with its apex on +Y and a closed base, centered on its height.
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        let radial = radial_segments.max(3);
        let half = height * 0.5;
        let slope = radius / height;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Mantle: row 0 is the apex, row 1 the base ring.
        for row in 0..=1u32 {
            let r = row as f32 * radius;
            let y = half - row as f32 * height;
            for x in 0..=radial {
                let theta = x as f32 / radial as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                let normal = Vec3::new(sin, slope, cos).normalize();
                let uv = Vec2::new(x as f32 / radial as f32, row as f32);
                vertices.push(Vertex::new(Vec3::new(r * sin, y, r * cos), normal, uv));
            }
        }
        let stride = radial + 1;
        for x in 0..radial {
            let b = stride + x;
            let c = stride + x + 1;
            let d = x + 1;
            indices.extend_from_slice(&[b, c, d]);
        }

        // Base cap.
        let center_start = vertices.len() as u32;
        for _ in 0..radial {
            vertices.push(Vertex::new(Vec3::new(0.0, -half, 0.0), Vec3::NEG_Y, Vec2::splat(0.5)));
        }
        let ring_start = vertices.len() as u32;
        for x in 0..=radial {
            let theta = x as f32 / radial as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let uv = Vec2::new(sin, cos) * 0.5 + 0.5;
            vertices.push(Vertex::new(Vec3::new(radius * sin, -half, radius * cos), Vec3::NEG_Y, uv));
        }
        for x in 0..radial {
            let c = center_start + x;
            let i = ring_start + x;
            indices.extend_from_slice(&[i + 1, i, c]);
        }

        Self::from_parts("cone", vertices, indices)
    }

    /// Torus in the XY plane around the Z axis.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);

        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let uv = Vec2::new(i as f32 / tubular as f32, j as f32 / radial as f32);
                vertices.push(Vertex::new(position, (position - center).normalize(), uv));
            }
        }

        let stride = tubular + 1;
        let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = stride * j + i - 1;
                let b = stride * (j - 1) + i - 1;
                let c = stride * (j - 1) + i;
                let d = stride * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::from_parts("torus", vertices, indices)
    }
}

/// Builds a latitude/longitude surface from `(phi, y_offset)` rings.
///
/// Rings run from the north pole (`phi = 0`) to the south pole (`phi = PI`);
/// the triangles touching either pole collapse to one per quad.
fn lat_long(
    radius: f32,
    segments: u32,
    rings: impl Iterator<Item = (f32, f32)>,
) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut ring_count = 0u32;

    for (phi, offset) in rings {
        let (sin_phi, cos_phi) = phi.sin_cos();
        for ix in 0..=segments {
            let theta = ix as f32 / segments as f32 * TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = Vec3::new(-cos_theta * sin_phi, cos_phi, sin_theta * sin_phi);
            let position = normal * radius + Vec3::new(0.0, offset, 0.0);
            let uv = Vec2::new(ix as f32 / segments as f32, phi / PI);
            vertices.push(Vertex::new(position, normal, uv));
        }
        ring_count += 1;
    }

    let stride = segments + 1;
    let bands = ring_count.saturating_sub(1);
    let mut indices = Vec::new();
    for iy in 0..bands {
        for ix in 0..segments {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != bands - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    (vertices, indices)
}
