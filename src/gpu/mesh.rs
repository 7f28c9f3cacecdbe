//! Procedural meshes for the ornament layers.
//!
//! Every mesh is centred on the origin; instance matrices place and scale it.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Gift box edge length.
pub const GIFT_BOX_SIZE: f32 = 0.25;
/// Bauble radius.
pub const BAUBLE_RADIUS: f32 = 0.12;
/// Bauble tessellation (latitude and longitude segments).
pub const BAUBLE_SEGMENTS: u32 = 16;
/// Topper octahedron circumradius.
pub const TOPPER_RADIUS: f32 = 0.35;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12, // [f32; 3] is 12 bytes
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Axis-aligned cube with edge `size`. Faces are split so each has flat normals.
pub fn create_box(size: f32) -> MeshData {
    let h = size * 0.5;
    // (normal, tangent u, tangent v) with u x v = normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ];

    let mut mesh = MeshData::default();
    for (normal, u, v) in faces {
        let n = Vec3::from_array(normal);
        let u = Vec3::from_array(u);
        let v = Vec3::from_array(v);
        let base = mesh.vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (n + u * su + v * sv) * h;
            mesh.vertices.push(Vertex::new(p.to_array(), normal));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

/// UV sphere with `lat_segments` rings and `lon_segments` slices.
pub fn create_uv_sphere(radius: f32, lat_segments: u32, lon_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();

    for lat in 0..=lat_segments {
        let theta = std::f32::consts::PI * (lat as f32) / (lat_segments as f32);
        let (sin_theta, cos_theta) = theta.sin_cos();

        for lon in 0..=lon_segments {
            let phi = 2.0 * std::f32::consts::PI * (lon as f32) / (lon_segments as f32);
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
            let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
            mesh.vertices.push(Vertex::new(position, normal));
        }
    }

    for lat in 0..lat_segments {
        for lon in 0..lon_segments {
            let first = (lat * (lon_segments + 1) + lon) as u16;
            let second = first + lon_segments as u16 + 1;

            // Two triangles per quad
            mesh.indices.extend_from_slice(&[first, second, first + 1]);
            mesh.indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    mesh
}

/// Regular octahedron with vertices at distance `radius` on each axis.
/// Each face gets its own three vertices for flat shading.
pub fn create_octahedron(radius: f32) -> MeshData {
    let axes = [
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];
    let mut mesh = MeshData::default();

    for &x in &axes[0..2] {
        for &y in &axes[2..4] {
            for &z in &axes[4..6] {
                let normal = (x + y + z).normalize();
                // Wind counter-clockwise when seen from outside.
                let tri = if x.dot(y.cross(z)) > 0.0 {
                    [x, y, z]
                } else {
                    [x, z, y]
                };
                let base = mesh.vertices.len() as u16;
                for p in tri {
                    mesh.vertices
                        .push(Vertex::new((p * radius).to_array(), normal.to_array()));
                }
                mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
    }
    mesh
}

pub fn gift_box() -> MeshData {
    create_box(GIFT_BOX_SIZE)
}

pub fn bauble() -> MeshData {
    create_uv_sphere(BAUBLE_RADIUS, BAUBLE_SEGMENTS, BAUBLE_SEGMENTS)
}

pub fn topper() -> MeshData {
    create_octahedron(TOPPER_RADIUS)
}
