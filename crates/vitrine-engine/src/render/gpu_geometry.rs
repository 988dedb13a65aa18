use wgpu::util::DeviceExt;

use crate::scene::{Geometry, Vertex};

/// Device-side copy of a `Geometry`.
///
/// Owned by the geometry it was uploaded from; dropping the geometry releases
/// both buffers.
pub(crate) struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuGeometry {
    /// Returns the cached buffers, uploading on first use.
    pub fn get_or_upload<'g>(device: &wgpu::Device, geometry: &'g Geometry) -> &'g GpuGeometry {
        geometry.gpu.get_or_init(|| {
            log::trace!(
                "uploading {} geometry ({} vertices)",
                geometry.label(),
                geometry.vertices().len()
            );
            Self::upload(device, geometry)
        })
    }

    fn upload(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vitrine geometry vbo"),
            contents: bytemuck::cast_slice(geometry.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vitrine geometry ibo"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices().len() as u32,
        }
    }

    pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x3, // normal
            2 => Float32x2  // uv
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}
