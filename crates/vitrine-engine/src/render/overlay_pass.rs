use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::effects::{BlendFunction, CenterCircle, CenterCircleUniforms};
use crate::render::{RenderCtx, RenderTarget};

/// Full-screen center-circle overlay, drawn onto the resolved swapchain view.
#[derive(Default)]
pub struct CenterCircleRenderer {
    shader: Option<wgpu::ShaderModule>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<(wgpu::TextureFormat, BlendFunction), wgpu::RenderPipeline>,

    ubo: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
}

impl CenterCircleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, circle: &CenterCircle) {
        let key = (ctx.surface_format, circle.blend);
        self.ensure_pipeline(ctx, key);
        self.ensure_bindings(ctx);

        let Some(ubo) = self.ubo.as_ref() else { return };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&circle.uniforms()));

        let Some(pipeline) = self.pipelines.get(&key) else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitrine center circle pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, key: (wgpu::TextureFormat, BlendFunction)) {
        if self.pipelines.contains_key(&key) {
            return;
        }

        if self.shader.is_none() {
            self.shader = Some(ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("vitrine center circle shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/center_circle.wgsl").into()),
            }));

            let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("vitrine center circle bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<CenterCircleUniforms>() as u64),
                    },
                    count: None,
                }],
            });

            self.pipeline_layout = Some(ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("vitrine center circle pipeline layout"),
                bind_group_layouts: &[&bgl],
                immediate_size: 0,
            }));
            self.bind_group_layout = Some(bgl);
        }

        let Some(shader) = self.shader.as_ref() else { return };
        let Some(layout) = self.pipeline_layout.as_ref() else { return };

        let (format, blend) = key;
        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("vitrine center circle pipeline"),
            layout: Some(layout),

            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend.to_wgpu()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(key, pipeline);
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vitrine center circle ubo"),
            size: std::mem::size_of::<CenterCircleUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vitrine center circle bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.ubo = Some(ubo);
        self.bind_group = Some(bind_group);
    }
}
