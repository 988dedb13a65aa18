use std::collections::HashMap;
use std::num::NonZeroU64;
use std::rc::{Rc, Weak};

use wgpu::util::DeviceExt;

use crate::device::DEPTH_FORMAT;
use crate::effects::{BlendFunction, Outline, OutlineUniforms};
use crate::render::gpu_texture::{material_sampler, TEXTURE_FORMAT};
use crate::render::uniforms::{align_to, FrameUniform, ModelUniform};
use crate::render::{GpuGeometry, GpuTexture, RenderCtx, RenderTarget};
use crate::scene::{MeshId, PerspectiveCamera, PixelRect, Scene, Texture, TextureId, TextureMap};

/// Stencil value written under selected meshes.
const SELECTED: u32 = 1;

/// A scene plus its split partner.
const MAX_PANES: usize = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    format: wgpu::TextureFormat,
    sample_count: u32,
    outline_blend: BlendFunction,
}

struct Pipelines {
    mesh: wgpu::RenderPipeline,
    hull_visible: wgpu::RenderPipeline,
    hull_hidden: wgpu::RenderPipeline,
}

struct Layouts {
    shader: wgpu::ShaderModule,
    frame: wgpu::BindGroupLayout,
    model: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
    pipeline: wgpu::PipelineLayout,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct MaterialKey {
    texture: TextureId,
    anisotropy: u16,
}

/// Texture + sampler bind group, dropped once its texture is gone.
struct MaterialBinding {
    texture: Weak<Texture>,
    bind_group: wgpu::BindGroup,
}

/// One scene drawn into one region of the target.
struct Pane<'s> {
    scene: &'s Scene,
    scissor: Option<PixelRect>,
    outline: Option<&'s Outline>,
    key: PipelineKey,
    /// Index of the pane's first mesh in the model buffer.
    first_model: usize,
}

/// Lit mesh renderer with stencil-masked outline hulls.
///
/// The scene pass clears color/depth/stencil, draws every mesh (selected
/// meshes write `SELECTED` into the stencil buffer), then draws the selected
/// meshes again as slightly enlarged hulls wherever the stencil is not set.
/// With x-ray on, the occluded part of each hull is drawn in the hidden edge
/// color.
///
/// A split scene draws both halves in the same pass, each under its own
/// scissor rectangle and frame uniforms.
#[derive(Default)]
pub struct MeshRenderer {
    layouts: Option<Layouts>,
    pipelines: HashMap<PipelineKey, Pipelines>,

    frame_ubo: Option<wgpu::Buffer>,
    outline_ubo: Option<wgpu::Buffer>,
    frame_bind_group: Option<wgpu::BindGroup>,
    frame_stride: u64,
    outline_stride: u64,

    model_ubo: Option<wgpu::Buffer>,
    model_bind_group: Option<wgpu::BindGroup>,
    model_capacity: usize,
    model_stride: u64,

    samplers: HashMap<u16, wgpu::Sampler>,
    materials: HashMap<MaterialKey, MaterialBinding>,
    untextured: Option<wgpu::BindGroup>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        let panes = panes(ctx, scene);

        self.ensure_layouts(ctx);
        for pane in &panes {
            self.ensure_pipelines(ctx, pane.key);
        }
        self.ensure_frame_bindings(ctx);
        let mesh_count = panes.iter().map(|p| p.scene.meshes.len()).sum();
        self.ensure_model_capacity(ctx, mesh_count);
        self.ensure_untextured(ctx);

        // Mutating writes happen before borrowing pipelines/buffers immutably.
        self.write_uniforms(ctx, &panes, camera);

        for mesh in panes.iter().flat_map(|p| &p.scene.meshes) {
            GpuGeometry::get_or_upload(ctx.device, &mesh.geometry);
            if let Some(map) = mesh.material.map.as_ref() {
                self.ensure_material(ctx, map);
            }
        }

        let Some(frame_bg) = self.frame_bind_group.as_ref() else { return };
        let Some(untextured) = self.untextured.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitrine scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: target.resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Discard,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(2, untextured, &[]);

        for (p, pane) in panes.iter().enumerate() {
            if let Some(rect) = pane.scissor {
                if rect.is_empty() {
                    continue;
                }
                rpass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
            }
            rpass.set_bind_group(0, frame_bg, &[self.frame_offset(p), self.outline_offset(p)]);
            self.draw_pane(&mut rpass, pane, untextured);
        }
    }

    fn draw_pane(&self, rpass: &mut wgpu::RenderPass<'_>, pane: &Pane<'_>, untextured: &wgpu::BindGroup) {
        let Some(pipelines) = self.pipelines.get(&pane.key) else { return };
        let Some(model_bg) = self.model_bind_group.as_ref() else { return };

        rpass.set_pipeline(&pipelines.mesh);
        for (i, mesh) in pane.scene.meshes.iter().enumerate() {
            let Some(gpu) = mesh.geometry.gpu.get() else { continue };
            let selected = pane.outline.is_some_and(|o| o.selection.contains(MeshId(i)));
            let material = mesh
                .material
                .map
                .as_ref()
                .and_then(|map| self.materials.get(&MaterialKey::of(map)))
                .map_or(untextured, |m| &m.bind_group);
            rpass.set_stencil_reference(if selected { SELECTED } else { 0 });
            rpass.set_bind_group(1, model_bg, &[self.model_offset(pane.first_model + i)]);
            rpass.set_bind_group(2, material, &[]);
            rpass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            rpass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }

        let Some(outline) = pane.outline else { return };

        rpass.set_stencil_reference(SELECTED);
        let mut hulls = vec![&pipelines.hull_visible];
        if outline.settings.x_ray {
            hulls.push(&pipelines.hull_hidden);
        }
        for pipeline in hulls {
            rpass.set_pipeline(pipeline);
            for id in outline.selection.iter() {
                let Some(mesh) = pane.scene.mesh(id) else { continue };
                let Some(gpu) = mesh.geometry.gpu.get() else { continue };
                rpass.set_bind_group(1, model_bg, &[self.model_offset(pane.first_model + id.0)]);
                rpass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                rpass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }
        }
    }

    fn model_offset(&self, index: usize) -> u32 {
        (index as u64 * self.model_stride) as u32
    }

    fn frame_offset(&self, pane: usize) -> u32 {
        (pane as u64 * self.frame_stride) as u32
    }

    fn outline_offset(&self, pane: usize) -> u32 {
        (pane as u64 * self.outline_stride) as u32
    }

    fn write_uniforms(&mut self, ctx: &RenderCtx<'_>, panes: &[Pane<'_>], camera: &PerspectiveCamera) {
        for (p, pane) in panes.iter().enumerate() {
            if let Some(ubo) = self.frame_ubo.as_ref() {
                let u = FrameUniform::new(pane.scene, camera, ctx.width, ctx.height);
                ctx.queue.write_buffer(ubo, self.frame_offset(p) as u64, bytemuck::bytes_of(&u));
            }
            if let (Some(ubo), Some(outline)) = (self.outline_ubo.as_ref(), pane.outline) {
                let u = outline.settings.uniforms(ctx.time);
                ctx.queue.write_buffer(ubo, self.outline_offset(p) as u64, bytemuck::bytes_of(&u));
            }
        }

        let Some(ubo) = self.model_ubo.as_ref() else { return };
        let meshes: Vec<_> = panes.iter().flat_map(|p| &p.scene.meshes).collect();
        if meshes.is_empty() {
            return;
        }
        let stride = self.model_stride as usize;
        let mut bytes = vec![0u8; stride * meshes.len()];
        for (i, mesh) in meshes.into_iter().enumerate() {
            let u = ModelUniform::new(mesh);
            let at = i * stride;
            bytes[at..at + std::mem::size_of::<ModelUniform>()].copy_from_slice(bytemuck::bytes_of(&u));
        }
        ctx.queue.write_buffer(ubo, 0, &bytes);
    }

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.layouts.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vitrine mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let uniform_entry = |binding: u32, size: usize, dynamic: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: NonZeroU64::new(size as u64),
            },
            count: None,
        };

        let frame = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vitrine frame bgl"),
            entries: &[
                uniform_entry(0, std::mem::size_of::<FrameUniform>(), true),
                uniform_entry(1, std::mem::size_of::<OutlineUniforms>(), true),
            ],
        });

        let model = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vitrine model bgl"),
            entries: &[uniform_entry(0, std::mem::size_of::<ModelUniform>(), true)],
        });

        let material = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vitrine material bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vitrine mesh pipeline layout"),
            bind_group_layouts: &[&frame, &model, &material],
            immediate_size: 0,
        });

        self.layouts = Some(Layouts {
            shader,
            frame,
            model,
            material,
            pipeline,
        });

        let alignment = ctx.device.limits().min_uniform_buffer_offset_alignment as u64;
        self.model_stride = align_to(std::mem::size_of::<ModelUniform>() as u64, alignment);
        self.frame_stride = align_to(std::mem::size_of::<FrameUniform>() as u64, alignment);
        self.outline_stride = align_to(std::mem::size_of::<OutlineUniforms>() as u64, alignment);
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(layouts) = self.layouts.as_ref() else { return };

        log::debug!(
            "building mesh pipelines for {:?} ({}x, outline {:?})",
            key.format,
            key.sample_count,
            key.outline_blend
        );

        let stencil = |compare: wgpu::CompareFunction,
                       pass_op: wgpu::StencilOperation,
                       write_mask: u32| wgpu::StencilState {
            front: wgpu::StencilFaceState {
                compare,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op,
            },
            back: wgpu::StencilFaceState {
                compare,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op,
            },
            read_mask: 0xff,
            write_mask,
        };

        let build = |label: &str,
                     vs: &str,
                     fs: &str,
                     blend: Option<wgpu::BlendState>,
                     depth_write_enabled: bool,
                     depth_compare: wgpu::CompareFunction,
                     stencil: wgpu::StencilState| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layouts.pipeline),

                vertex: wgpu::VertexState {
                    module: &layouts.shader,
                    entry_point: Some(vs),
                    compilation_options: Default::default(),
                    buffers: &[GpuGeometry::vertex_layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &layouts.shader,
                    entry_point: Some(fs),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare,
                    stencil,
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: key.sample_count,
                    ..Default::default()
                },

                multiview_mask: None,
                cache: None,
            })
        };

        let outline_blend = Some(key.outline_blend.to_wgpu());
        let pipelines = Pipelines {
            mesh: build(
                "vitrine mesh pipeline",
                "vs_main",
                "fs_main",
                None,
                true,
                wgpu::CompareFunction::Less,
                stencil(wgpu::CompareFunction::Always, wgpu::StencilOperation::Replace, 0xff),
            ),
            hull_visible: build(
                "vitrine outline visible pipeline",
                "vs_hull",
                "fs_visible",
                outline_blend,
                false,
                wgpu::CompareFunction::LessEqual,
                stencil(wgpu::CompareFunction::NotEqual, wgpu::StencilOperation::Keep, 0),
            ),
            hull_hidden: build(
                "vitrine outline hidden pipeline",
                "vs_hull",
                "fs_hidden",
                outline_blend,
                false,
                wgpu::CompareFunction::Greater,
                stencil(wgpu::CompareFunction::NotEqual, wgpu::StencilOperation::Keep, 0),
            ),
        };

        self.pipelines.insert(key, pipelines);
    }

    fn ensure_frame_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.frame_bind_group.is_some() {
            return;
        }
        let Some(layouts) = self.layouts.as_ref() else { return };

        let buffer = |label: &str, stride: u64| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: stride * MAX_PANES as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let frame_ubo = buffer("vitrine frame ubo", self.frame_stride);
        let outline_ubo = buffer("vitrine outline ubo", self.outline_stride);

        fn window(buffer: &wgpu::Buffer, size: usize) -> wgpu::BufferBinding<'_> {
            wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(size as u64),
            }
        }
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vitrine frame bind group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(window(&frame_ubo, std::mem::size_of::<FrameUniform>())),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(window(
                        &outline_ubo,
                        std::mem::size_of::<OutlineUniforms>(),
                    )),
                },
            ],
        });

        self.frame_ubo = Some(frame_ubo);
        self.outline_ubo = Some(outline_ubo);
        self.frame_bind_group = Some(bind_group);
    }

    fn ensure_model_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.model_capacity && self.model_bind_group.is_some() {
            return;
        }
        let Some(layouts) = self.layouts.as_ref() else { return };

        let new_cap = required.next_power_of_two().max(16);
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vitrine model ubo"),
            size: new_cap as u64 * self.model_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vitrine model bind group"),
            layout: &layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ModelUniform>() as u64),
                }),
            }],
        });

        self.model_ubo = Some(ubo);
        self.model_bind_group = Some(bind_group);
        self.model_capacity = new_cap;
    }

    /// Bind group for meshes without a texture: one white texel.
    fn ensure_untextured(&mut self, ctx: &RenderCtx<'_>) {
        if self.untextured.is_some() {
            return;
        }
        let white = ctx.device.create_texture_with_data(
            ctx.queue,
            &wgpu::TextureDescriptor {
                label: Some("vitrine white texel"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255; 4],
        );
        let view = white.create_view(&wgpu::TextureViewDescriptor::default());
        self.untextured = self.material_bind_group(ctx, &view, 1);
    }

    fn ensure_material(&mut self, ctx: &RenderCtx<'_>, map: &TextureMap) {
        let key = MaterialKey::of(map);
        if self.materials.contains_key(&key) {
            return;
        }
        self.materials.retain(|_, m| m.texture.strong_count() > 0);

        let gpu = GpuTexture::get_or_upload(ctx.device, ctx.queue, &map.texture);
        let Some(bind_group) = self.material_bind_group(ctx, &gpu.view, key.anisotropy) else { return };
        log::debug!(
            "bound {} texture with anisotropy {}",
            map.texture.label(),
            key.anisotropy
        );
        self.materials.insert(
            key,
            MaterialBinding {
                texture: Rc::downgrade(&map.texture),
                bind_group,
            },
        );
    }

    fn material_bind_group(
        &mut self,
        ctx: &RenderCtx<'_>,
        view: &wgpu::TextureView,
        anisotropy: u16,
    ) -> Option<wgpu::BindGroup> {
        let layouts = self.layouts.as_ref()?;
        let sampler = self
            .samplers
            .entry(anisotropy)
            .or_insert_with(|| material_sampler(ctx.device, anisotropy));

        Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vitrine material bind group"),
            layout: &layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }))
    }
}

impl MaterialKey {
    fn of(map: &TextureMap) -> Self {
        Self {
            texture: map.texture.id(),
            anisotropy: map.anisotropy_clamp(),
        }
    }
}

/// The scene alone, or its left half followed by the split partner.
fn panes<'s>(ctx: &RenderCtx<'_>, scene: &'s Scene) -> Vec<Pane<'s>> {
    let pane = |scene: &'s Scene, scissor: Option<PixelRect>, first_model: usize| {
        let outline = scene.effects.outline.as_ref().filter(|o| !o.selection.is_empty());
        Pane {
            scene,
            scissor,
            outline,
            key: PipelineKey {
                format: ctx.surface_format,
                sample_count: ctx.sample_count,
                outline_blend: outline.map(|o| o.settings.blend).unwrap_or_default(),
            },
            first_model,
        }
    };

    match scene.split.as_deref() {
        None => vec![pane(scene, None, 0)],
        Some(split) => {
            let [left, right] = split.halves(ctx.width, ctx.height);
            vec![
                pane(scene, Some(left), 0),
                pane(&split.right, Some(right), scene.meshes.len()),
            ]
        }
    }
}
