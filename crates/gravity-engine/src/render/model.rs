use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::geometry::StripMesh;
use crate::surface::{FrameParams, SceneSetup};

use super::{RenderCtx, RenderTarget};

/// Lit triangle-strip model renderer.
///
/// Static state (mesh buffers, light and material) is uploaded once by
/// `configure`; `render` only rewrites the per-frame transforms.
#[derive(Default)]
pub struct ModelRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    scene_ubo: Option<wgpu::Buffer>,
    lighting_ubo: Option<wgpu::Buffer>,

    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    strips: Vec<Range<u32>>,

    lighting: LightingUniform,
}

impl ModelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the pipeline and uploads the mesh, light and material.
    pub fn configure(&mut self, ctx: &RenderCtx<'_>, scene: &SceneSetup, mesh: &StripMesh) {
        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);
        self.upload_mesh(ctx, mesh);

        self.lighting = LightingUniform::from_scene(scene);
        if let Some(ubo) = self.lighting_ubo.as_ref() {
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&self.lighting));
        }
    }

    /// Clears `target` and draws every strip with the frame's transforms.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, params: &FrameParams) {
        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);

        if let Some(ubo) = self.scene_ubo.as_ref() {
            let u = SceneUniform::new(params);
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
        }

        let [r, g, b, a] = params.clear_color.map(f64::from);
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gravity model pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
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
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        // Nothing uploaded yet: the pass above still clears.
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(vertex_buffer) = self.vertex_buffer.as_ref() else { return };
        let Some(index_buffer) = self.index_buffer.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
        rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        for strip in &self.strips {
            rpass.draw_indexed(strip.clone(), 0, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gravity model shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("gravity model bgl"),
                    entries: &[
                        uniform_entry::<SceneUniform>(0, wgpu::ShaderStages::VERTEX),
                        uniform_entry::<LightingUniform>(1, wgpu::ShaderStages::FRAGMENT),
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("gravity model pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gravity model pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint16),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: ctx.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.scene_ubo = None;
        self.lighting_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.scene_ubo.is_some() && self.lighting_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let scene_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gravity model scene ubo"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Rebuilt with the pipeline; carries the lighting uploaded by `configure`.
        let lighting_ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gravity model lighting ubo"),
            contents: bytemuck::bytes_of(&self.lighting),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gravity model bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_ubo.as_entire_binding(),
                },
            ],
        });

        self.scene_ubo = Some(scene_ubo);
        self.lighting_ubo = Some(lighting_ubo);
        self.bind_group = Some(bind_group);
    }

    fn upload_mesh(&mut self, ctx: &RenderCtx<'_>, mesh: &StripMesh) {
        let vertices = MeshVertex::interleave(mesh);

        self.vertex_buffer = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gravity model vbo"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        // Index buffers must be a multiple of 4 bytes.
        let mut indices = mesh.indices().to_vec();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        self.index_buffer = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gravity model ibo"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        }));

        self.strips = mesh.strip_ranges().to_vec();
        log::debug!(
            "uploaded model: {} vertices in {} strips",
            mesh.vertex_count(),
            mesh.strip_count()
        );
    }
}

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

// ── gpu types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    fn interleave(mesh: &StripMesh) -> Vec<MeshVertex> {
        mesh.positions()
            .iter()
            .zip(mesh.normals())
            .map(|(&position, &normal)| MeshVertex { position, normal })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct SceneUniform {
    projection: [[f32; 4]; 4],
    model_view: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
}

impl SceneUniform {
    fn new(params: &FrameParams) -> Self {
        Self {
            projection: params.projection.to_cols_array_2d(),
            model_view: params.model_view.to_cols_array_2d(),
            normal_matrix: normal_matrix(params.model_view).to_cols_array_2d(),
        }
    }
}

/// Inverse transpose of the upper 3x3, so normals stay perpendicular under
/// non-uniform scale.
fn normal_matrix(model_view: Mat4) -> Mat4 {
    let m = glam::Mat3::from_mat4(model_view);
    if m.determinant().abs() <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    Mat4::from_mat3(m.inverse().transpose())
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct LightingUniform {
    light_ambient: [f32; 4],
    light_diffuse: [f32; 4],
    light_specular: [f32; 4],
    light_position: [f32; 4],
    material_ambient: [f32; 4],
    material_diffuse: [f32; 4],
    material_specular: [f32; 4],
    shininess: f32,
    _pad: [f32; 3], // 16-byte alignment
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self::from_scene(&SceneSetup::default())
    }
}

impl LightingUniform {
    fn from_scene(scene: &SceneSetup) -> Self {
        let (light, material) = (&scene.light, &scene.material);
        Self {
            light_ambient: light.ambient,
            light_diffuse: light.diffuse,
            light_specular: light.specular,
            light_position: light.position,
            material_ambient: material.ambient,
            material_diffuse: material.diffuse,
            material_specular: material.specular,
            shininess: material.shininess,
            _pad: [0.0; 3],
        }
    }
}
