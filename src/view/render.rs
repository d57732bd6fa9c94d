//! Flat-shaded scene rendering: static geometry uploaded once, doors and the
//! avatar rebuilt every frame, and an optional collider wireframe.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::gpu_init::GpuContext;
use super::mesh::{Mesh, MeshBuffer, Vertex};
use crate::controller::FrameLoop;
use crate::model::scene::DOOR_CONTAINER;
use crate::model::{Aabb, Camera, GaitBlend, SceneDescription, StaticCollisionMesh};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.5, g: 0.8, b: 1.0, a: 1.0 };
const WALL_COLOR: [f32; 4] = [0.82, 0.8, 0.76, 1.0];
const GLASS_COLOR: [f32; 4] = [0.6, 0.85, 0.95, 0.35];
const DOOR_COLOR: [f32; 4] = [0.55, 0.36, 0.2, 1.0];
const ACTIVE_DOOR_COLOR: [f32; 4] = [0.8, 0.55, 0.3, 1.0];
const AVATAR_IDLE_COLOR: [f32; 4] = [0.95, 0.55, 0.15, 1.0];
const AVATAR_WALK_COLOR: [f32; 4] = [1.0, 0.75, 0.3, 1.0];
/// Vertical bob amplitude and frequency of the walking avatar.
const WALK_BOB: f32 = 0.05;
const WALK_BOB_HZ: f32 = 2.0;
const COLLIDER_COLOR: [f32; 4] = [0.1, 1.0, 0.3, 1.0];

/// Avatar stand-in: a body box plus a nose marking its heading (+Z local).
const AVATAR_BODY: Aabb = Aabb { min: Vec3::new(-0.15, 0.0, -0.15), max: Vec3::new(0.15, 1.7, 0.15) };
const AVATAR_NOSE: Aabb = Aabb { min: Vec3::new(-0.05, 1.45, 0.15), max: Vec3::new(0.05, 1.55, 0.3) };

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self { view_proj: camera.view_proj().to_cols_array_2d() }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            sun_dir: [0.5, -1.0, 0.3],
            sun_intensity: 0.65,
            ambient: 0.35,
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub struct PipelineResources {
    pub pipeline: wgpu::RenderPipeline,
    pub line_pipeline: wgpu::RenderPipeline,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_entry = |binding: u32, visibility: wgpu::ShaderStages| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Scene triangles come with either winding
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

pub fn create_scene_pipelines(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> PipelineResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = create_pipeline(
        device,
        "scene_pipeline",
        &pipeline_layout,
        &shader,
        format,
        wgpu::PrimitiveTopology::TriangleList,
    );
    let line_pipeline = create_pipeline(
        device,
        "line_pipeline",
        &pipeline_layout,
        &shader,
        format,
        wgpu::PrimitiveTopology::LineList,
    );

    PipelineResources { pipeline, line_pipeline }
}

/// Static scene geometry split into opaque and glass parts. Door leaves are
/// left out, they move and are rebuilt per frame.
pub fn static_scene_meshes(scene: &SceneDescription) -> (Mesh, Mesh) {
    let mut opaque = Mesh::new();
    let mut glass = Mesh::new();
    for mesh in scene.meshes.iter().filter(|m| !m.has_ancestor(DOOR_CONTAINER)) {
        let (target, color) = if mesh.name.ends_with("Glass") { (&mut glass, GLASS_COLOR) } else { (&mut opaque, WALL_COLOR) };
        let triangles: Vec<_> = mesh.world_triangles().collect();
        target.push_triangles(&triangles, color);
    }
    (opaque, glass)
}

fn avatar_color(walk_weight: f32) -> [f32; 4] {
    let mut color = AVATAR_IDLE_COLOR;
    for (c, w) in color.iter_mut().zip(AVATAR_WALK_COLOR) {
        *c += (w - *c) * walk_weight;
    }
    color
}

/// Door leaves in their current pose plus the avatar stand-in, tinted and
/// bobbing by the idle/walk blend.
pub fn dynamic_mesh(frame_loop: &FrameLoop, gait: &GaitBlend, clock: f32) -> Mesh {
    let mut mesh = Mesh::new();
    let active = frame_loop.doors.active_door().map(|d| d.name().to_string());
    for door in frame_loop.doors.doors() {
        let color = if active.as_deref() == Some(door.name()) { ACTIVE_DOOR_COLOR } else { DOOR_COLOR };
        mesh.push_box(door.local_bounds(), &door.world_transform(), color);
    }
    if let Some(avatar) = frame_loop.avatar() {
        let weight = gait.walk_weight();
        let bob = WALK_BOB * weight * (clock * WALK_BOB_HZ * std::f32::consts::TAU).sin().abs();
        let transform = Mat4::from_rotation_translation(avatar.orientation, avatar.position + Vec3::Y * bob);
        let color = avatar_color(weight);
        mesh.push_box(&AVATAR_BODY, &transform, color);
        mesh.push_box(&AVATAR_NOSE, &transform, color);
    }
    mesh
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'_>, mesh: &MeshBuffer) {
    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
}

pub struct SceneRenderer {
    camera: CameraResources,
    pipelines: PipelineResources,
    depth_view: wgpu::TextureView,
    opaque: Option<MeshBuffer>,
    glass: Option<MeshBuffer>,
    collider_lines: Option<MeshBuffer>,
    dynamic: Option<MeshBuffer>,
    gait: GaitBlend,
    clock: f32,
}

impl SceneRenderer {
    pub fn new(gpu: &GpuContext, scene: &SceneDescription, collider: Option<&StaticCollisionMesh>) -> Self {
        let device = gpu.device.as_ref();
        let camera = create_camera_resources(device);
        gpu.queue.write_buffer(&camera.lighting_buffer, 0, bytemuck::bytes_of(&LightingUniform::default()));
        let pipelines = create_scene_pipelines(device, gpu.format, &camera.bind_group_layout);
        let (_, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);

        let (opaque, glass) = static_scene_meshes(scene);
        let collider_lines = collider.and_then(|c| {
            let mut lines = Mesh::new();
            lines.push_wireframe(c.triangles(), COLLIDER_COLOR);
            lines.upload(device, "collider")
        });

        Self {
            camera,
            pipelines,
            depth_view,
            opaque: opaque.upload(device, "scene"),
            glass: glass.upload(device, "glass"),
            collider_lines,
            dynamic: None,
            gait: GaitBlend::default(),
            clock: 0.0,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (_, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    /// Upload this frame's camera and moving geometry.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame_loop: &FrameLoop, dt: f32) {
        let uniform = CameraUniform::from_camera(frame_loop.camera());
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        self.clock += dt;
        if let Some(avatar) = frame_loop.avatar() {
            self.gait.update(avatar.gait(), dt);
        }
        self.dynamic = dynamic_mesh(frame_loop, &self.gait, self.clock).upload(device, "dynamic");
    }

    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, show_collider: bool) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.camera.camera_bind_group, &[]);
        pass.set_pipeline(&self.pipelines.pipeline);
        // Glass last so it blends over what is behind it
        for mesh in [&self.opaque, &self.dynamic, &self.glass].into_iter().flatten() {
            draw_mesh(&mut pass, mesh);
        }

        if show_collider {
            if let Some(lines) = &self.collider_lines {
                pass.set_pipeline(&self.pipelines.line_pipeline);
                draw_mesh(&mut pass, lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SurfaceSize;
    use crate::options::Options;

    #[test]
    fn static_meshes_leave_out_doors_and_split_glass() {
        let scene = SceneDescription::demo_house();
        let (opaque, glass) = static_scene_meshes(&scene);
        let door_triangles: usize = scene
            .meshes
            .iter()
            .filter(|m| m.has_ancestor(DOOR_CONTAINER))
            .map(|m| m.triangles.len())
            .sum();
        assert_eq!(opaque.indices.len() / 3 + glass.indices.len() / 3, scene.triangle_count() - door_triangles);
        assert!(!glass.is_empty());
    }

    #[test]
    fn dynamic_mesh_has_every_door_and_the_avatar() {
        let mut frame_loop = FrameLoop::new(Options::default(), SurfaceSize::new(800, 600));
        frame_loop.load_scene(&SceneDescription::demo_house());
        let mesh = dynamic_mesh(&frame_loop, &GaitBlend::default(), 0.0);
        // 12 triangles per box
        assert_eq!(mesh.indices.len(), (frame_loop.doors.len() + 2) * 12 * 3);
    }

    #[test]
    fn avatar_tint_follows_walk_weight() {
        assert_eq!(avatar_color(0.0), AVATAR_IDLE_COLOR);
        assert_eq!(avatar_color(1.0), AVATAR_WALK_COLOR);
    }
}
