//! Progressive path-trace compute pipeline.
//!
//! Owns the wgpu pipeline, the scene storage buffer, the ping-pong
//! accumulation textures and the tone-mapped output texture. Each
//! dispatch renders one progressive frame: the kernel reads the
//! previous accumulation texture, blends the new samples in, and
//! writes both the updated accumulation and the displayable output.
//!
//! ## Usage
//! ```ignore
//! let mut pt = PathTracer::new(&device, width, height);
//! pt.upload_scene(&queue, &scene_data);
//! pt.update_camera(&queue, &camera_uniform);
//! pt.dispatch(&queue, &mut encoder); // one frame of accumulation
//! // blit pt.output_view() to screen
//! ```

use bytemuck::{Pod, Zeroable};

use super::scene_buffer::{SceneData, HEADER_SIZE, SCENE_BUFFER_SIZE};
use super::shaders::PATH_TRACE_WGSL;
use super::InvalidationListener;
use crate::util::inverse_or_identity;

/// Camera uniform matching the WGSL Camera struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// Inverse view matrix (world from view).
    pub inv_view: [[f32; 4]; 4],
    /// Inverse projection matrix (view from clip).
    pub inv_proj: [[f32; 4]; 4],
    /// Camera world position.
    pub position: [f32; 3],
    pub _pad: f32,
}

impl CameraUniform {
    /// Build from view/projection matrices, inverting with an identity
    /// fallback so a degenerate camera never produces NaN rays.
    pub fn from_matrices(view: glam::DMat4, proj: glam::DMat4, position: glam::DVec3) -> Self {
        Self {
            inv_view: inverse_or_identity(view).as_mat4().to_cols_array_2d(),
            inv_proj: inverse_or_identity(proj).as_mat4().to_cols_array_2d(),
            position: position.as_vec3().to_array(),
            _pad: 0.0,
        }
    }
}

/// Per-dispatch settings matching the WGSL Settings struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SettingsUniform {
    pub frame_index: u32,
    pub samples_per_pixel: u32,
    pub max_bounces: u32,
    pub flags: u32,
}

/// Settings flag bit: clamp per-sample radiance to suppress fireflies.
pub const FLAG_FIREFLY_CLAMP: u32 = 1;
/// Radiance ceiling applied when the clamp flag is set.
pub const FIREFLY_LIMIT: f32 = 10.0;

/// Workgroup size (must match @workgroup_size in WGSL).
const WG_SIZE: u32 = 8;

/// Path-trace pipeline state.
///
/// Two bind groups exist, one per accumulation-texture parity; the
/// even/odd frame index selects which texture is read and which is
/// written, so no copy is needed between frames.
pub struct PathTracer {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_groups: Option<[wgpu::BindGroup; 2]>,

    camera_buffer: wgpu::Buffer,
    settings_buffer: wgpu::Buffer,
    scene_buffer: wgpu::Buffer,

    accum_textures: [wgpu::Texture; 2],
    accum_views: [wgpu::TextureView; 2],
    output_texture: wgpu::Texture,
    output_view: wgpu::TextureView,

    width: u32,
    height: u32,

    frame_index: u32,
    scene_ready: bool,

    /// Samples traced per pixel per dispatch.
    pub samples_per_pixel: u32,
    /// Maximum path depth.
    pub max_bounces: u32,
    /// Settings flag bits (see [`FLAG_FIREFLY_CLAMP`]).
    pub flags: u32,
}

impl PathTracer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("path_trace_shader"),
            source: wgpu::ShaderSource::Wgsl(PATH_TRACE_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pt_bind_group_layout"),
            entries: &[
                // @binding(0) Camera uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // @binding(1) Settings uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // @binding(2) Tone-mapped output
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                // @binding(3) Previous accumulation (sampled)
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                // @binding(4) Current accumulation (storage)
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                // @binding(5) Scene header (first 256 bytes of the scene buffer)
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // @binding(6) Object records (remainder of the scene buffer)
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pt_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("pt_compute_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pt_camera_buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let settings_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pt_settings_buffer"),
            size: std::mem::size_of::<SettingsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Header and object records live in one buffer, bound as two
        // disjoint ranges
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pt_scene_buffer"),
            size: SCENE_BUFFER_SIZE as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (accum_textures, accum_views) = Self::create_accum(device, width, height);
        let (output_texture, output_view) = Self::create_output(device, width, height);

        let mut pt = Self {
            pipeline,
            bind_group_layout,
            bind_groups: None,
            camera_buffer,
            settings_buffer,
            scene_buffer,
            accum_textures,
            accum_views,
            output_texture,
            output_view,
            width,
            height,
            frame_index: 0,
            scene_ready: false,
            samples_per_pixel: 1,
            max_bounces: 8,
            flags: FLAG_FIREFLY_CLAMP,
        };
        pt.rebuild_bind_groups(device);
        pt
    }

    fn create_accum(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> ([wgpu::Texture; 2], [wgpu::TextureView; 2]) {
        let make = |label: &str| {
            let tex = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba32Float,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
            (tex, view)
        };
        let (t0, v0) = make("pt_accum_0");
        let (t1, v1) = make("pt_accum_1");
        ([t0, t1], [v0, v1])
    }

    fn create_output(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pt_output"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        (tex, view)
    }

    /// One bind group per accumulation parity: even frames read texture
    /// 0 and write texture 1, odd frames the reverse.
    fn rebuild_bind_groups(&mut self, device: &wgpu::Device) {
        let make = |prev: &wgpu::TextureView, curr: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("pt_bind_group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.camera_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.settings_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&self.output_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(prev),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(curr),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &self.scene_buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(HEADER_SIZE as u64),
                        }),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &self.scene_buffer,
                            offset: HEADER_SIZE as u64,
                            size: wgpu::BufferSize::new((SCENE_BUFFER_SIZE - HEADER_SIZE) as u64),
                        }),
                    },
                ],
            })
        };

        self.bind_groups = Some([
            make(&self.accum_views[0], &self.accum_views[1]),
            make(&self.accum_views[1], &self.accum_views[0]),
        ]);
    }

    /// Resize targets; implies an accumulation reset.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if self.width == width && self.height == height {
            return;
        }
        tracing::debug!(width, height, "resizing path tracer targets");
        self.width = width;
        self.height = height;
        let (accum_textures, accum_views) = Self::create_accum(device, width, height);
        self.accum_textures = accum_textures;
        self.accum_views = accum_views;
        let (tex, view) = Self::create_output(device, width, height);
        self.output_texture = tex;
        self.output_view = view;
        self.frame_index = 0;
        self.rebuild_bind_groups(device);
    }

    /// Upload serialized scene data with a single queue write.
    ///
    /// Does not reset accumulation; callers decide which edits
    /// invalidate the image (see [`InvalidationListener`]).
    pub fn upload_scene(&mut self, queue: &wgpu::Queue, data: &SceneData) {
        data.upload(queue, &self.scene_buffer);
        self.scene_ready = true;
    }

    /// Update camera uniform.
    pub fn update_camera(&mut self, queue: &wgpu::Queue, uniform: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(uniform));
    }

    /// Restart progressive accumulation from frame zero.
    pub fn reset_accumulation(&mut self) {
        if self.frame_index > 0 {
            tracing::info!(frames = self.frame_index, "accumulation reset");
        }
        self.frame_index = 0;
    }

    /// Record one progressive frame. Returns false if no scene has
    /// been uploaded yet.
    pub fn dispatch(&mut self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) -> bool {
        if !self.scene_ready {
            return false;
        }
        let Some(bind_groups) = &self.bind_groups else {
            return false;
        };
        let _span = tracing::trace_span!("pt_dispatch", frame = self.frame_index).entered();

        let settings = SettingsUniform {
            frame_index: self.frame_index,
            samples_per_pixel: self.samples_per_pixel.max(1),
            max_bounces: self.max_bounces,
            flags: self.flags,
        };
        queue.write_buffer(&self.settings_buffer, 0, bytemuck::bytes_of(&settings));

        let bg = &bind_groups[(self.frame_index & 1) as usize];
        let wg_x = self.width.div_ceil(WG_SIZE);
        let wg_y = self.height.div_ceil(WG_SIZE);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("pt_compute_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bg, &[]);
        pass.dispatch_workgroups(wg_x, wg_y, 1);
        drop(pass);

        self.frame_index += 1;
        true
    }

    /// Tone-mapped output view for display.
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.output_view
    }

    /// Frames accumulated since the last reset.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn is_ready(&self) -> bool {
        self.scene_ready
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl InvalidationListener for PathTracer {
    fn on_scene_or_camera_invalidated(&mut self) {
        self.reset_accumulation();
    }
}

/// CPU mirror of the kernel's progressive blend: frame 0 overwrites,
/// later frames fold new samples into the running mean.
pub fn blend(prev: [f32; 3], color: [f32; 3], frame_index: u32) -> [f32; 3] {
    if frame_index == 0 {
        return color;
    }
    let w = 1.0 / (frame_index + 1) as f32;
    [
        prev[0] + (color[0] - prev[0]) * w,
        prev[1] + (color[1] - prev[1]) * w,
        prev[2] + (color[2] - prev[2]) * w,
    ]
}

/// CPU mirror of the kernel's display transform (Reinhard + gamma).
pub fn tonemap(c: [f32; 3]) -> [f32; 3] {
    let map = |v: f32| (v / (v + 1.0)).powf(1.0 / 2.2);
    [map(c[0]), map(c[1]), map(c[2])]
}
