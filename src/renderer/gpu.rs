use glam::Mat4;
use thiserror::Error;

use crate::geometry::{CylinderMesh, Vertex};
use crate::renderer::camera::{CameraUniform, OrbitCamera};

/// Starting capacity of the per-segment uniform buffer; it grows on demand
/// when the host hands over a longer transform list.
const INITIAL_SEGMENT_CAPACITY: usize = 64;

/// Dynamic uniform offsets must respect the 256-byte alignment guaranteed by
/// the default device limits.
const SEGMENT_STRIDE: u64 = 256;

/// Next capacity for the per-segment uniform buffer once `needed` exceeds
/// `current`; doubles to amortize reallocation.
fn grown_capacity(current: usize, needed: usize) -> usize {
    let mut capacity = current.max(1);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}

/// Graphics initialization failures. The caller is expected to abort; there
/// is no useful degraded mode for a viewer with no pipeline.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create rendering surface: {0}")]
    Context(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to acquire graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("pipeline creation failed: {0}")]
    PipelineLink(String),
}

/// Interprets the host's flat transform list as column-major 4x4 matrices,
/// one per arm segment. A trailing partial chunk of fewer than 16 floats is
/// silently ignored.
pub fn segment_matrices(transforms: &[f32]) -> impl Iterator<Item = Mat4> + '_ {
    transforms.chunks_exact(16).map(Mat4::from_cols_slice)
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SegmentUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
}

impl SegmentUniform {
    fn from_model(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
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
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pipeline: wgpu::RenderPipeline,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    segment_buffer: wgpu::Buffer,
    segment_bind_group: wgpu::BindGroup,
    segment_bind_group_layout: wgpu::BindGroupLayout,
    segment_capacity: usize,
    segment_count: u32,

    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,

    depth_texture: wgpu::TextureView,
}

impl GpuState {
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        mesh: &CylinderMesh,
    ) -> Result<Self, InitError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(InitError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Validation errors from shader translation would otherwise only
        // surface through the uncaptured-error hook; scope them so a broken
        // shader fails initialization instead.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Arm Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });
        if let Some(err) = device.pop_error_scope().await {
            return Err(InitError::ShaderCompile(err.to_string()));
        }

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let segment_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Segment Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<SegmentUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let (segment_buffer, segment_bind_group) = Self::create_segment_buffer(
            &device,
            &segment_bind_group_layout,
            INITIAL_SEGMENT_CAPACITY,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Arm Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &segment_bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Arm Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = device.pop_error_scope().await {
            return Err(InitError::PipelineLink(err.to_string()));
        }

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cylinder Vertex Buffer"),
            size: (mesh.vertices.len() * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cylinder Index Buffer"),
            size: (mesh.indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&mesh.indices));

        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline,
            camera_buffer,
            camera_bind_group,
            segment_buffer,
            segment_bind_group,
            segment_bind_group_layout,
            segment_capacity: INITIAL_SEGMENT_CAPACITY,
            segment_count: 0,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            depth_texture,
        })
    }

    fn create_segment_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Segment Transform Buffer"),
            size: capacity as u64 * SEGMENT_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Segment Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<SegmentUniform>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn update_camera(&self, camera: &OrbitCamera) {
        let uniform = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = if enabled {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
    }

    /// Re-reads the host's transform list for this frame. The slice is only
    /// borrowed for the duration of this call and never retained; its length
    /// decides the number of draws issued by [`render_arm`](Self::render_arm).
    pub fn upload_arm_transforms(&mut self, transforms: &[f32]) {
        let needed = transforms.len() / 16;
        if needed > self.segment_capacity {
            self.segment_capacity = grown_capacity(self.segment_capacity, needed);
            (self.segment_buffer, self.segment_bind_group) = Self::create_segment_buffer(
                &self.device,
                &self.segment_bind_group_layout,
                self.segment_capacity,
            );
        }

        for (i, model) in segment_matrices(transforms).enumerate() {
            let uniform = SegmentUniform::from_model(model);
            self.queue.write_buffer(
                &self.segment_buffer,
                i as u64 * SEGMENT_STRIDE,
                bytemuck::cast_slice(&[uniform]),
            );
        }

        self.segment_count = needed as u32;
    }

    pub fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Clears color and depth, then issues one indexed draw of the shared
    /// cylinder mesh per uploaded segment transform.
    pub fn render_arm(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Arm Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.2,
                        g: 0.2,
                        b: 0.2,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        for i in 0..self.segment_count {
            let offset = i * SEGMENT_STRIDE as u32;
            render_pass.set_bind_group(1, &self.segment_bind_group, &[offset]);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn draw_count_is_floor_of_sixteenths() {
        assert_eq!(segment_matrices(&[]).count(), 0);
        assert_eq!(segment_matrices(&[0.0; 15]).count(), 0);
        assert_eq!(segment_matrices(&[0.0; 16]).count(), 1);
        assert_eq!(segment_matrices(&[0.0; 17]).count(), 1);
        assert_eq!(segment_matrices(&[0.0; 32]).count(), 2);
        assert_eq!(segment_matrices(&[0.0; 47]).count(), 2);
    }

    #[test]
    fn draw_count_is_not_capped_at_initial_capacity() {
        // One chunk past the starting buffer capacity must still yield one
        // matrix per chunk.
        let floats = (INITIAL_SEGMENT_CAPACITY + 1) * 16;
        let data = vec![0.0f32; floats];
        assert_eq!(
            segment_matrices(&data).count(),
            INITIAL_SEGMENT_CAPACITY + 1
        );
        assert_eq!(data.len() / 16, segment_matrices(&data).count());
    }

    #[test]
    fn segment_capacity_doubles_until_it_fits() {
        assert_eq!(grown_capacity(64, 65), 128);
        assert_eq!(grown_capacity(64, 128), 128);
        assert_eq!(grown_capacity(64, 129), 256);
        assert_eq!(grown_capacity(64, 1000), 1024);
        assert_eq!(grown_capacity(0, 3), 4);
    }

    #[test]
    fn chunks_are_read_column_major() {
        let mut data = Mat4::IDENTITY.to_cols_array().to_vec();
        // translation lands in the fourth column
        data[12] = 3.0;
        data[13] = 4.0;
        data[14] = 5.0;

        let m = segment_matrices(&data).next().unwrap();
        let p = m.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn trailing_floats_do_not_shift_earlier_chunks() {
        let mut data = vec![0.0f32; 16];
        data.copy_from_slice(&Mat4::IDENTITY.to_cols_array());
        data.extend_from_slice(&[9.0; 7]);

        let mats: Vec<Mat4> = segment_matrices(&data).collect();
        assert_eq!(mats.len(), 1);
        assert_eq!(mats[0], Mat4::IDENTITY);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let u = SegmentUniform::from_model(model);
        let normal = Mat4::from_cols_array_2d(&u.normal);

        // A +x normal on a surface stretched along x must stay +x after
        // renormalization, and shrink rather than grow in magnitude.
        let n = normal.transform_vector3(Vec3::X);
        assert!((n.normalize() - Vec3::X).length() < 1e-5);
        assert!((n.x - 0.5).abs() < 1e-5);
    }
}
