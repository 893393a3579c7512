use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec3};
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

mod geometry;
mod renderer;
mod ui;

use geometry::cylinder;
use renderer::{GpuState, InitError, OrbitCamera};
use ui::{EndPosTracker, ViewerState, apply_theme, draw_control_panel};

const WINDOW_TITLE: &str = "Arm Visualization";
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

const CYLINDER_TESSELLATION: u32 = 15;
const CYLINDER_RADIUS: f32 = 0.1;

const MOCK_SEGMENTS: usize = 6;

/// Mock arm chain: unit-height segments stacked joint-on-joint with an
/// alternating bend. Stands in for an external kinematics source; the
/// renderer only ever sees the flat float list.
fn arm_transforms(segments: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(segments * 16);
    let mut joint = Mat4::IDENTITY;

    for i in 0..segments {
        data.extend_from_slice(&joint.to_cols_array());

        let bend = if i % 2 == 0 { 0.25 } else { -0.25 };
        joint = joint * Mat4::from_translation(Vec3::Y) * Mat4::from_rotation_z(bend);
    }

    data
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    camera: OrbitCamera,
    state: ViewerState,
    end_pos: EndPosTracker,
    transforms: Vec<f32>,

    fps: f32,
    frame_count: u32,
    fps_timer: Instant,

    last_vsync_state: bool,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            camera: OrbitCamera::default(),
            state: ViewerState::default(),
            end_pos: EndPosTracker::default(),
            transforms: arm_transforms(MOCK_SEGMENTS),

            fps: 0.0,
            frame_count: 0,
            fps_timer: Instant::now(),

            last_vsync_state: true,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<(), InitError> {
        let mesh = cylinder(CYLINDER_TESSELLATION, CYLINDER_RADIUS);
        let gpu = pollster::block_on(GpuState::new(window.clone(), &mesh))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.camera
            .set_aspect(gpu.config.width as f32, gpu.config.height as f32);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);

        Ok(())
    }

    fn update(&mut self) {
        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }

        // The camera is fully slider-driven; sync it every frame.
        self.camera.radius = self.state.cam_radius;
        self.camera.polar = self.state.cam_polar;
        self.camera.azimuth = self.state.cam_azimuth;

        if let Some(gpu) = &mut self.gpu {
            if self.state.vsync_enabled != self.last_vsync_state {
                gpu.set_vsync(self.state.vsync_enabled);
                self.last_vsync_state = self.state.vsync_enabled;
            }

            // The transform list is re-read each frame; the host may have
            // rewritten it between iterations.
            gpu.upload_arm_transforms(&self.transforms);
            gpu.update_camera(&self.camera);
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);
        let fps = self.fps;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_control_panel(ctx, &mut self.state, fps);
        });

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("Out of GPU memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_arm(&view, &mut encoder);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some([x, y, z]) = self.end_pos.update(self.state.end_pos) {
            info!("end position: {x}, {y}, {z}");
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let window = Arc::new(event_loop.create_window(window_attrs).unwrap());

        if let Err(err) = self.init_gpu(window) {
            error!("graphics initialization failed: {err}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.camera
                        .set_aspect(size.width as f32, size.height as f32);
                }
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::segment_matrices;

    #[test]
    fn mock_chain_yields_one_matrix_per_segment() {
        let data = arm_transforms(MOCK_SEGMENTS);
        assert_eq!(data.len(), MOCK_SEGMENTS * 16);
        assert_eq!(segment_matrices(&data).count(), MOCK_SEGMENTS);
    }

    #[test]
    fn mock_chain_base_is_identity() {
        let data = arm_transforms(3);
        let first = segment_matrices(&data).next().unwrap();
        assert_eq!(first, Mat4::IDENTITY);
    }

    #[test]
    fn mock_chain_segments_stack_upward() {
        let data = arm_transforms(4);
        let origins: Vec<Vec3> = segment_matrices(&data)
            .map(|m| m.transform_point3(Vec3::ZERO))
            .collect();

        for pair in origins.windows(2) {
            assert!(pair[1].y > pair[0].y);
        }
    }
}
