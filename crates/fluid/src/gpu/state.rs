use std::collections::HashMap;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};

use crate::backend::{
    BufferId, FrameDraw, GpuError, ProgramId, RenderBackend, TextureId, TextureUpload,
    UniformLocation, UniformValue,
};

use super::context::GpuContext;
use super::pipeline::{create_vertex_buffer, FluidPipeline, PipelineLayouts};
use super::textures::GpuTexture;
use super::uniforms::{FluidUniforms, UniformSlot};

/// [`RenderBackend`] drawing into a window surface through wgpu.
///
/// Uniform writes land in a CPU-side block that is uploaded to the program's
/// uniform buffer right before each draw.
pub struct WgpuBackend {
    context: GpuContext,
    layouts: PipelineLayouts,
    uniforms: FluidUniforms,
    next_handle: u64,
    programs: HashMap<ProgramId, FluidPipeline>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, GpuTexture>,
}

impl WgpuBackend {
    /// Binds a backend to `target`, or returns `None` (after logging why) when
    /// no adapter or surface is available.
    ///
    /// The window behind `target` must outlive the backend.
    pub fn mount<T>(target: &T, size: (u32, u32)) -> Option<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        match Self::new(target, size) {
            Ok(backend) => Some(backend),
            Err(err) => {
                warn!("GPU rendering unavailable; background disabled: {err:#}");
                None
            }
        }
    }

    pub fn new<T>(target: &T, size: (u32, u32)) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size)?;
        let layouts = PipelineLayouts::new(&context.device);
        Ok(Self {
            context,
            layouts,
            uniforms: FluidUniforms::default(),
            next_handle: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
        })
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderBackend for WgpuBackend {
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError> {
        let pipeline = FluidPipeline::new(
            &self.context.device,
            &self.layouts,
            self.context.surface_format,
            vertex,
            fragment,
        )?;
        let id = ProgramId::from_raw(self.next_handle());
        self.programs.insert(id, pipeline);
        debug!(?id, "fluid program linked");
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains_key(&program) {
            return None;
        }
        UniformSlot::from_name(name).map(|slot| UniformLocation::from_raw(slot.index()))
    }

    fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferId, GpuError> {
        if vertices.is_empty() {
            return Err(GpuError::Allocation("quad buffer"));
        }
        let buffer = create_vertex_buffer(&self.context.device, vertices);
        let id = BufferId::from_raw(self.next_handle());
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId, GpuError> {
        let texture = GpuTexture::new(
            &self.context.device,
            &self.context.queue,
            &self.layouts.texture_layout,
            self.context.max_texture_dimension,
            upload,
        )?;
        let id = TextureId::from_raw(self.next_handle());
        self.textures.insert(id, texture);
        debug!(?id, label = upload.label, width = upload.width, height = upload.height, "texture created");
        Ok(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            warn!(?texture, "release of unknown texture");
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(buffer) = self.buffers.remove(&buffer) {
            buffer.destroy();
        } else {
            warn!(?buffer, "release of unknown buffer");
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(pipeline) = self.programs.remove(&program) {
            pipeline.uniform_buffer.destroy();
        } else {
            warn!(?program, "release of unknown program");
        }
    }

    fn backing_size(&self) -> (u32, u32) {
        self.context.size()
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let applied = UniformSlot::from_index(location.raw())
            .is_some_and(|slot| self.uniforms.apply(slot, value));
        if !applied {
            debug!(?location, ?value, "uniform write ignored");
        }
    }

    fn draw_frame(&mut self, frame: &FrameDraw) -> Result<(), GpuError> {
        let program = self
            .programs
            .get(&frame.program)
            .ok_or(GpuError::UnknownHandle {
                kind: "program",
                raw: frame.program.raw(),
            })?;
        let quad = self.buffers.get(&frame.quad).ok_or(GpuError::UnknownHandle {
            kind: "buffer",
            raw: frame.quad.raw(),
        })?;
        let texture = self
            .textures
            .get(&frame.texture)
            .ok_or(GpuError::UnknownHandle {
                kind: "texture",
                raw: frame.texture.raw(),
            })?;

        let surface_texture = self
            .context
            .surface
            .get_current_texture()
            .map_err(surface_error)?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        program.write_uniforms(&self.context.queue, &self.uniforms);

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fluid frame"),
            });
        {
            let [r, g, b, a] = frame.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("fluid pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &program.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.set_vertex_buffer(0, quad.slice(..));
            render_pass.draw(0..frame.vertex_count, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}

fn surface_error(err: wgpu::SurfaceError) -> GpuError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => GpuError::SurfaceLost,
        wgpu::SurfaceError::Timeout => GpuError::SurfaceTimeout,
        wgpu::SurfaceError::OutOfMemory => GpuError::OutOfMemory,
        other => GpuError::Surface(other.to_string()),
    }
}
