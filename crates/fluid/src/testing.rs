//! In-memory doubles for the GPU backend, drawing surface and artwork source.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::backend::{
    BufferId, FrameDraw, GpuError, ProgramId, RenderBackend, ShaderStage, TextureId,
    TextureSampling, TextureUpload, UniformLocation, UniformValue,
};
use crate::controller::DrawingSurface;
use crate::loader::{ArtworkSource, LoadError};

const UNIFORM_NAMES: [&str; 9] = [
    "u_time",
    "u_flow",
    "u_volume",
    "u_zoom",
    "u_noise",
    "u_hasImage",
    "u_resolution",
    "u_texture",
    "u_palette[0]",
];

#[derive(Debug, Clone)]
pub struct TextureRecord {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub sampling: TextureSampling,
}

/// Backend that records every call and panics on double release.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    fail_compile: bool,
    max_dimension: Option<u32>,
    textures: HashMap<TextureId, TextureRecord>,
    live_textures: BTreeSet<TextureId>,
    deleted_textures: Vec<TextureId>,
    live_buffers: BTreeSet<BufferId>,
    deleted_buffers: Vec<BufferId>,
    live_programs: BTreeSet<ProgramId>,
    deleted_programs: Vec<ProgramId>,
    uniforms: HashMap<&'static str, UniformValue>,
    backing: (u32, u32),
    pub resizes: Vec<(u32, u32)>,
    pub draws: Vec<FrameDraw>,
}

impl RecordingBackend {
    pub fn failing_compile() -> Self {
        Self {
            fail_compile: true,
            ..Self::default()
        }
    }

    /// Clamps backing allocations the way a real device limit does.
    pub fn with_max_dimension(limit: u32) -> Self {
        Self {
            max_dimension: Some(limit),
            ..Self::default()
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureRecord> {
        self.textures.get(&id)
    }

    pub fn textures_created(&self) -> usize {
        self.textures.len()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.live_textures.contains(&id)
    }

    pub fn deleted_textures(&self) -> Vec<TextureId> {
        self.deleted_textures.clone()
    }

    pub fn deleted_buffers(&self) -> &[BufferId] {
        &self.deleted_buffers
    }

    pub fn deleted_programs(&self) -> &[ProgramId] {
        &self.deleted_programs
    }

    pub fn live_objects(&self) -> usize {
        self.live_textures.len() + self.live_buffers.len() + self.live_programs.len()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn backing(&self) -> (u32, u32) {
        self.backing
    }
}

impl RenderBackend for RecordingBackend {
    fn create_program(&mut self, _vertex: &str, _fragment: &str) -> Result<ProgramId, GpuError> {
        if self.fail_compile {
            return Err(GpuError::ShaderCompile {
                stage: ShaderStage::Fragment,
                message: "forced failure".into(),
            });
        }
        let id = ProgramId::from_raw(self.next());
        self.live_programs.insert(id);
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if !self.live_programs.contains(&program) {
            return None;
        }
        UNIFORM_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| UniformLocation::from_raw(index as u64))
    }

    fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferId, GpuError> {
        assert_eq!(vertices.len(), 6, "quad is two triangles");
        let id = BufferId::from_raw(self.next());
        self.live_buffers.insert(id);
        Ok(id)
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId, GpuError> {
        let id = TextureId::from_raw(self.next());
        self.textures.insert(
            id,
            TextureRecord {
                width: upload.width,
                height: upload.height,
                pixels: upload.pixels.to_vec(),
                sampling: upload.sampling,
            },
        );
        self.live_textures.insert(id);
        Ok(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        assert!(
            self.live_textures.remove(&texture),
            "{texture:?} released twice or never created"
        );
        self.deleted_textures.push(texture);
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        assert!(
            self.live_buffers.remove(&buffer),
            "{buffer:?} released twice or never created"
        );
        self.deleted_buffers.push(buffer);
    }

    fn delete_program(&mut self, program: ProgramId) {
        assert!(
            self.live_programs.remove(&program),
            "{program:?} released twice or never created"
        );
        self.deleted_programs.push(program);
    }

    fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        let limit = self.max_dimension.unwrap_or(u32::MAX);
        self.backing = (width.min(limit), height.min(limit));
        self.resizes.push((width, height));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let name = UNIFORM_NAMES[location.raw() as usize];
        self.uniforms.insert(name, value);
    }

    fn draw_frame(&mut self, frame: &FrameDraw) -> Result<(), GpuError> {
        assert!(self.live_textures.contains(&frame.texture));
        self.draws.push(*frame);
        Ok(())
    }
}

/// Surface with a fixed logical size that counts frame requests.
#[derive(Debug, Clone)]
pub struct TestSurface {
    size: Rc<Cell<(f64, f64)>>,
    ratio: f64,
    requests: Rc<Cell<u64>>,
}

impl TestSurface {
    pub fn new(width: f64, height: f64, ratio: f64) -> Self {
        Self {
            size: Rc::new(Cell::new((width, height))),
            ratio,
            requests: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_size(&self, width: f64, height: f64) {
        self.size.set((width, height));
    }

    pub fn frame_requests(&self) -> u64 {
        self.requests.get()
    }
}

impl DrawingSurface for TestSurface {
    fn display_size(&self) -> (f64, f64) {
        self.size.get()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.ratio
    }

    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

enum Entry {
    Ready(DynamicImage),
    Gated(Receiver<()>, DynamicImage),
    Broken,
}

/// Artwork source whose results can be held back until released.
#[derive(Default)]
pub struct GatedSource {
    entries: HashMap<String, Entry>,
    fetches: AtomicUsize,
}

impl GatedSource {
    pub fn with_image(mut self, reference: &str, image: DynamicImage) -> Self {
        self.entries.insert(reference.into(), Entry::Ready(image));
        self
    }

    pub fn with_broken(mut self, reference: &str) -> Self {
        self.entries.insert(reference.into(), Entry::Broken);
        self
    }

    /// Registers an image that is only returned after the sender fires.
    pub fn gate(&mut self, reference: &str, image: DynamicImage) -> Sender<()> {
        let (tx, rx) = bounded(1);
        self.entries.insert(reference.into(), Entry::Gated(rx, image));
        tx
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ArtworkSource for GatedSource {
    fn fetch(&self, reference: &str) -> Result<DynamicImage, LoadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(reference) {
            Some(Entry::Ready(image)) => Ok(image.clone()),
            Some(Entry::Gated(gate, image)) => {
                gate.recv_timeout(Duration::from_secs(10))
                    .map_err(|err| LoadError::Worker(err.to_string()))?;
                Ok(image.clone())
            }
            Some(Entry::Broken) | None => Err(LoadError::Unsupported(reference.into())),
        }
    }
}

pub fn solid_artwork(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
}
