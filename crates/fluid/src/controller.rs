//! The public lifecycle controller that owns one animated background.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::backend::{BufferId, FrameDraw, GpuError, ProgramId, RenderBackend, UniformValue};
use crate::compile::{FRAGMENT_SHADER, VERTEX_SHADER};
use crate::cover::PreparedArtwork;
use crate::loader::{spawn_load, ArtworkRequests, ArtworkResult, ArtworkSource};
use crate::state::{create_cover_texture, RenderState, UniformLocations};
use crate::types::{FrameStatus, LoopPhase, Mood};

/// Two triangles covering clip space.
const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// A window-like area the background draws into.
pub trait DrawingSurface {
    /// Size in logical units, before the device pixel ratio is applied.
    fn display_size(&self) -> (f64, f64);

    fn device_pixel_ratio(&self) -> f64;

    /// Asks the platform for one more frame callback.
    fn request_frame(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum BackgroundError {
    #[error("failed to build the fluid shader program")]
    Program(#[source] GpuError),
    #[error("failed to allocate GPU resources")]
    Resources(#[source] GpuError),
}

/// Physical backing size for a surface: `max(1, floor(display * ratio))` per axis.
pub fn backing_size_for(display: (f64, f64), ratio: f64) -> (u32, u32) {
    // `f64::max` discards NaN, so a bogus ratio still yields a 1px store.
    let scale = |value: f64| (value * ratio).floor().max(1.0).min(f64::from(u32::MAX)) as u32;
    (scale(display.0), scale(display.1))
}

/// Picks the artwork to display: `artwork` when set, otherwise `fallback`.
pub fn resolve_artwork(artwork: Option<&str>, fallback: Option<&str>) -> Option<String> {
    fn usable(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|value| !value.is_empty())
    }
    usable(artwork).or(usable(fallback)).map(str::to_owned)
}

/// Animated fluid background bound to one surface and one backend.
///
/// Construction moves the loop to [`LoopPhase::Running`] and schedules the
/// first frame. The platform then calls [`FluidBackground::render_frame`]
/// whenever the surface asks for it. Artwork is loaded off-thread and applied
/// at the start of the following frame.
pub struct FluidBackground<B: RenderBackend, S: DrawingSurface> {
    backend: B,
    surface: S,
    source: Arc<dyn ArtworkSource>,
    program: ProgramId,
    quad: BufferId,
    uniforms: UniformLocations,
    state: Option<RenderState>,
    phase: LoopPhase,
    frame_pending: bool,
    frames_drawn: u64,
    /// Last size handed to the backend; the backend may clamp what it allocates.
    backing_target: (u32, u32),
    requests: ArtworkRequests,
    results_tx: Sender<ArtworkResult>,
    results_rx: Option<Receiver<ArtworkResult>>,
}

impl<B: RenderBackend, S: DrawingSurface> FluidBackground<B, S> {
    /// Compiles the program and allocates the quad and fallback texture.
    ///
    /// Anything allocated before a failure is released again before the
    /// error is returned.
    pub fn new(
        mut backend: B,
        surface: S,
        source: Arc<dyn ArtworkSource>,
        mood: Mood,
    ) -> Result<Self, BackgroundError> {
        let program = backend
            .create_program(VERTEX_SHADER, FRAGMENT_SHADER)
            .map_err(BackgroundError::Program)?;

        let quad = match backend.create_quad(&QUAD_VERTICES) {
            Ok(quad) => quad,
            Err(err) => {
                backend.delete_program(program);
                return Err(BackgroundError::Resources(err));
            }
        };

        let uniforms = UniformLocations::resolve(&backend, program);
        let state = match RenderState::new(&mut backend, mood, Instant::now()) {
            Ok(state) => state,
            Err(err) => {
                backend.delete_buffer(quad);
                backend.delete_program(program);
                return Err(BackgroundError::Resources(err));
            }
        };

        let (results_tx, results_rx) = unbounded();
        let backing_target = backend.backing_size();
        let mut background = Self {
            backend,
            surface,
            source,
            program,
            quad,
            uniforms,
            state: Some(state),
            phase: LoopPhase::Uninitialized,
            frame_pending: false,
            frames_drawn: 0,
            backing_target,
            requests: ArtworkRequests::default(),
            results_tx,
            results_rx: Some(results_rx),
        };
        background.start();
        Ok(background)
    }

    fn start(&mut self) {
        debug_assert_eq!(self.phase, LoopPhase::Uninitialized);
        self.phase = LoopPhase::Running;
        self.sync_backing_size();
        self.schedule_frame();
        debug!(size = ?self.backend.backing_size(), "fluid background running");
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Render state, gone once the background is destroyed.
    pub fn state(&self) -> Option<&RenderState> {
        self.state.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Draws one frame and schedules the next.
    ///
    /// A backend error still schedules the next frame so the caller can
    /// recover (for example by reconfiguring a lost surface) and retry.
    pub fn render_frame(&mut self, now: Instant) -> Result<FrameStatus, GpuError> {
        if self.phase != LoopPhase::Running {
            trace!(phase = ?self.phase, "frame callback ignored");
            return Ok(FrameStatus::Stopped);
        }
        self.frame_pending = false;

        self.poll_artwork();
        self.sync_backing_size();

        let Some(state) = self.state.as_ref() else {
            return Ok(FrameStatus::Stopped);
        };
        state.push_uniforms(&mut self.backend, &self.uniforms, now);
        if let Some(location) = self.uniforms.resolution {
            let (width, height) = self.backend.backing_size();
            self.backend
                .set_uniform(location, UniformValue::Vec2([width as f32, height as f32]));
        }

        let frame = FrameDraw {
            program: self.program,
            quad: self.quad,
            texture: state.active_texture(),
            vertex_count: QUAD_VERTICES.len() as u32,
            clear_color: CLEAR_COLOR,
        };
        let drawn = self.backend.draw_frame(&frame);
        self.schedule_frame();
        drawn?;

        self.frames_drawn += 1;
        Ok(FrameStatus::Drawn)
    }

    /// Starts loading `artwork`, replacing any load still in flight.
    ///
    /// `None` or a blank reference switches back to the fallback texture
    /// immediately without touching the loader.
    pub fn update_artwork(&mut self, artwork: Option<&str>) {
        if self.phase == LoopPhase::Destroyed {
            debug!("artwork update after destroy ignored");
            return;
        }

        let request = self.requests.issue();
        let reference = match artwork.map(str::trim) {
            Some(reference) if !reference.is_empty() => reference.to_owned(),
            _ => {
                debug!(?request, "artwork cleared");
                self.reset_artwork();
                return;
            }
        };

        debug!(?request, artwork = %reference, "loading artwork");
        if let Err(err) = spawn_load(
            Arc::clone(&self.source),
            request,
            reference.clone(),
            self.results_tx.clone(),
        ) {
            warn!(artwork = %reference, error = %err, "failed to start artwork load");
            self.reset_artwork();
        }
    }

    /// Applies every finished artwork load. Returns how many were received.
    pub fn poll_artwork(&mut self) -> usize {
        let Some(results) = self.results_rx.as_ref() else {
            return 0;
        };
        let finished: Vec<ArtworkResult> = results.try_iter().collect();
        let received = finished.len();
        for result in finished {
            self.apply_result(result);
        }
        received
    }

    /// Updates flow, volume, zoom and noise from the next frame on.
    pub fn set_mood(&mut self, mood: Mood) {
        if let Some(state) = self.state.as_mut() {
            state.mood = mood;
        }
    }

    /// Re-reads the surface size right away instead of waiting for the next frame.
    pub fn handle_resize(&mut self) {
        if self.phase == LoopPhase::Running {
            self.sync_backing_size();
        }
    }

    /// Reallocates the backing store at its current size after the platform
    /// reported it lost or outdated.
    pub fn reconfigure_surface(&mut self) {
        if self.phase == LoopPhase::Running {
            let (width, height) = self.backend.backing_size();
            debug!(width, height, "reconfiguring surface");
            self.backend.resize_backing(width, height);
        }
    }

    /// Stops the loop and releases every GPU object the background owns.
    /// Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.phase == LoopPhase::Destroyed {
            return;
        }
        self.phase = LoopPhase::Destroyed;
        self.frame_pending = false;
        // Workers still running find a closed channel.
        self.results_rx = None;

        if let Some(state) = self.state.take() {
            state.release(&mut self.backend);
        }
        self.backend.delete_buffer(self.quad);
        self.backend.delete_program(self.program);
        debug!(frames = self.frames_drawn, "fluid background destroyed");
    }

    fn schedule_frame(&mut self) {
        if self.phase != LoopPhase::Running || self.frame_pending {
            return;
        }
        self.frame_pending = true;
        self.surface.request_frame();
    }

    fn sync_backing_size(&mut self) {
        let target = backing_size_for(
            self.surface.display_size(),
            self.surface.device_pixel_ratio(),
        );
        if self.backing_target != target {
            trace!(width = target.0, height = target.1, "resizing backing store");
            self.backing_target = target;
            self.backend.resize_backing(target.0, target.1);
        }
    }

    fn apply_result(&mut self, result: ArtworkResult) {
        let ArtworkResult {
            request,
            reference,
            outcome,
        } = result;
        if self.phase == LoopPhase::Destroyed {
            return;
        }
        let current = self.requests.is_current(request);

        match outcome {
            Err(err) => {
                warn!(artwork = %reference, error = %err, "failed to load artwork");
                if current {
                    self.reset_artwork();
                }
            }
            Ok(_) if !current => {
                debug!(?request, artwork = %reference, "dropping stale artwork");
            }
            Ok(None) => {
                debug!(artwork = %reference, "artwork has no pixels; using fallback");
                self.reset_artwork();
            }
            Ok(Some(prepared)) => self.install_artwork(&reference, prepared),
        }
    }

    fn install_artwork(&mut self, reference: &str, prepared: PreparedArtwork) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match create_cover_texture(&mut self.backend, &prepared.cover) {
            Ok(texture) => {
                state.install_texture(&mut self.backend, texture);
                if let Some(palette) = prepared.palette.as_ref() {
                    state.set_palette(palette);
                }
                debug!(artwork = %reference, crop = ?prepared.crop, ?texture, "artwork installed");
            }
            Err(err) => {
                warn!(artwork = %reference, error = %err, "failed to upload artwork; keeping current texture");
            }
        }
    }

    fn reset_artwork(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.reset_to_default(&mut self.backend);
        }
    }

    /// Blocks until one artwork result arrives and applies it.
    #[cfg(test)]
    pub(crate) fn wait_for_artwork(&mut self, timeout: std::time::Duration) -> bool {
        let Some(results) = self.results_rx.as_ref() else {
            return false;
        };
        match results.recv_timeout(timeout) {
            Ok(result) => {
                self.apply_result(result);
                true
            }
            Err(_) => false,
        }
    }
}

impl<B: RenderBackend, S: DrawingSurface> Drop for FluidBackground<B, S> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::{DynamicImage, Rgba, RgbaImage};

    use super::*;
    use crate::backend::WrapMode;
    use crate::testing::{solid_artwork, GatedSource, RecordingBackend, TestSurface};
    use crate::types::Palette;

    const WAIT: Duration = Duration::from_secs(10);

    type TestBackground = FluidBackground<RecordingBackend, TestSurface>;

    fn mount(source: Arc<GatedSource>, surface: &TestSurface) -> TestBackground {
        FluidBackground::new(
            RecordingBackend::default(),
            surface.clone(),
            source,
            Mood::default(),
        )
        .expect("background")
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 60, 255])
        }))
    }

    #[test]
    fn backing_size_is_floored_and_never_zero() {
        assert_eq!(backing_size_for((200.0, 100.0), 2.0), (400, 200));
        assert_eq!(backing_size_for((10.7, 3.2), 1.0), (10, 3));
        assert_eq!(backing_size_for((0.0, 0.0), 1.0), (1, 1));
        assert_eq!(backing_size_for((100.0, 100.0), f64::NAN), (1, 1));
    }

    #[test]
    fn artwork_falls_back_when_missing() {
        assert_eq!(resolve_artwork(Some("a.png"), Some("b.png")).as_deref(), Some("a.png"));
        assert_eq!(resolve_artwork(None, Some("b.png")).as_deref(), Some("b.png"));
        assert_eq!(resolve_artwork(Some("  "), Some("b.png")).as_deref(), Some("b.png"));
        assert_eq!(resolve_artwork(None, None), None);
        assert_eq!(resolve_artwork(Some(" c.png\n"), None).as_deref(), Some("c.png"));
    }

    #[test]
    fn construction_starts_the_loop() {
        let surface = TestSurface::new(200.0, 100.0, 2.0);
        let background = mount(Arc::new(GatedSource::default()), &surface);

        assert_eq!(background.phase(), LoopPhase::Running);
        assert!(background.frame_pending());
        assert_eq!(surface.frame_requests(), 1);
        assert_eq!(background.backend().resizes, vec![(400, 200)]);
    }

    #[test]
    fn compile_failure_fails_construction() {
        let backend = RecordingBackend::failing_compile();
        let surface = TestSurface::new(10.0, 10.0, 1.0);
        let result = FluidBackground::new(
            backend,
            surface.clone(),
            Arc::new(GatedSource::default()),
            Mood::default(),
        );
        assert!(matches!(result, Err(BackgroundError::Program(_))));
        assert_eq!(surface.frame_requests(), 0);
    }

    #[test]
    fn frames_draw_the_quad_and_push_uniforms() {
        let surface = TestSurface::new(200.0, 100.0, 2.0);
        let mut background = mount(Arc::new(GatedSource::default()), &surface);

        let status = background.render_frame(Instant::now()).unwrap();
        assert_eq!(status, FrameStatus::Drawn);
        assert_eq!(background.frames_drawn(), 1);
        assert_eq!(surface.frame_requests(), 2);

        let backend = background.backend();
        let frame = backend.draws.last().expect("draw");
        assert_eq!(frame.vertex_count, 6);
        assert_eq!(frame.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            Some(frame.texture),
            background.state().map(RenderState::default_texture)
        );
        assert_eq!(
            backend.uniform("u_resolution"),
            Some(UniformValue::Vec2([400.0, 200.0]))
        );
        assert_eq!(backend.uniform("u_flow"), Some(UniformValue::Float(3.0)));
        assert_eq!(
            backend.uniform("u_palette[0]"),
            Some(UniformValue::Vec3Array4(*Palette::BASE.values()))
        );
    }

    #[test]
    fn backing_store_only_reallocates_on_change() {
        let surface = TestSurface::new(200.0, 100.0, 1.5);
        let mut background = mount(Arc::new(GatedSource::default()), &surface);
        background.render_frame(Instant::now()).unwrap();
        background.render_frame(Instant::now()).unwrap();
        assert_eq!(background.backend().resizes, vec![(300, 150)]);

        surface.set_size(300.0, 100.0);
        background.handle_resize();
        background.render_frame(Instant::now()).unwrap();
        assert_eq!(background.backend().resizes, vec![(300, 150), (450, 150)]);
    }

    #[test]
    fn clamped_backing_store_is_not_reallocated_every_frame() {
        let surface = TestSurface::new(6000.0, 100.0, 1.0);
        let background = FluidBackground::new(
            RecordingBackend::with_max_dimension(4096),
            surface.clone(),
            Arc::new(GatedSource::default()),
            Mood::default(),
        );
        let mut background = background.expect("construct");
        for _ in 0..3 {
            background.render_frame(Instant::now()).unwrap();
        }
        assert_eq!(background.backend().resizes, vec![(6000, 100)]);
        assert_eq!(background.backend().backing(), (4096, 100));

        surface.set_size(5000.0, 100.0);
        background.render_frame(Instant::now()).unwrap();
        assert_eq!(background.backend().resizes, vec![(6000, 100), (5000, 100)]);
    }

    #[test]
    fn mood_changes_apply_on_the_next_frame() {
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(Arc::new(GatedSource::default()), &surface);
        background.set_mood(Mood {
            flow: 1.0,
            volume: 0.2,
            zoom: 0.0,
            noise: 0.5,
        });
        background.render_frame(Instant::now()).unwrap();

        let backend = background.backend();
        assert_eq!(backend.uniform("u_flow"), Some(UniformValue::Float(1.0)));
        assert_eq!(backend.uniform("u_zoom"), Some(UniformValue::Float(0.0)));
        assert_eq!(backend.uniform("u_noise"), Some(UniformValue::Float(0.5)));
    }

    #[test]
    fn artwork_swaps_texture_and_palette() {
        let source = Arc::new(GatedSource::default().with_image("cover.jpg", gradient(600, 400)));
        let surface = TestSurface::new(200.0, 100.0, 1.0);
        let mut background = mount(source, &surface);
        background.render_frame(Instant::now()).unwrap();
        assert_eq!(
            background.backend().uniform("u_hasImage"),
            Some(UniformValue::Float(0.0))
        );

        background.update_artwork(Some("cover.jpg"));
        assert!(background.wait_for_artwork(WAIT));

        let state = background.state().expect("state");
        assert!(state.has_image());
        assert_ne!(state.active_texture(), state.default_texture());
        assert_ne!(state.palette(), &Palette::BASE);
        assert!(state
            .palette()
            .values()
            .iter()
            .all(|value| (0.0..=1.0).contains(value)));

        let backend = background.backend();
        assert!(backend.is_live(state.default_texture()));
        let record = backend.texture(state.active_texture()).expect("cover");
        assert_eq!((record.width, record.height), (32, 32));
        assert_eq!(record.sampling.wrap, WrapMode::MirroredRepeat);
        assert!(record.sampling.mipmaps);

        let active = state.active_texture();
        let palette = *state.palette().values();
        background.render_frame(Instant::now()).unwrap();
        let backend = background.backend();
        assert_eq!(backend.draws.last().map(|frame| frame.texture), Some(active));
        assert_eq!(backend.uniform("u_hasImage"), Some(UniformValue::Float(1.0)));
        assert_eq!(
            backend.uniform("u_palette[0]"),
            Some(UniformValue::Vec3Array4(palette))
        );
    }

    #[test]
    fn finished_loads_are_applied_by_the_next_frame() {
        let source = Arc::new(GatedSource::default().with_image("a", gradient(64, 64)));
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(source, &surface);
        background.update_artwork(Some("a"));

        let deadline = Instant::now() + WAIT;
        while !background.state().expect("state").has_image() && Instant::now() < deadline {
            background.render_frame(Instant::now()).unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(background.state().expect("state").has_image());
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut source = GatedSource::default().with_image("b", solid_artwork(64, 64, [0, 0, 255, 255]));
        let release_a = source.gate("a", solid_artwork(64, 64, [255, 0, 0, 255]));
        let source = Arc::new(source);
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(Arc::clone(&source), &surface);

        background.update_artwork(Some("a"));
        background.update_artwork(Some("b"));
        assert!(background.wait_for_artwork(WAIT));

        let active = background.state().expect("state").active_texture();
        let created = background.backend().textures_created();
        let pixels = background.backend().texture(active).expect("b").pixels.clone();
        assert!(pixels[2] > pixels[0]);

        release_a.send(()).unwrap();
        assert!(background.wait_for_artwork(WAIT));

        let state = background.state().expect("state");
        assert_eq!(state.active_texture(), active);
        assert!(state.has_image());
        assert_eq!(background.backend().textures_created(), created);
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn clearing_artwork_resets_synchronously() {
        let source = Arc::new(GatedSource::default().with_image("a", gradient(40, 40)));
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(Arc::clone(&source), &surface);
        background.update_artwork(Some("a"));
        assert!(background.wait_for_artwork(WAIT));
        let cover = background.state().expect("state").active_texture();

        for cleared in [None, Some(""), Some("   ")] {
            background.update_artwork(cleared);
            let state = background.state().expect("state");
            assert!(!state.has_image());
            assert_eq!(state.active_texture(), state.default_texture());
        }
        assert_eq!(background.backend().deleted_textures(), vec![cover]);
        assert_eq!(source.fetches(), 1);
    }

    #[test]
    fn failed_loads_fall_back_to_default() {
        let source = Arc::new(
            GatedSource::default()
                .with_image("good", gradient(40, 40))
                .with_broken("bad"),
        );
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(source, &surface);

        background.update_artwork(Some("good"));
        assert!(background.wait_for_artwork(WAIT));
        background.update_artwork(Some("bad"));
        assert!(background.wait_for_artwork(WAIT));

        let state = background.state().expect("state");
        assert!(!state.has_image());
        assert_eq!(state.active_texture(), state.default_texture());
        assert_eq!(background.phase(), LoopPhase::Running);
    }

    #[test]
    fn empty_artwork_falls_back_to_default() {
        let source = Arc::new(
            GatedSource::default()
                .with_image("good", gradient(40, 40))
                .with_image("empty", DynamicImage::new_rgba8(0, 0)),
        );
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(source, &surface);

        background.update_artwork(Some("good"));
        assert!(background.wait_for_artwork(WAIT));
        background.update_artwork(Some("empty"));
        assert!(background.wait_for_artwork(WAIT));
        assert!(!background.state().expect("state").has_image());
    }

    #[test]
    fn destroy_releases_everything_once() {
        let source = Arc::new(GatedSource::default().with_image("a", gradient(40, 40)));
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(Arc::clone(&source), &surface);
        background.update_artwork(Some("a"));
        assert!(background.wait_for_artwork(WAIT));
        background.render_frame(Instant::now()).unwrap();
        let draws = background.backend().draws.len();
        let requests = surface.frame_requests();

        background.destroy();
        background.destroy();

        assert_eq!(background.phase(), LoopPhase::Destroyed);
        assert!(background.state().is_none());
        assert!(!background.frame_pending());
        let backend = background.backend();
        assert_eq!(backend.live_objects(), 0);
        assert_eq!(backend.deleted_textures().len(), 2);
        assert_eq!(backend.deleted_buffers().len(), 1);
        assert_eq!(backend.deleted_programs().len(), 1);

        assert_eq!(
            background.render_frame(Instant::now()).unwrap(),
            FrameStatus::Stopped
        );
        background.update_artwork(Some("a"));
        background.handle_resize();
        assert_eq!(background.backend().draws.len(), draws);
        assert_eq!(surface.frame_requests(), requests);
        assert_eq!(source.fetches(), 1);
    }

    #[test]
    fn loads_finishing_after_destroy_are_inert() {
        let mut source = GatedSource::default();
        let release = source.gate("slow", gradient(40, 40));
        let surface = TestSurface::new(20.0, 20.0, 1.0);
        let mut background = mount(Arc::new(source), &surface);

        background.update_artwork(Some("slow"));
        background.destroy();
        release.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(background.poll_artwork(), 0);
        assert!(!background.wait_for_artwork(Duration::from_millis(10)));
        assert_eq!(background.backend().textures_created(), 1);
    }
}
