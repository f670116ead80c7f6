//! Standalone winit window hosting one [`FluidBackground`].

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use crate::backend::GpuError;
use crate::controller::{resolve_artwork, DrawingSurface, FluidBackground};
use crate::gpu::WgpuBackend;
use crate::loader::{ArtworkSource, DefaultArtworkSource};
use crate::types::Mood;

impl DrawingSurface for Arc<Window> {
    fn display_size(&self) -> (f64, f64) {
        let logical = self.inner_size().to_logical::<f64>(self.scale_factor());
        (logical.width, logical.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.scale_factor()
    }

    fn request_frame(&self) {
        self.request_redraw();
    }
}

/// Settings for [`run_preview`].
#[derive(Debug)]
pub struct PreviewConfig {
    pub title: String,
    pub size: (u32, u32),
    pub mood: Mood,
    pub artwork: Option<String>,
    pub fallback: Option<String>,
    pub loader_timeout: Duration,
    /// Later artwork choices; `None` items clear the artwork.
    pub artwork_feed: Option<Receiver<Option<String>>>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            title: String::from("fluidpaper"),
            size: (1280, 720),
            mood: Mood::default(),
            artwork: None,
            fallback: None,
            loader_timeout: Duration::from_secs(10),
            artwork_feed: None,
        }
    }
}

#[derive(Debug, Clone)]
enum PreviewEvent {
    Artwork(Option<String>),
}

/// The caller's current artwork choice, held until a background can take it.
#[derive(Debug, Default)]
struct ArtworkSelection {
    artwork: Option<String>,
    fallback: Option<String>,
    pending: bool,
}

impl ArtworkSelection {
    fn new(artwork: Option<String>, fallback: Option<String>) -> Self {
        Self {
            artwork,
            fallback,
            pending: true,
        }
    }

    fn set_artwork(&mut self, artwork: Option<String>) {
        self.artwork = artwork;
        self.pending = true;
    }

    /// The resolved reference to apply, once per change.
    fn take_pending(&mut self) -> Option<Option<String>> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        Some(resolve_artwork(
            self.artwork.as_deref(),
            self.fallback.as_deref(),
        ))
    }
}

/// Opens a window, mounts a background in it and runs until the window closes.
///
/// Returns `Ok(())` without drawing anything when no GPU is available.
pub fn run_preview(config: PreviewConfig) -> Result<()> {
    let PreviewConfig {
        title,
        size,
        mood,
        artwork,
        fallback,
        loader_timeout,
        artwork_feed,
    } = config;

    let event_loop = EventLoopBuilder::<PreviewEvent>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(size.0.max(1), size.1.max(1)))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let source: Arc<dyn ArtworkSource> = Arc::new(
        DefaultArtworkSource::new(loader_timeout).context("failed to build artwork loader")?,
    );

    let physical = window.inner_size();
    let Some(backend) = WgpuBackend::mount(window.as_ref(), (physical.width, physical.height))
    else {
        return Ok(());
    };
    let background = FluidBackground::new(backend, Arc::clone(&window), source, mood)
        .context("failed to initialise fluid background")?;
    let mut background = Some(background);
    info!(width = physical.width, height = physical.height, "fluid background mounted");

    if let Some(feed) = artwork_feed {
        forward_feed(feed, event_loop.create_proxy())?;
    }

    let mut selection = ArtworkSelection::new(artwork, fallback);
    if let (Some(background), Some(target)) = (background.as_mut(), selection.take_pending()) {
        background.update_artwork(target.as_deref());
    }

    event_loop
        .run(move |event, elwt| match event {
            Event::UserEvent(PreviewEvent::Artwork(artwork)) => {
                selection.set_artwork(artwork);
                if let (Some(background), Some(target)) =
                    (background.as_mut(), selection.take_pending())
                {
                    background.update_artwork(target.as_deref());
                }
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    if let Some(mut background) = background.take() {
                        background.destroy();
                    }
                    elwt.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    if let Some(background) = background.as_mut() {
                        background.handle_resize();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let Some(active) = background.as_mut() else {
                        return;
                    };
                    match active.render_frame(Instant::now()) {
                        Ok(_) => {}
                        Err(GpuError::SurfaceLost) => active.reconfigure_surface(),
                        Err(GpuError::SurfaceTimeout) => {
                            debug!("surface timeout; retrying next frame");
                        }
                        Err(GpuError::OutOfMemory) => {
                            error!("surface out of memory; closing preview");
                            if let Some(mut background) = background.take() {
                                background.destroy();
                            }
                            elwt.exit();
                        }
                        Err(err) => warn!("frame failed: {err}; retrying next frame"),
                    }
                }
                _ => {}
            },
            Event::AboutToWait => elwt.set_control_flow(ControlFlow::Wait),
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

/// Pumps artwork choices from `feed` into the event loop until either side closes.
fn forward_feed(feed: Receiver<Option<String>>, proxy: EventLoopProxy<PreviewEvent>) -> Result<()> {
    thread::Builder::new()
        .name("fluid-feed".into())
        .spawn(move || {
            for artwork in feed.iter() {
                if proxy.send_event(PreviewEvent::Artwork(artwork)).is_err() {
                    break;
                }
            }
            debug!("artwork feed closed");
        })
        .map(|_| ())
        .map_err(|err| anyhow!("failed to spawn artwork feed thread: {err}"))
}
