//! Animated fluid backgrounds derived from album artwork.
//!
//! A [`FluidBackground`] owns a render backend bound to one drawing surface
//! and redraws a full-screen animated quad every frame. Artwork is fetched and
//! processed off-thread; the finished thumbnail and its corner palette are
//! swapped in at the start of the next frame.
//!
//! ```text
//!   update_artwork(url) ──▶ worker: fetch ─▶ crop ─▶ 32x32 ─▶ filters ─▶ palette
//!                                                                   │
//!                                             ArtworkResult channel ▼
//!   surface frame ──▶ render_frame() ──▶ poll results ──▶ resize ──▶ uniforms ──▶ draw
//! ```
//!
//! Only the newest request may touch render state; older results are dropped
//! when they arrive. [`gpu::WgpuBackend`] is the production backend and
//! [`window::run_preview`] hosts a background in a standalone winit window.

pub mod backend;
mod compile;
pub mod controller;
pub mod cover;
pub mod filters;
pub mod gpu;
pub mod loader;
pub mod state;
pub mod types;
pub mod window;

#[cfg(test)]
mod testing;

pub use backend::{GpuError, RenderBackend};
pub use controller::{resolve_artwork, BackgroundError, DrawingSurface, FluidBackground};
pub use cover::{prepare_artwork, PreparedArtwork};
pub use gpu::WgpuBackend;
pub use loader::{ArtworkSource, DefaultArtworkSource, LoadError};
pub use types::{FrameStatus, LoopPhase, Mood, Palette};
pub use window::{run_preview, PreviewConfig};
