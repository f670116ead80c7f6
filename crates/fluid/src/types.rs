use std::fmt;

/// Number of corner colours sampled from the artwork.
pub const PALETTE_COLORS: usize = 4;

/// Flattened length of a palette (`PALETTE_COLORS` RGB triples).
pub const PALETTE_LEN: usize = PALETTE_COLORS * 3;

/// Four RGB triples (top-left, top-right, bottom-left, bottom-right) in `[0, 1]`.
///
/// The palette feeds a secondary mesh gradient blended over the artwork in the
/// fragment shader.
#[derive(Clone, Copy, PartialEq)]
pub struct Palette([f32; PALETTE_LEN]);

impl Palette {
    /// Palette used until the first artwork has been processed.
    pub const BASE: Palette = Palette([
        0.92, 0.24, 0.46, //
        0.17, 0.24, 0.56, //
        0.08, 0.35, 0.72, //
        0.98, 0.74, 0.42,
    ]);

    pub const fn new(values: [f32; PALETTE_LEN]) -> Self {
        Self(values)
    }

    pub fn from_corners(corners: [[f32; 3]; PALETTE_COLORS]) -> Self {
        let mut values = [0.0; PALETTE_LEN];
        for (slot, corner) in values.chunks_exact_mut(3).zip(corners.iter()) {
            slot.copy_from_slice(corner);
        }
        Self(values)
    }

    pub fn values(&self) -> &[f32; PALETTE_LEN] {
        &self.0
    }

    pub fn corners(&self) -> [[f32; 3]; PALETTE_COLORS] {
        std::array::from_fn(|index| {
            let base = index * 3;
            [self.0[base], self.0[base + 1], self.0[base + 2]]
        })
    }

    /// Overwrites the palette in place.
    pub fn set(&mut self, other: &Palette) {
        self.0.copy_from_slice(&other.0);
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::BASE
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.corners()).finish()
    }
}

/// Tunable animation parameters pushed to the shader every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mood {
    /// Speed of the swirl and warp animation.
    pub flow: f32,
    /// Brightness pulse and swirl amplitude.
    pub volume: f32,
    /// Zoom blend; `0.0` zooms out, `1.0` zooms in.
    pub zoom: f32,
    /// Strength of the sampling jitter and dither noise.
    pub noise: f32,
}

impl Default for Mood {
    fn default() -> Self {
        Self {
            flow: 3.0,
            volume: 0.6,
            zoom: 1.0,
            noise: 0.0,
        }
    }
}

/// Phases of the render loop. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Uninitialized,
    Running,
    Destroyed,
}

/// Outcome of a frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was drawn and the next one scheduled.
    Drawn,
    /// The loop is not running; nothing was drawn or scheduled.
    Stopped,
}
