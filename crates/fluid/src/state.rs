use std::time::Instant;

use image::RgbaImage;

use crate::backend::{
    GpuError, ProgramId, RenderBackend, TextureId, TextureSampling, TextureUpload,
    UniformLocation, UniformValue,
};
use crate::types::{Mood, Palette};

/// Colour of the permanent 1x1 fallback texture.
pub const FALLBACK_PIXEL: [u8; 4] = [150, 40, 120, 255];

/// Uniform handles resolved once after the program is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocations {
    pub time: Option<UniformLocation>,
    pub flow: Option<UniformLocation>,
    pub volume: Option<UniformLocation>,
    pub zoom: Option<UniformLocation>,
    pub noise: Option<UniformLocation>,
    pub has_image: Option<UniformLocation>,
    pub resolution: Option<UniformLocation>,
    pub texture: Option<UniformLocation>,
    pub palette: Option<UniformLocation>,
}

impl UniformLocations {
    pub fn resolve<B: RenderBackend + ?Sized>(backend: &B, program: ProgramId) -> Self {
        let find = |name: &str| backend.uniform_location(program, name);
        Self {
            time: find("u_time"),
            flow: find("u_flow"),
            volume: find("u_volume"),
            zoom: find("u_zoom"),
            noise: find("u_noise"),
            has_image: find("u_hasImage"),
            resolution: find("u_resolution"),
            texture: find("u_texture"),
            palette: find("u_palette[0]"),
        }
    }
}

/// Mutable per-controller render state.
///
/// Owns the fallback texture and at most one artwork texture. Swapping the
/// active texture always releases the previous non-fallback one first.
#[derive(Debug)]
pub struct RenderState {
    pub mood: Mood,
    has_image: bool,
    start_time: Instant,
    active_texture: TextureId,
    default_texture: TextureId,
    palette: Palette,
}

impl RenderState {
    /// Creates the fallback texture and makes it active.
    pub fn new<B: RenderBackend + ?Sized>(
        backend: &mut B,
        mood: Mood,
        start_time: Instant,
    ) -> Result<Self, GpuError> {
        let default_texture = backend.create_texture(&TextureUpload {
            label: "fallback texture",
            width: 1,
            height: 1,
            pixels: &FALLBACK_PIXEL,
            sampling: TextureSampling::fallback(),
        })?;
        Ok(Self {
            mood,
            has_image: false,
            start_time,
            active_texture: default_texture,
            default_texture,
            palette: Palette::BASE,
        })
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn active_texture(&self) -> TextureId {
        self.active_texture
    }

    pub fn default_texture(&self) -> TextureId {
        self.default_texture
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: &Palette) {
        self.palette.set(palette);
    }

    /// Seconds since the state was created.
    pub fn elapsed(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start_time).as_secs_f32()
    }

    /// Makes `texture` the active artwork texture.
    pub fn install_texture<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, texture: TextureId) {
        self.release_artwork_texture(backend);
        self.active_texture = texture;
        self.has_image = true;
    }

    /// Falls back to the 1x1 texture and procedural gradient.
    pub fn reset_to_default<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.release_artwork_texture(backend);
        self.active_texture = self.default_texture;
        self.has_image = false;
    }

    /// Releases every texture the state owns. Consumes the state so nothing
    /// can be released twice.
    pub fn release<B: RenderBackend + ?Sized>(mut self, backend: &mut B) {
        self.release_artwork_texture(backend);
        backend.delete_texture(self.default_texture);
    }

    /// Pushes the per-frame uniforms (everything except resolution).
    pub fn push_uniforms<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        locations: &UniformLocations,
        now: Instant,
    ) {
        let has_image = if self.has_image { 1.0 } else { 0.0 };
        let values = [
            (locations.time, UniformValue::Float(self.elapsed(now))),
            (locations.flow, UniformValue::Float(self.mood.flow)),
            (locations.volume, UniformValue::Float(self.mood.volume)),
            (locations.zoom, UniformValue::Float(self.mood.zoom)),
            (locations.noise, UniformValue::Float(self.mood.noise)),
            (locations.has_image, UniformValue::Float(has_image)),
            (locations.texture, UniformValue::Sampler(0)),
            (locations.palette, UniformValue::Vec3Array4(*self.palette.values())),
        ];
        for (location, value) in values {
            if let Some(location) = location {
                backend.set_uniform(location, value);
            }
        }
    }

    fn release_artwork_texture<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.active_texture != self.default_texture {
            backend.delete_texture(self.active_texture);
            self.active_texture = self.default_texture;
        }
    }
}

/// Uploads a processed cover with the power-of-two sampling policy.
pub fn create_cover_texture<B: RenderBackend + ?Sized>(
    backend: &mut B,
    cover: &RgbaImage,
) -> Result<TextureId, GpuError> {
    let (width, height) = cover.dimensions();
    backend.create_texture(&TextureUpload {
        label: "cover texture",
        width,
        height,
        pixels: cover.as_raw(),
        sampling: TextureSampling::for_dimensions(width, height),
    })
}
