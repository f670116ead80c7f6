use bytemuck::{Pod, Zeroable};

use crate::backend::UniformValue;
use crate::types::{Palette, PALETTE_COLORS};

/// CPU mirror of the `FluidParams` std140 block in the fragment shader.
///
/// `vec3` array elements occupy 16 bytes each, hence the padded palette rows.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FluidUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub flow: f32,
    pub volume: f32,
    pub zoom: f32,
    pub noise: f32,
    pub has_image: f32,
    pub palette: [[f32; 4]; PALETTE_COLORS],
}

unsafe impl Zeroable for FluidUniforms {}
unsafe impl Pod for FluidUniforms {}

impl Default for FluidUniforms {
    fn default() -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.resolution = [1.0, 1.0];
        uniforms.set_palette(Palette::BASE.values());
        uniforms
    }
}

impl FluidUniforms {
    pub fn set_palette(&mut self, values: &[f32; PALETTE_COLORS * 3]) {
        for (row, rgb) in self.palette.iter_mut().zip(values.chunks_exact(3)) {
            row[..3].copy_from_slice(rgb);
            row[3] = 0.0;
        }
    }

    /// Writes `value` into `slot`. Returns `false` when the value's type does
    /// not match the slot.
    pub fn apply(&mut self, slot: UniformSlot, value: UniformValue) -> bool {
        match (slot, value) {
            (UniformSlot::Time, UniformValue::Float(v)) => self.time = v,
            (UniformSlot::Flow, UniformValue::Float(v)) => self.flow = v,
            (UniformSlot::Volume, UniformValue::Float(v)) => self.volume = v,
            (UniformSlot::Zoom, UniformValue::Float(v)) => self.zoom = v,
            (UniformSlot::Noise, UniformValue::Float(v)) => self.noise = v,
            (UniformSlot::HasImage, UniformValue::Float(v)) => self.has_image = v,
            (UniformSlot::Resolution, UniformValue::Vec2(v)) => self.resolution = v,
            (UniformSlot::Palette, UniformValue::Vec3Array4(values)) => self.set_palette(&values),
            // The cover is always bound at the single texture slot.
            (UniformSlot::Texture, UniformValue::Sampler(unit)) => return unit == 0,
            _ => return false,
        }
        true
    }
}

/// Named uniforms the fluid program exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UniformSlot {
    Time,
    Flow,
    Volume,
    Zoom,
    Noise,
    HasImage,
    Resolution,
    Texture,
    Palette,
}

impl UniformSlot {
    const ALL: [UniformSlot; 9] = [
        UniformSlot::Time,
        UniformSlot::Flow,
        UniformSlot::Volume,
        UniformSlot::Zoom,
        UniformSlot::Noise,
        UniformSlot::HasImage,
        UniformSlot::Resolution,
        UniformSlot::Texture,
        UniformSlot::Palette,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UniformSlot::Time => "u_time",
            UniformSlot::Flow => "u_flow",
            UniformSlot::Volume => "u_volume",
            UniformSlot::Zoom => "u_zoom",
            UniformSlot::Noise => "u_noise",
            UniformSlot::HasImage => "u_hasImage",
            UniformSlot::Resolution => "u_resolution",
            UniformSlot::Texture => "u_texture",
            UniformSlot::Palette => "u_palette",
        }
    }

    /// Accepts both `u_palette` and the GL-style `u_palette[0]`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_suffix("[0]").unwrap_or(name);
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }

    pub fn index(self) -> u64 {
        Self::ALL
            .iter()
            .position(|slot| *slot == self)
            .unwrap_or_default() as u64
    }

    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}
