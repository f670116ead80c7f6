//! The seam between the background controller and a GPU implementation.
//!
//! The controller only ever talks to a [`RenderBackend`] through opaque
//! handles, so every object it creates can be enumerated and released
//! explicitly. [`crate::gpu::WgpuBackend`] is the production implementation.

use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// Linked shader program (vertex + fragment stage).
    ProgramId
);
handle!(
    /// Vertex buffer.
    BufferId
);
handle!(
    /// Sampled 2D texture.
    TextureId
);
handle!(
    /// Resolved uniform slot within a program.
    UniformLocation
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("shader compile error ({stage}): {message}")]
    ShaderCompile { stage: ShaderStage, message: String },
    #[error("program link error: {0}")]
    ProgramLink(String),
    #[error("unable to create {0}")]
    Allocation(&'static str),
    #[error("unknown {kind} handle {raw}")]
    UnknownHandle { kind: &'static str, raw: u64 },
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("surface acquisition timed out")]
    SurfaceTimeout,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinFilter {
    Linear,
    LinearMipmapLinear,
}

/// Sampling state attached to a texture at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSampling {
    pub wrap: WrapMode,
    pub min_filter: MinFilter,
    /// Generate the full mip chain from level zero.
    pub mipmaps: bool,
}

impl TextureSampling {
    /// Power-of-two textures repeat mirrored and get a mip chain; anything
    /// else clamps and filters linearly without mips.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width.is_power_of_two() && height.is_power_of_two() {
            Self {
                wrap: WrapMode::MirroredRepeat,
                min_filter: MinFilter::LinearMipmapLinear,
                mipmaps: true,
            }
        } else {
            Self {
                wrap: WrapMode::ClampToEdge,
                min_filter: MinFilter::Linear,
                mipmaps: false,
            }
        }
    }

    /// Sampling for the permanent 1x1 fallback texture.
    pub const fn fallback() -> Self {
        Self {
            wrap: WrapMode::MirroredRepeat,
            min_filter: MinFilter::Linear,
            mipmaps: false,
        }
    }
}

/// Tightly packed RGBA8 texture contents.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
    pub sampling: TextureSampling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    /// Texture unit bound to a sampler uniform.
    Sampler(u32),
    Vec3Array4([f32; 12]),
}

/// Everything a backend needs to issue one frame's draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDraw {
    pub program: ProgramId,
    pub quad: BufferId,
    pub texture: TextureId,
    pub vertex_count: u32,
    pub clear_color: [f64; 4],
}

pub trait RenderBackend {
    /// Compiles both stages and links them. Failure is fatal for the caller.
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError>;

    /// Resolves a named uniform; `None` when the program does not expose it.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferId, GpuError>;

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId, GpuError>;

    fn delete_texture(&mut self, texture: TextureId);

    fn delete_buffer(&mut self, buffer: BufferId);

    fn delete_program(&mut self, program: ProgramId);

    /// Current backing store size in physical pixels.
    fn backing_size(&self) -> (u32, u32);

    /// Reallocates the backing store. Callers only invoke this on change.
    fn resize_backing(&mut self, width: u32, height: u32);

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Clears, binds `texture` to unit 0 and draws the quad.
    fn draw_frame(&mut self, frame: &FrameDraw) -> Result<(), GpuError>;
}
