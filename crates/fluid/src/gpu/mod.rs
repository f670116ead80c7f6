//! wgpu implementation of the render backend.
//!
//! - `context` owns the instance, surface and device and reconfigures the
//!   swapchain when the backing store changes size.
//! - `pipeline` links the GLSL stages into a render pipeline with two bind
//!   groups: the uniform block and the cover texture.
//! - `uniforms` mirrors the fragment shader's uniform block.
//! - `textures` uploads RGBA covers, generating mip chains on the CPU.
//! - `state` glues everything together behind [`WgpuBackend`].

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub use state::WgpuBackend;
