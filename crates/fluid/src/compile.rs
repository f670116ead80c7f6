use std::borrow::Cow;

use wgpu::naga;

use crate::backend::{GpuError, ShaderStage};

/// Compiles one GLSL stage, turning validation failures into [`GpuError`]s.
///
/// wgpu reports shader errors through the device error sink, so the module
/// is created inside a validation error scope and the scope is drained
/// synchronously.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, GpuError> {
    let (label, naga_stage) = match stage {
        ShaderStage::Vertex => ("fluid vertex", naga::ShaderStage::Vertex),
        ShaderStage::Fragment => ("fluid fragment", naga::ShaderStage::Fragment),
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage: naga_stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(GpuError::ShaderCompile {
            stage,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// Full-screen quad vertex stage. `v_uv` spans `[0, 1]` across the quad.
pub(crate) const VERTEX_SHADER: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = (a_position + 1.0) * 0.5;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Fluid fragment stage.
///
/// The uniform block layout must match `FluidUniforms` in `gpu/uniforms.rs`.
/// Uniform names are mapped onto block fields with macros so the body reads
/// in terms of the public `u_*` names.
pub(crate) const FRAGMENT_SHADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FluidParams {
    vec2 _resolution;
    float _time;
    float _flow;
    float _volume;
    float _zoom;
    float _noise;
    float _hasImage;
    vec3 _palette[4];
} params;

#define u_resolution params._resolution
#define u_time params._time
#define u_flow params._flow
#define u_volume params._volume
#define u_zoom params._zoom
#define u_noise params._noise
#define u_hasImage params._hasImage
#define u_palette params._palette

layout(set = 1, binding = 0) uniform texture2D fluid_cover_texture;
layout(set = 1, binding = 1) uniform sampler fluid_cover_sampler;
#define u_texture sampler2D(fluid_cover_texture, fluid_cover_sampler)

float gradientNoise(vec2 uv) {
    vec2 k = vec2(12.9898, 78.233);
    float f = sin(dot(uv, k)) * 43758.5453;
    return fract(f);
}

mat2 rotate(float angle) {
    float s = sin(angle);
    float c = cos(angle);
    return mat2(c, -s, s, c);
}

// Procedural stand-in shown while no artwork is bound.
vec4 fallbackGradient(vec2 uv) {
    vec3 c1 = vec3(0.92, 0.24, 0.46);
    vec3 c2 = vec3(0.17, 0.24, 0.56);
    vec3 c3 = vec3(0.98, 0.74, 0.42);
    float t = smoothstep(0.0, 1.0, uv.y);
    vec3 mix1 = mix(c1, c2, t);
    float radial = smoothstep(0.0, 0.6, length(uv - 0.5));
    vec3 color = mix(mix1, c3, radial);
    return vec4(color, 1.0);
}

void main() {
    vec2 uv = v_uv;
    vec2 centered = uv - 0.5;

    float beat = sin(u_time * u_flow * 0.8) * 0.5 + 0.5;
    float swirl = sin(length(centered) * 8.0 - u_time * u_flow * 1.4) * 0.12;
    float angle = u_time * (0.1 + u_flow * 0.03) + swirl * (0.6 + u_volume * 0.8);
    centered = rotate(angle) * centered;

    float zoomFactor = mix(1.4, 0.6, u_zoom);
    centered *= zoomFactor;

    vec2 warped = centered;
    warped += 0.05 * vec2(
        sin(centered.y * 6.0 + u_time * u_flow),
        cos(centered.x * 6.0 + u_time * (u_flow * 0.7 + 2.0))
    );

    float noiseOffset = gradientNoise(centered * 8.0 + u_time * 0.3) - 0.5;
    warped += u_noise * 15.0 * noiseOffset;

    vec2 sampleUV = warped + 0.5;
    vec4 coverColor = texture(u_texture, sampleUV);

    vec4 baseColor = mix(fallbackGradient(uv), coverColor, u_hasImage);

    vec3 meshA = mix(u_palette[0], u_palette[1], clamp(sampleUV.x, 0.0, 1.0));
    vec3 meshB = mix(u_palette[2], u_palette[3], clamp(sampleUV.x, 0.0, 1.0));
    vec3 meshColor = mix(meshA, meshB, clamp(sampleUV.y, 0.0, 1.0));
    baseColor.rgb = mix(baseColor.rgb, meshColor, 0.45);

    float edgeFade = smoothstep(0.72, 0.15, length(centered));
    float volumeGlow = mix(0.6, 1.4, clamp(u_volume + beat * 0.2, 0.0, 1.2));
    vec3 color = baseColor.rgb * edgeFade * volumeGlow;

    float dither = (gradientNoise(gl_FragCoord.xy + u_time) - 0.5) * u_noise * 80.0;
    color += vec3(dither);

    float vignette = smoothstep(0.9, 0.2, length(centered));
    color *= mix(0.55, 1.1, vignette);

    outColor = vec4(color, 1.0);
}
";
