//! In-place pixel filters applied to processed artwork.
//!
//! Every filter works on a tightly packed RGBA8 buffer. Writes behave like a
//! clamped byte store: the value is rounded to the nearest integer (ties to
//! even) and clamped to `0..=255`. The enhancement sequence in [`enhance`] is
//! order sensitive and must not be rearranged.

use image::RgbaImage;

const CHANNELS: usize = 4;

/// Box blur applied at the end of [`enhance`].
pub const COVER_BLUR: BoxBlur = BoxBlur::new(2, 4);

/// Applies the fixed enhancement sequence to a cover thumbnail.
pub fn enhance(image: &mut RgbaImage) {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let pixels: &mut [u8] = image;
    contrast(pixels, 0.4);
    saturate(pixels, 3.0);
    contrast(pixels, 1.7);
    brightness(pixels, 0.75);
    COVER_BLUR.apply(pixels, width, height);
}

/// Scales each colour channel's distance from mid-grey by `amount`.
pub fn contrast(pixels: &mut [u8], amount: f32) {
    for pixel in pixels.chunks_exact_mut(CHANNELS) {
        for channel in &mut pixel[..3] {
            *channel = store((f32::from(*channel) - 128.0) * amount + 128.0);
        }
    }
}

/// Pushes channels away from (or toward) the pixel's luminance.
pub fn saturate(pixels: &mut [u8], saturation: f32) {
    let keep = 1.0 - saturation;
    for pixel in pixels.chunks_exact_mut(CHANNELS) {
        let [r, g, b] = [pixel[0], pixel[1], pixel[2]].map(f32::from);
        let gray = r * 0.3 + g * 0.59 + b * 0.11;
        pixel[0] = store(gray * keep + r * saturation);
        pixel[1] = store(gray * keep + g * saturation);
        pixel[2] = store(gray * keep + b * saturation);
    }
}

/// Multiplies RGB by `factor`; alpha is left alone.
pub fn brightness(pixels: &mut [u8], factor: f32) {
    for pixel in pixels.chunks_exact_mut(CHANNELS) {
        for channel in &mut pixel[..3] {
            *channel = store(f32::from(*channel) * factor);
        }
    }
}

/// Separable moving-average blur with clamped edges.
///
/// Each pass runs a horizontal sweep into a scratch buffer of running sums,
/// then a vertical sweep over those sums back into the pixels. Repeating the
/// pass approximates a Gaussian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxBlur {
    radius: usize,
    passes: usize,
}

impl BoxBlur {
    pub const fn new(radius: usize, passes: usize) -> Self {
        Self { radius, passes }
    }

    pub fn apply(&self, pixels: &mut [u8], width: usize, height: usize) {
        if width == 0 || height == 0 || self.passes == 0 {
            return;
        }
        debug_assert_eq!(pixels.len(), width * height * CHANNELS);

        let radius = self.radius;
        let edge_weight = (radius + 1) as f32;
        let window = (2 * radius + 1) as f32;
        let scale = 1.0 / (window * window);
        let last_x = width - 1;
        let last_y = height - 1;
        let mut sums = vec![[0.0f32; CHANNELS]; width * height];

        for _ in 0..self.passes {
            for y in 0..height {
                let row = y * width;
                let mut acc = scaled(read(pixels, row), edge_weight);
                for offset in 1..=radius {
                    accumulate(&mut acc, read(pixels, row + offset.min(last_x)));
                }
                for x in 0..width {
                    sums[row + x] = acc;
                    let incoming = read(pixels, row + (x + radius + 1).min(last_x));
                    let outgoing = read(pixels, row + x.saturating_sub(radius));
                    slide(&mut acc, incoming, outgoing);
                }
            }

            for x in 0..width {
                let mut acc = scaled(sums[x], edge_weight);
                for offset in 1..=radius {
                    accumulate(&mut acc, sums[offset.min(last_y) * width + x]);
                }
                for y in 0..height {
                    let start = (y * width + x) * CHANNELS;
                    for (channel, total) in pixels[start..start + CHANNELS].iter_mut().zip(acc) {
                        *channel = (total * scale + 0.5).clamp(0.0, 255.0) as u8;
                    }
                    let incoming = sums[(y + radius + 1).min(last_y) * width + x];
                    let outgoing = sums[y.saturating_sub(radius) * width + x];
                    slide(&mut acc, incoming, outgoing);
                }
            }
        }
    }
}

fn read(pixels: &[u8], index: usize) -> [f32; CHANNELS] {
    let start = index * CHANNELS;
    std::array::from_fn(|channel| f32::from(pixels[start + channel]))
}

fn scaled(values: [f32; CHANNELS], factor: f32) -> [f32; CHANNELS] {
    values.map(|value| value * factor)
}

fn accumulate(acc: &mut [f32; CHANNELS], values: [f32; CHANNELS]) {
    for (total, value) in acc.iter_mut().zip(values) {
        *total += value;
    }
}

fn slide(acc: &mut [f32; CHANNELS], incoming: [f32; CHANNELS], outgoing: [f32; CHANNELS]) {
    for ((total, add), sub) in acc.iter_mut().zip(incoming).zip(outgoing) {
        *total += add - sub;
    }
}

#[inline]
fn store(value: f32) -> u8 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        value.round_ties_even() as u8
    }
}
