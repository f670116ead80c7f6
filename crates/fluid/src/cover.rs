//! Turns arbitrary artwork into the small square thumbnail and corner palette
//! consumed by the GPU renderer.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::filters;
use crate::types::Palette;

/// Edge length of the processed cover thumbnail.
pub const COVER_SIZE: u32 = 32;

/// Normalised sample points, inset from each corner to dodge edge artifacts.
/// Order: top-left, top-right, bottom-left, bottom-right.
const PALETTE_SAMPLES: [(f32, f32); 4] = [(0.1, 0.9), (0.9, 0.9), (0.1, 0.1), (0.9, 0.1)];

/// Centred square taken from the source artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl CropRegion {
    /// Largest centred square of a `width`x`height` image, or `None` when the
    /// image is empty.
    pub fn centered(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let side = width.min(height);
        Some(Self {
            x: (width - side) / 2,
            y: (height - side) / 2,
            side,
        })
    }
}

/// Processed thumbnail plus the palette sampled from it.
#[derive(Debug, Clone)]
pub struct PreparedArtwork {
    pub cover: RgbaImage,
    pub palette: Option<Palette>,
    pub crop: CropRegion,
}

/// Full CPU side of an artwork swap: crop, downscale, filter, sample.
pub fn prepare_artwork(source: &DynamicImage) -> Option<PreparedArtwork> {
    let (cover, crop) = process_cover(source)?;
    let palette = extract_palette(&cover);
    Some(PreparedArtwork {
        cover,
        palette,
        crop,
    })
}

/// Crops the centred square, scales it to [`COVER_SIZE`] and applies the
/// enhancement filters. Returns `None` for zero-sized sources.
pub fn process_cover(source: &DynamicImage) -> Option<(RgbaImage, CropRegion)> {
    let (width, height) = source.dimensions();
    let crop = CropRegion::centered(width, height)?;

    let square = source.crop_imm(crop.x, crop.y, crop.side, crop.side).to_rgba8();
    let mut cover = imageops::resize(&square, COVER_SIZE, COVER_SIZE, FilterType::Triangle);
    filters::enhance(&mut cover);
    Some((cover, crop))
}

/// Samples the four inset corner colours of a processed cover.
pub fn extract_palette(cover: &RgbaImage) -> Option<Palette> {
    let (width, height) = cover.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let sample = |u: f32, v: f32| -> [f32; 3] {
        let x = ((u * (width - 1) as f32).floor() as u32).min(width - 1);
        let y = ((v * (height - 1) as f32).floor() as u32).min(height - 1);
        let pixel = cover.get_pixel(x, y).0;
        [pixel[0], pixel[1], pixel[2]].map(|channel| f32::from(channel) / 255.0)
    };

    Some(Palette::from_corners(
        PALETTE_SAMPLES.map(|(u, v)| sample(u, v)),
    ))
}
