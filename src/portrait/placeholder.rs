//! Deterministic placeholder portrait.
//!
//! A 400×400 PNG derived only from the character's name:
//!
//! 1. radial gradient in the palette background colour, `0x88` alpha at the
//!    centre rising to opaque at radius 200;
//! 2. 50 small dots in the foreground colour at `0x22` alpha, positioned by
//!    an RNG seeded from the name;
//! 3. up to two initials in the foreground colour, centred;
//! 4. a 4 px border stroked on the rectangle (10, 10, 380, 380).
//!
//! The same name always yields the same bytes.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::glyphs::{is_inked, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::character::CharacterRecord;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const SIZE: u32 = 400;

const CENTRE: f64 = 200.0;
const GRADIENT_RADIUS: f64 = 200.0;
const CENTRE_ALPHA: u8 = 0x88;

const DOT_COUNT: usize = 50;
const DOT_MAX_RADIUS: f64 = 3.0;
const DOT_ALPHA: u8 = 0x22;

/// Size of one glyph cell in pixels; a glyph is 80×112.
const GLYPH_SCALE: u32 = 16;
/// Blank columns between two initials, in glyph cells.
const GLYPH_GAP: u32 = 1;

const BORDER_RECT: (u32, u32, u32, u32) = (10, 10, 380, 380);
const BORDER_WIDTH: u32 = 4;

/// Code unit used when the name is empty (`'U'` for "Unknown").
const EMPTY_NAME_CODE: u32 = 85;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Background / foreground colour pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: [u8; 3],
    pub foreground: [u8; 3],
}

/// Ordered palette; the index is chosen by [`palette_index`].
pub const PALETTE: [Palette; 6] = [
    // brown / gold
    Palette { background: [0x8B, 0x45, 0x13], foreground: [0xD4, 0xAF, 0x37] },
    // indigo / medium purple
    Palette { background: [0x4B, 0x00, 0x82], foreground: [0x93, 0x70, 0xDB] },
    // dark slate grey / slate grey
    Palette { background: [0x2F, 0x4F, 0x4F], foreground: [0x70, 0x80, 0x90] },
    // dark red / crimson
    Palette { background: [0x8B, 0x00, 0x00], foreground: [0xDC, 0x14, 0x3C] },
    // dark green / forest green
    Palette { background: [0x00, 0x64, 0x00], foreground: [0x22, 0x8B, 0x22] },
    // navy / royal blue
    Palette { background: [0x00, 0x00, 0x80], foreground: [0x41, 0x69, 0xE1] },
];

/// Palette slot for `name`: first UTF-16 code unit modulo the palette size.
///
/// ```
/// use character_forge::portrait::placeholder::palette_index;
///
/// assert_eq!(palette_index("Grimbold Ironforge"), 71 % 6);
/// assert_eq!(palette_index(""), 85 % 6);
/// ```
pub fn palette_index(name: &str) -> usize {
    let code = name
        .encode_utf16()
        .next()
        .map(u32::from)
        .unwrap_or(EMPTY_NAME_CODE);
    code as usize % PALETTE.len()
}

// ---------------------------------------------------------------------------
// PlaceholderError
// ---------------------------------------------------------------------------

/// Errors produced while rendering a placeholder.
#[derive(Debug, Error)]
pub enum PlaceholderError {
    #[error("failed to encode placeholder PNG: {0}")]
    Encode(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the placeholder for `name` and encode it as PNG.
pub fn render_png(name: &str) -> Result<Vec<u8>, PlaceholderError> {
    let canvas = render(name);
    let mut bytes = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Render the placeholder for `name` as a raw RGBA raster.
pub fn render(name: &str) -> RgbaImage {
    let palette = PALETTE[palette_index(name)];
    let mut canvas = RgbaImage::new(SIZE, SIZE);

    paint_gradient(&mut canvas, palette.background);
    scatter_dots(&mut canvas, palette.foreground, seed_for(name));
    draw_initials(&mut canvas, &CharacterRecord::initials_of(name), palette.foreground);
    stroke_border(&mut canvas, palette.foreground);

    canvas
}

fn paint_gradient(canvas: &mut RgbaImage, colour: [u8; 3]) {
    let span = f64::from(255 - CENTRE_ALPHA);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let dx = f64::from(x) + 0.5 - CENTRE;
        let dy = f64::from(y) + 0.5 - CENTRE;
        let t = ((dx * dx + dy * dy).sqrt() / GRADIENT_RADIUS).min(1.0);
        let alpha = f64::from(CENTRE_ALPHA) + span * t;
        *pixel = Rgba([colour[0], colour[1], colour[2], alpha.round() as u8]);
    }
}

fn scatter_dots(canvas: &mut RgbaImage, colour: [u8; 3], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let size = f64::from(SIZE);

    for _ in 0..DOT_COUNT {
        let cx = rng.gen::<f64>() * size;
        let cy = rng.gen::<f64>() * size;
        let radius = rng.gen::<f64>() * DOT_MAX_RADIUS;

        let x_min = (cx - radius).floor().max(0.0) as u32;
        let y_min = (cy - radius).floor().max(0.0) as u32;
        let x_max = ((cx + radius).ceil() as u32).min(SIZE - 1);
        let y_max = ((cy + radius).ceil() as u32).min(SIZE - 1);

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let dx = f64::from(x) + 0.5 - cx;
                let dy = f64::from(y) + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    blend_over(canvas.get_pixel_mut(x, y), colour, DOT_ALPHA);
                }
            }
        }
    }
}

fn draw_initials(canvas: &mut RgbaImage, initials: &str, colour: [u8; 3]) {
    let chars: Vec<char> = initials.chars().collect();
    if chars.is_empty() {
        return;
    }
    let count = chars.len() as u32;
    let cells_wide = count * GLYPH_WIDTH + (count - 1) * GLYPH_GAP;
    let width = cells_wide * GLYPH_SCALE;
    let height = GLYPH_HEIGHT * GLYPH_SCALE;
    let left = (SIZE - width) / 2;
    let top = (SIZE - height) / 2;

    for (i, c) in chars.into_iter().enumerate() {
        let glyph_left = left + i as u32 * (GLYPH_WIDTH + GLYPH_GAP) * GLYPH_SCALE;
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if !is_inked(c, col, row) {
                    continue;
                }
                let x0 = glyph_left + col * GLYPH_SCALE;
                let y0 = top + row * GLYPH_SCALE;
                for y in y0..y0 + GLYPH_SCALE {
                    for x in x0..x0 + GLYPH_SCALE {
                        blend_over(canvas.get_pixel_mut(x, y), colour, 255);
                    }
                }
            }
        }
    }
}

fn stroke_border(canvas: &mut RgbaImage, colour: [u8; 3]) {
    let (rx, ry, rw, rh) = BORDER_RECT;
    let half = BORDER_WIDTH / 2;
    let (outer_left, outer_top) = (rx - half, ry - half);
    let (outer_right, outer_bottom) = (rx + rw + half, ry + rh + half);
    let (inner_left, inner_top) = (rx + half, ry + half);
    let (inner_right, inner_bottom) = (rx + rw - half, ry + rh - half);

    for y in outer_top..outer_bottom {
        for x in outer_left..outer_right {
            let inside = x >= inner_left && x < inner_right && y >= inner_top && y < inner_bottom;
            if !inside {
                canvas.put_pixel(x, y, Rgba([colour[0], colour[1], colour[2], 255]));
            }
        }
    }
}

/// Source-over composite of `colour` at `alpha` onto `dst`.
fn blend_over(dst: &mut Rgba<u8>, colour: [u8; 3], alpha: u8) {
    let sa = f64::from(alpha) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mix = |src: u8, dst: u8| -> u8 {
        let v = (f64::from(src) * sa + f64::from(dst) * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(colour[0], dst[0]),
        mix(colour[1], dst[1]),
        mix(colour[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

/// 64-bit FNV-1a of the name, used to seed the dot texture.
fn seed_for(name: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    name.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_follows_first_character() {
        // 'G' = 71, 71 % 6 = 5 → navy / royal blue
        assert_eq!(PALETTE[palette_index("Grimbold Ironforge")].background, [0x00, 0x00, 0x80]);
        // 'A' = 65, 65 % 6 = 5 as well
        assert_eq!(palette_index("Aria"), palette_index("Grimbold"));
        // 'B' = 66 → slot 0, brown / gold
        assert_eq!(palette_index("Brom"), 0);
    }

    #[test]
    fn empty_name_uses_u_slot() {
        assert_eq!(palette_index(""), 1);
    }

    #[test]
    fn gradient_runs_from_translucent_centre_to_opaque_edge() {
        let mut canvas = RgbaImage::new(SIZE, SIZE);
        paint_gradient(&mut canvas, [0x8B, 0x45, 0x13]);

        let centre = canvas.get_pixel(200, 200);
        assert!(centre[3] >= CENTRE_ALPHA && centre[3] <= CENTRE_ALPHA + 2);
        assert_eq!(&centre.0[..3], &[0x8B, 0x45, 0x13]);

        assert_eq!(canvas.get_pixel(0, 0)[3], 255);
        assert_eq!(canvas.get_pixel(399, 200)[3], 255);
    }

    #[test]
    fn dots_are_deterministic_per_seed() {
        let draw = |seed| {
            let mut canvas = RgbaImage::new(SIZE, SIZE);
            paint_gradient(&mut canvas, [0, 0, 0x80]);
            scatter_dots(&mut canvas, [0x41, 0x69, 0xE1], seed);
            canvas
        };
        assert_eq!(draw(7), draw(7));
        assert_ne!(draw(7), draw(8));
    }

    #[test]
    fn initials_are_inked_at_the_expected_cell() {
        let mut canvas = RgbaImage::new(SIZE, SIZE);
        draw_initials(&mut canvas, "GI", [0xD4, 0xAF, 0x37]);
        // Two glyphs + one gap = 11 cells = 176 px wide, 112 px tall,
        // so the block starts at (112, 144).  G's top row is .###.
        assert_eq!(canvas.get_pixel(112 + 16 + 1, 144 + 1).0, [0xD4, 0xAF, 0x37, 255]);
        assert_eq!(canvas.get_pixel(112 + 1, 144 + 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn border_is_four_pixels_centred_on_the_rectangle() {
        let mut canvas = RgbaImage::new(SIZE, SIZE);
        stroke_border(&mut canvas, [1, 2, 3]);
        for x in 8..12 {
            assert_eq!(canvas.get_pixel(x, 200).0, [1, 2, 3, 255]);
        }
        assert_eq!(canvas.get_pixel(7, 200)[3], 0);
        assert_eq!(canvas.get_pixel(12, 200)[3], 0);
        assert_eq!(canvas.get_pixel(200, 391).0, [1, 2, 3, 255]);
        assert_eq!(canvas.get_pixel(200, 392)[3], 0);
    }

    #[test]
    fn blend_over_transparent_keeps_source_colour() {
        let mut px = Rgba([0, 0, 0, 0]);
        blend_over(&mut px, [10, 20, 30], DOT_ALPHA);
        assert_eq!(px.0, [10, 20, 30, DOT_ALPHA]);
    }

    #[test]
    fn blend_over_opaque_mixes_colours() {
        let mut px = Rgba([0, 0, 0, 255]);
        blend_over(&mut px, [255, 255, 255], 128);
        assert_eq!(px[3], 255);
        assert!(px[0] > 120 && px[0] < 135);
    }

    #[test]
    fn png_is_400_square_and_repeatable() {
        let first = render_png("Grimbold Ironforge").unwrap();
        let second = render_png("Grimbold Ironforge").unwrap();
        assert_eq!(first, second);

        let decoded = image::load_from_memory(&first).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (SIZE, SIZE));
    }

    #[test]
    fn different_names_give_different_images() {
        assert_ne!(render("Grimbold Ironforge"), render("Seraphina Vale"));
    }

    #[test]
    fn border_uses_foreground_colour() {
        let canvas = render("Brom");
        assert_eq!(canvas.get_pixel(10, 200).0, [0xD4, 0xAF, 0x37, 255]);
    }
}
