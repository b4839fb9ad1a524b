use crate::color::to_u8;
use crate::surface::PixelCanvas;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Default contrast a canvas pixel needs against the background to light a dot
pub const DEFAULT_THRESHOLD: f32 = 0.035;

/// Lit cells are stretched to at least this contrast so faint trails stay visible
const MIN_DISPLAY_CONTRAST: f32 = 0.55;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy, Debug)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Largest per-channel difference from the background
fn contrast(pixel: [f32; 3], background: [f32; 3]) -> f32 {
    (0..3)
        .map(|c| (pixel[c] - background[c]).abs())
        .fold(0.0, f32::max)
}

/// Push a faint colour away from the background so it reads on a terminal
fn intensify(color: [f32; 3], background: [f32; 3]) -> Color {
    let strength = contrast(color, background);
    let gain = if strength > 0.0 {
        (MIN_DISPLAY_CONTRAST / strength).max(1.0)
    } else {
        1.0
    };
    let channel = |c: usize| to_u8(background[c] + (color[c] - background[c]) * gain);
    Color::Rgb(channel(0), channel(1), channel(2))
}

/// Render the canvas to Braille characters.
///
/// Each dot covers a block of canvas pixels; the dot is lit when the
/// block's strongest pixel differs from the background by more than
/// `threshold`. Cell colour is the average of the strongest pixels of
/// its lit dots.
pub fn render_to_braille(canvas: &PixelCanvas, canvas_cols: u16, canvas_rows: u16, threshold: f32) -> Vec<BrailleCell> {
    let mut cells = Vec::new();
    if canvas.width() == 0 || canvas.height() == 0 || canvas_cols == 0 || canvas_rows == 0 {
        return cells;
    }

    let background = canvas.background().rgb();
    let braille_width = canvas_cols as usize * 2;
    let braille_height = canvas_rows as usize * 4;

    // Canvas pixels per dot; the canvas may lag the terminal size while a
    // resize is being debounced
    let scale_x = canvas.width() as f32 / braille_width as f32;
    let scale_y = canvas.height() as f32 / braille_height as f32;

    let pixels = canvas.pixels();
    let width = canvas.width() as usize;
    let span = |start: usize, scale: f32, limit: usize| {
        let lo = ((start as f32 * scale) as usize).min(limit);
        let hi = (((start + 1) as f32 * scale).ceil() as usize).clamp(lo + 1, limit.max(lo + 1));
        (lo, hi.min(limit))
    };

    cells.reserve(canvas_cols as usize * canvas_rows as usize / 4);

    for cy in 0..canvas_rows {
        for cx in 0..canvas_cols {
            let mut pattern: u8 = 0;
            let mut total = [0.0f32; 3];
            let mut dot_count = 0usize;

            for dx in 0..2 {
                for dy in 0..4 {
                    let bx = cx as usize * 2 + dx;
                    let by = cy as usize * 4 + dy;
                    let (x0, x1) = span(bx, scale_x, canvas.width() as usize);
                    let (y0, y1) = span(by, scale_y, canvas.height() as usize);

                    let mut best = 0.0f32;
                    let mut best_pixel = background;
                    for py in y0..y1 {
                        for px in x0..x1 {
                            let pixel = pixels[py * width + px];
                            let c = contrast(pixel, background);
                            if c > best {
                                best = c;
                                best_pixel = pixel;
                            }
                        }
                    }

                    if best > threshold {
                        pattern |= BRAILLE_DOTS[dx][dy];
                        dot_count += 1;
                        for c in 0..3 {
                            total[c] += best_pixel[c];
                        }
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                let n = dot_count as f32;
                let average = [total[0] / n, total[1] / n, total[2] / n];
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color: intensify(average, background),
                });
            }
        }
    }

    cells
}

/// Canvas size in pixels for a terminal area of `canvas_cols` x
/// `canvas_rows` cells, with `scale` pixels per braille dot
pub fn calculate_surface_size(canvas_cols: u16, canvas_rows: u16, scale: u32) -> (u32, u32) {
    let scale = scale.max(1);
    (canvas_cols as u32 * 2 * scale, canvas_rows as u32 * 4 * scale)
}

/// Terminal colour of a theme background
pub fn background_color(canvas: &PixelCanvas) -> Color {
    let bg = canvas.background().rgb();
    Color::Rgb(to_u8(bg[0]), to_u8(bg[1]), to_u8(bg[2]))
}
