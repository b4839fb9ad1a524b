use crate::color::{to_u8, Rgba};
use crate::error::Result;
use image::RgbaImage;
use std::path::Path;

/// Minimal 2-D painting interface the flow renderer draws through
pub trait DrawingSurface {
    /// Whether the host can actually paint. A surface that reports false
    /// keeps the renderer idle.
    fn is_supported(&self) -> bool {
        true
    }

    /// Current size in pixels
    fn size(&self) -> (u32, u32);

    /// Resize to `width` x `height` pixels. Contents after a resize are
    /// the surface's background.
    fn resize(&mut self, width: u32, height: u32);

    /// Composite a solid rectangle over the surface
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);

    /// Stroke a straight line whose colour runs from `start` at `from`
    /// to `end` at `to`
    fn stroke_gradient_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, start: Rgba, end: Rgba);
}

/// Opaque in-memory RGB canvas with source-over compositing
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    background: Rgba,
    pixels: Vec<[f32; 3]>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background.rgb(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    /// Change the colour used for fresh pixels after a resize or clear
    pub fn set_background(&mut self, background: Rgba) {
        self.background = background;
    }

    /// Reset every pixel to the background
    pub fn clear(&mut self) {
        let bg = self.background.rgb();
        self.pixels.iter_mut().for_each(|p| *p = bg);
    }

    /// Pixel at (x, y), None when outside the canvas
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn pixels(&self) -> &[[f32; 3]] {
        &self.pixels
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, color: [f32; 3], alpha: f32) {
        let idx = (y * self.width + x) as usize;
        let dst = &mut self.pixels[idx];
        for c in 0..3 {
            dst[c] += (color[c] - dst[c]) * alpha;
        }
    }

    /// Flat RGBA8 bytes, row-major
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            bytes.extend_from_slice(&[to_u8(p[0]), to_u8(p[1]), to_u8(p[2]), 255]);
        }
        bytes
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixels[(y * self.width + x) as usize];
            image::Rgba([to_u8(p[0]), to_u8(p[1]), to_u8(p[2]), 255])
        })
    }

    /// Write the canvas as a PNG (format picked from the extension)
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_rgba_image().save(path)?;
        Ok(())
    }
}

impl DrawingSurface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![self.background.rgb(); width as usize * height as usize];
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if color.a <= 0.0 {
            return;
        }
        let x0 = x.max(0.0).floor() as u32;
        let y0 = y.max(0.0).floor() as u32;
        let x1 = ((x + width).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((y + height).ceil().max(0.0) as u32).min(self.height);
        let rgb = color.rgb();
        let alpha = color.a.min(1.0);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, rgb, alpha);
            }
        }
    }

    fn stroke_gradient_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, start: Rgba, end: Rgba) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;
        // Zero-length strokes with butt caps paint nothing
        if len_sq < 1e-6 || width <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }

        let half = width / 2.0;
        let reach = half + 1.0;
        let min_x = (from.0.min(to.0) - reach).floor().max(0.0) as u32;
        let min_y = (from.1.min(to.1) - reach).floor().max(0.0) as u32;
        let max_x = (from.0.max(to.0) + reach).ceil();
        let max_y = (from.1.max(to.1) + reach).ceil();
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let max_x = (max_x as u32).min(self.width);
        let max_y = (max_y as u32).min(self.height);

        for py in min_y..max_y {
            for px in min_x..max_x {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                // Projection onto the segment; butt caps end exactly at t = 0 and 1
                let t = ((cx - from.0) * dx + (cy - from.1) * dy) / len_sq;
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let (nx, ny) = (from.0 + dx * t - cx, from.1 + dy * t - cy);
                let dist = (nx * nx + ny * ny).sqrt();
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0).min(width);
                if coverage <= 0.0 {
                    continue;
                }
                let color = start.lerp(end, t);
                let alpha = color.a * coverage;
                if alpha > 0.0 {
                    self.blend(px, py, color.rgb(), alpha);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Theme;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    #[test]
    fn test_new_canvas_is_background() {
        let canvas = PixelCanvas::new(4, 3, Theme::Light.background());
        assert_eq!(canvas.pixels().len(), 12);
        assert_eq!(canvas.pixel(3, 2), Some(Theme::Light.background().rgb()));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_rect_blends_source_over() {
        let mut canvas = PixelCanvas::new(2, 2, BLACK);
        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, RED.with_alpha(0.5));
        let p = canvas.pixel(1, 1).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert_eq!(p[1], 0.0);

        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, RED.with_alpha(0.5));
        let p = canvas.pixel(0, 0).unwrap();
        assert!((p[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_fade_converges_to_fill_colour() {
        let mut canvas = PixelCanvas::new(1, 1, RED);
        for _ in 0..100 {
            canvas.fill_rect(0.0, 0.0, 1.0, 1.0, BLACK.with_alpha(0.12));
        }
        assert!(canvas.pixel(0, 0).unwrap()[0] < 0.001);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut canvas = PixelCanvas::new(3, 3, BLACK);
        canvas.fill_rect(-10.0, 2.0, 100.0, 100.0, RED);
        assert_eq!(canvas.pixel(0, 2).unwrap()[0], 1.0);
        assert_eq!(canvas.pixel(2, 2).unwrap()[0], 1.0);
        assert_eq!(canvas.pixel(0, 1).unwrap()[0], 0.0);
    }

    #[test]
    fn test_gradient_stroke_fades_along_segment() {
        let mut canvas = PixelCanvas::new(20, 5, BLACK);
        canvas.stroke_gradient_line((1.0, 2.5), (19.0, 2.5), 1.0, RED, RED.with_alpha(0.0));
        let head = canvas.pixel(2, 2).unwrap()[0];
        let middle = canvas.pixel(10, 2).unwrap()[0];
        let tail = canvas.pixel(18, 2).unwrap()[0];
        assert!(head > middle && middle > tail, "{} {} {}", head, middle, tail);
        // Off the line stays untouched
        assert_eq!(canvas.pixel(10, 0).unwrap()[0], 0.0);
    }

    #[test]
    fn test_degenerate_stroke_paints_nothing() {
        let mut canvas = PixelCanvas::new(5, 5, BLACK);
        canvas.stroke_gradient_line((2.0, 2.0), (2.0, 2.0), 3.0, RED, RED);
        assert!(canvas.pixels().iter().all(|p| p[0] == 0.0));
    }

    #[test]
    fn test_stroke_off_canvas_is_ignored() {
        let mut canvas = PixelCanvas::new(5, 5, BLACK);
        canvas.stroke_gradient_line((-40.0, -40.0), (-30.0, -35.0), 2.0, RED, RED);
        canvas.stroke_gradient_line((60.0, 60.0), (70.0, 65.0), 2.0, RED, RED);
        assert!(canvas.pixels().iter().all(|p| p[0] == 0.0));
    }

    #[test]
    fn test_resize_resets_to_background() {
        let mut canvas = PixelCanvas::new(2, 2, BLACK);
        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, RED);
        canvas.resize(3, 1);
        assert_eq!(canvas.size(), (3, 1));
        assert!(canvas.pixels().iter().all(|p| *p == BLACK.rgb()));
    }

    #[test]
    fn test_save_png() {
        let mut canvas = PixelCanvas::new(8, 6, Theme::Dark.background());
        canvas.stroke_gradient_line((0.0, 3.0), (8.0, 3.0), 2.0, RED, RED);
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        canvas.save_png(file.path()).unwrap();

        let loaded = image::open(file.path()).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (8, 6));
        assert_eq!(loaded.get_pixel(4, 3).0[0], 255);
    }
}
