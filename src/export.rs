use crate::error::{FlowError, Result};
use crate::surface::PixelCanvas;
use gif::{Encoder, Frame, Repeat};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Quantizer speed passed to the GIF encoder (1 = best, 30 = fastest)
const QUANTIZE_SPEED: i32 = 10;

/// Streams canvas snapshots into a looping animated GIF
pub struct GifRecorder {
    encoder: Encoder<BufWriter<File>>,
    width: u16,
    height: u16,
    delay_cs: u16,
    frames: usize,
}

impl GifRecorder {
    /// Create `path` for a `width` x `height` animation with `delay_cs`
    /// hundredths of a second between frames
    pub fn create(path: &Path, width: u32, height: u32, delay_cs: u16) -> Result<Self> {
        let (width, height) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(FlowError::Config(format!(
                    "GIF size {}x{} must be between 1 and 65535 pixels",
                    width, height
                )))
            }
        };
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = Encoder::new(file, width, height, &[])?;
        encoder.set_repeat(Repeat::Infinite)?;
        Ok(Self {
            encoder,
            width,
            height,
            delay_cs,
            frames: 0,
        })
    }

    /// Append the canvas as the next frame. The canvas must still have the
    /// size the recorder was created with.
    pub fn push_frame(&mut self, canvas: &PixelCanvas) -> Result<()> {
        if canvas.width() != self.width as u32 || canvas.height() != self.height as u32 {
            return Err(FlowError::Config(format!(
                "frame is {}x{}, recording is {}x{}",
                canvas.width(),
                canvas.height(),
                self.width,
                self.height
            )));
        }
        let mut rgba = canvas.to_rgba_bytes();
        let mut frame = Frame::from_rgba_speed(self.width, self.height, &mut rgba, QUANTIZE_SPEED);
        frame.delay = self.delay_cs;
        self.encoder.write_frame(&frame)?;
        self.frames += 1;
        Ok(())
    }

    /// Flush everything to disk and return the number of frames written
    pub fn finish(self) -> Result<usize> {
        let frames = self.frames;
        let mut writer = self.encoder.into_inner()?;
        std::io::Write::flush(&mut writer)?;
        Ok(frames)
    }
}
