use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageError, RgbaImage};

use crate::fractal::{ColorGrid, RenderConfig};
use crate::render::RenderError;

use super::{file_stem, OutputSink};

/// Sink GIF : assemble la séquence d'images en GIF bouclant à l'infini avec
/// une durée de trame uniforme.
#[derive(Clone, Debug)]
pub struct GifSink {
    directory: PathBuf,
}

impl GifSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl OutputSink for GifSink {
    /// Image seule : GIF à une trame.
    fn write_still(&self, pixels: &ColorGrid, cfg: &RenderConfig) -> Result<PathBuf, RenderError> {
        self.write_animation(std::slice::from_ref(pixels), 100, cfg)
    }

    fn write_animation(
        &self,
        frames: &[ColorGrid],
        frame_duration_ms: u32,
        cfg: &RenderConfig,
    ) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(format!("{}.gif", file_stem(cfg)));

        let file = File::create(&path)?;
        let mut encoder = GifEncoder::new(file);
        encoder.set_repeat(Repeat::Infinite)?;

        let delay = Delay::from_numer_denom_ms(frame_duration_ms.max(1), 1);
        for grid in frames {
            let rgba = rgba_image(grid)?;
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        }

        Ok(path)
    }
}

fn rgba_image(grid: &ColorGrid) -> Result<RgbaImage, RenderError> {
    let mut buffer = Vec::with_capacity(grid.data().len() * 4);
    for px in grid.data() {
        buffer.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    RgbaImage::from_raw(grid.width(), grid.height(), buffer)
        .ok_or_else(|| {
            RenderError::Image(ImageError::from(std::io::Error::new(
                ErrorKind::InvalidData,
                "impossible de créer l'image depuis le tampon",
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_frame, Strategy};

    #[test]
    fn test_written_gif_has_gif_signature() {
        let cfg = RenderConfig {
            width: 12,
            height: 12,
            ..RenderConfig::default()
        };
        let frame = render_frame(&cfg, Strategy::Batched, None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let sink = GifSink::new(dir.path());
        let path = sink
            .write_animation(&[frame.clone(), frame], 50, &cfg)
            .unwrap();

        assert_eq!(path.extension().unwrap(), "gif");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF8"));
    }
}
