use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::fractal::{ColorGrid, RenderConfig};
use crate::render::RenderError;

use super::{file_stem, metadata_pairs, OutputSink};

/// Sink PNG : nom de fichier déterministe dérivé de la configuration,
/// métadonnées embarquées en chunks `tEXt` (attracteur, résolution, région,
/// bornes, chaîne de mapping). L'aplatissement RGB est parallélisé par
/// lignes.
#[derive(Clone, Debug)]
pub struct PngSink {
    directory: PathBuf,
}

impl PngSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn encode(
        &self,
        path: &Path,
        pixels: &ColorGrid,
        cfg: &RenderConfig,
    ) -> Result<(), RenderError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let mut encoder = png::Encoder::new(writer, pixels.width(), pixels.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        for (key, value) in metadata_pairs(cfg) {
            encoder.add_text_chunk(key, value)?;
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&flatten_rgb(pixels))?;
        Ok(())
    }
}

impl OutputSink for PngSink {
    fn write_still(&self, pixels: &ColorGrid, cfg: &RenderConfig) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(format!("{}.png", file_stem(cfg)));
        self.encode(&path, pixels, cfg)?;
        Ok(path)
    }

    /// Séquence en PNG : une image numérotée par trame (pour le GIF animé,
    /// voir [`super::GifSink`]).
    fn write_animation(
        &self,
        frames: &[ColorGrid],
        _frame_duration_ms: u32,
        cfg: &RenderConfig,
    ) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.directory)?;
        let stem = file_stem(cfg);
        for (i, frame) in frames.iter().enumerate() {
            let path = self.directory.join(format!("{stem}_frame_{i:04}.png"));
            self.encode(&path, frame, cfg)?;
        }
        Ok(self.directory.clone())
    }
}

/// Aplatit la grille en tampon RGB ligne par ligne, en parallèle.
fn flatten_rgb(pixels: &ColorGrid) -> Vec<u8> {
    pixels
        .data()
        .par_chunks(pixels.width() as usize)
        .flat_map_iter(|row| row.iter().flat_map(|px| px.iter().copied()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_frame, Strategy};

    #[test]
    fn test_written_png_decodes_back() {
        let cfg = RenderConfig {
            width: 24,
            height: 16,
            ..RenderConfig::default()
        };
        let pixels = render_frame(&cfg, Strategy::Batched, None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let sink = PngSink::new(dir.path());
        let path = sink.write_still(&pixels, &cfg).unwrap();

        assert_eq!(path.extension().unwrap(), "png");
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.width(), 24);
        assert_eq!(decoded.height(), 16);
        let px = pixels.get(3, 2);
        assert_eq!(decoded.get_pixel(3, 2).0, px);
    }

    #[test]
    fn test_flatten_is_row_major_rgb() {
        let grid = ColorGrid::from_data(
            2,
            1,
            vec![[1, 2, 3], [4, 5, 6]],
        );
        assert_eq!(flatten_rgb(&grid), vec![1, 2, 3, 4, 5, 6]);
    }
}
