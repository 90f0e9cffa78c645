use crate::color::{apply_maps, MapOutput};
use crate::formula::Formula;
use crate::fractal::{ColorGrid, RenderConfig, ScalarGrid};
use crate::progress::ProgressSink;

use super::escape_time::{escape_grid, Strategy};
use super::RenderError;

/// Résultat détaillé d'un rendu : la grille d'orbites (pour l'histogramme
/// et les diagnostics) et la grille de pixels finale.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub orbits: ScalarGrid,
    pub pixels: ColorGrid,
}

/// Rend une image pour un instantané de paramètres : validation, compilation
/// de la formule, grille de coordonnées, orbites d'échappement, décalage de
/// couleur éventuel, chaîne de mapping. Aucune entrée/sortie ici —
/// l'écriture des fichiers appartient aux sinks de `io`.
pub fn render_frame(
    cfg: &RenderConfig,
    strategy: Strategy,
    progress: Option<&mut dyn ProgressSink>,
) -> Result<ColorGrid, RenderError> {
    Ok(render_frame_detailed(cfg, strategy, progress)?.pixels)
}

pub fn render_frame_detailed(
    cfg: &RenderConfig,
    strategy: Strategy,
    progress: Option<&mut dyn ProgressSink>,
) -> Result<RenderedFrame, RenderError> {
    // Échoue avant toute allocation de grille.
    cfg.validate()?;
    let formula = Formula::compile(&cfg.attractor.expression)?;

    let mut orbits = escape_grid(&formula, cfg, strategy, progress);

    // Cycle de couleurs des animations : décalage modulaire des orbites
    // avant la chaîne de mapping.
    if cfg.color_shift != 0 {
        let max = cfg.max_iterations;
        let shift = cfg.color_shift % max;
        orbits = orbits.map_values(|x| (x + shift) % max);
    }

    let pixels = match apply_maps(orbits.clone(), &cfg.maps, cfg.max_iterations)? {
        MapOutput::Color(color) => color,
        // Chaîne sans étape de palette : expansion explicite en niveaux de
        // gris, jamais de réinterprétation silencieuse en RGB.
        MapOutput::Scalar(scalar) => grayscale(&scalar, cfg.max_iterations),
    };

    Ok(RenderedFrame { orbits, pixels })
}

fn grayscale(grid: &ScalarGrid, max_iter: u32) -> ColorGrid {
    let denom = max_iter.saturating_sub(1).max(1);
    let data = grid
        .data()
        .iter()
        .map(|&x| {
            let v = (x.min(denom) as f64 / denom as f64 * 255.0).round() as u8;
            [v, v, v]
        })
        .collect();
    ColorGrid::from_data(grid.width(), grid.height(), data)
}
