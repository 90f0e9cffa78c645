pub mod gif;
pub mod png;

pub use gif::GifSink;
pub use png::PngSink;

use std::path::PathBuf;

use crate::fractal::{ColorGrid, RenderConfig};
use crate::render::RenderError;

/// Sink de sortie : écrit une image ou une séquence d'images et retourne
/// l'emplacement du fichier produit. Deux implémentations concrètes (PNG et
/// GIF) choisies par configuration, pas par héritage.
pub trait OutputSink {
    fn write_still(&self, pixels: &ColorGrid, cfg: &RenderConfig) -> Result<PathBuf, RenderError>;

    fn write_animation(
        &self,
        frames: &[ColorGrid],
        frame_duration_ms: u32,
        cfg: &RenderConfig,
    ) -> Result<PathBuf, RenderError>;
}

/// Nom de fichier déterministe (sans extension) dérivé de la configuration :
/// `julia_<expr>_c=<const>[_a=..][_b=..][_c=..]_res_<WxH>_ran_<bornes>`
/// `_iter_<n>_mag_<m>_map_<étapes>`, caractères interdits remplacés par `_`.
pub fn file_stem(cfg: &RenderConfig) -> String {
    let spec = &cfg.attractor;
    let mut stem = format!("julia_{}_c={}", spec.expression, spec.constant);
    if spec.a.norm() != 0.0 {
        stem.push_str(&format!("_a={}", spec.a));
    }
    if spec.b.norm() != 0.0 {
        stem.push_str(&format!("_b={}", spec.b));
    }
    if spec.c.norm() != 0.0 {
        stem.push_str(&format!("_c={}", spec.c));
    }
    stem.push_str(&format!("_res_{}x{}", cfg.width, cfg.height));
    stem.push_str(&format!(
        "_ran_{}_{}_{}_{}",
        cfg.region.re_min, cfg.region.re_max, cfg.region.im_min, cfg.region.im_max
    ));
    stem.push_str(&format!("_iter_{}", cfg.max_iterations));
    stem.push_str(&format!("_mag_{}", cfg.max_magnitude));
    stem.push_str(&format!("_map_{}", maps_label(cfg)));
    sanitize(&stem)
}

/// Paires clé/valeur embarquées dans les métadonnées du fichier.
pub fn metadata_pairs(cfg: &RenderConfig) -> Vec<(String, String)> {
    let spec = &cfg.attractor;
    vec![
        (
            "ATRACTOR".into(),
            format!(
                "{}, const={}, a={}, b={}, c={}",
                spec.expression, spec.constant, spec.a, spec.b, spec.c
            ),
        ),
        ("RESOLUTION".into(), format!("{}x{}", cfg.width, cfg.height)),
        (
            "RANGE".into(),
            format!(
                "{} {} {} {}",
                cfg.region.re_min, cfg.region.re_max, cfg.region.im_min, cfg.region.im_max
            ),
        ),
        ("MAX_ITERATIONS".into(), cfg.max_iterations.to_string()),
        ("MAX_MAGNITUDE".into(), cfg.max_magnitude.to_string()),
        ("MAPPING".into(), maps_label(cfg)),
    ]
}

fn maps_label(cfg: &RenderConfig) -> String {
    if cfg.maps.is_empty() {
        return "none".into();
    }
    cfg.maps
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("_")
}

/// Remplace les caractères interdits dans les noms de fichiers (et les
/// espaces) par `_`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '~' | '\\' | '/' | ':' | '"' | '*' | '?' | '<' | '>' | '|' | ' ' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::MapStep;
    use crate::fractal::{AttractorSpec, PlaneRegion};
    use num_complex::Complex64;

    fn config() -> RenderConfig {
        RenderConfig {
            width: 100,
            height: 100,
            max_iterations: 256,
            max_magnitude: 2.0,
            region: PlaneRegion::new(-2.0, 2.0, -2.0, 2.0).unwrap(),
            attractor: AttractorSpec::new("z**2 + const")
                .with_constant(Complex64::new(-0.8, 0.156)),
            maps: vec![MapStep::PaletteMap("twilight".into())],
            color_shift: 0,
        }
    }

    #[test]
    fn test_file_stem_is_deterministic() {
        assert_eq!(file_stem(&config()), file_stem(&config()));
    }

    #[test]
    fn test_file_stem_has_no_forbidden_characters() {
        let stem = file_stem(&config());
        for forbidden in ['~', '\\', '/', ':', '"', '*', '?', '<', '>', '|', ' '] {
            assert!(!stem.contains(forbidden), "'{forbidden}' dans {stem}");
        }
    }

    #[test]
    fn test_file_stem_carries_all_parameters() {
        let stem = file_stem(&config());
        assert!(stem.starts_with("julia_"));
        assert!(stem.contains("_res_100x100"));
        assert!(stem.contains("_iter_256"));
        assert!(stem.contains("_mag_2"));
        assert!(stem.contains("_map_plt_twilight"));
    }

    #[test]
    fn test_unset_constants_are_omitted_from_stem() {
        let stem = file_stem(&config());
        assert!(!stem.contains("_a="));
        let mut cfg = config();
        cfg.attractor.a = Complex64::new(0.1, 0.0);
        assert!(file_stem(&cfg).contains("_a="));
    }

    #[test]
    fn test_metadata_lists_every_field() {
        let pairs = metadata_pairs(&config());
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "ATRACTOR",
                "RESOLUTION",
                "RANGE",
                "MAX_ITERATIONS",
                "MAX_MAGNITUDE",
                "MAPPING"
            ]
        );
    }
}
