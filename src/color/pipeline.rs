use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fractal::{ColorGrid, ScalarGrid};

use super::palettes::{palette_by_name, PaletteError};

/// Étape de la chaîne de mapping orbites -> couleurs.
///
/// Chaque étape est une fonction pure grille -> grille ; seule une étape de
/// palette produit une grille RGB, et seule la dernière étape de la chaîne
/// peut le faire. Syntaxe texte héritée de l'outil historique :
/// `root`, `plt <palette>`, `pltd <palette>`, `rev`, `cut <n>`, `mod <n>`,
/// `add <n>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapStep {
    /// `x -> floor(sqrt(x / max_iter) * max_iter)` — comprime le détail des
    /// orbites rapides, étale celui des orbites lentes.
    SquareRootRemap,
    /// Normalise par `max_iter` puis échantillonne la palette nommée.
    PaletteMap(String),
    /// Palette et palette inversée, pixel le plus sombre des deux
    /// (contraste local plus fort que chaque palette seule).
    PaletteDarkBlend(String),
    /// `x -> max_iter - x`.
    ReverseOrbit,
    /// `x -> x si x >= seuil, sinon 0`.
    CutOff(u32),
    /// `x -> x mod m` (effets de bandes).
    Modulo(u32),
    /// `x -> x + k` (cycle de couleurs des animations).
    Add(u32),
}

impl MapStep {
    /// Analyse la syntaxe texte d'une étape.
    pub fn parse(spec: &str) -> Result<Self, MapStepError> {
        let mut parts = spec.split_whitespace();
        let head = parts.next().unwrap_or("");
        let arg = parts.next();
        let step = match (head, arg) {
            ("root", None) => MapStep::SquareRootRemap,
            ("plt", Some(name)) => MapStep::PaletteMap(name.to_owned()),
            ("pltd", Some(name)) => MapStep::PaletteDarkBlend(name.to_owned()),
            ("rev", None) => MapStep::ReverseOrbit,
            ("cut", Some(n)) => MapStep::CutOff(parse_arg(spec, n)?),
            ("mod", Some(n)) => {
                let m = parse_arg(spec, n)?;
                if m == 0 {
                    return Err(MapStepError::BadArgument {
                        step: spec.to_owned(),
                        reason: "le modulo doit être non nul".into(),
                    });
                }
                MapStep::Modulo(m)
            }
            ("add", Some(n)) => MapStep::Add(parse_arg(spec, n)?),
            ("plt" | "pltd" | "cut" | "mod" | "add", None) => {
                return Err(MapStepError::BadArgument {
                    step: spec.to_owned(),
                    reason: "argument manquant".into(),
                })
            }
            _ => return Err(MapStepError::UnknownStep(spec.to_owned())),
        };
        if parts.next().is_some() {
            return Err(MapStepError::BadArgument {
                step: spec.to_owned(),
                reason: "trop d'arguments".into(),
            });
        }
        Ok(step)
    }

    fn apply(&self, grid: ScalarGrid, max_iter: u32) -> Result<MapOutput, PipelineError> {
        let max = max_iter.max(1);
        let out = match self {
            MapStep::SquareRootRemap => MapOutput::Scalar(grid.map_values(|x| {
                ((x as f64 / max as f64).sqrt() * max as f64).floor() as u32
            })),
            MapStep::ReverseOrbit => {
                MapOutput::Scalar(grid.map_values(|x| max.saturating_sub(x)))
            }
            MapStep::CutOff(threshold) => {
                let t = *threshold;
                MapOutput::Scalar(grid.map_values(|x| if x >= t { x } else { 0 }))
            }
            MapStep::Modulo(m) => {
                let m = (*m).max(1);
                MapOutput::Scalar(grid.map_values(|x| x % m))
            }
            MapStep::Add(k) => {
                let k = *k;
                MapOutput::Scalar(grid.map_values(|x| x.saturating_add(k)))
            }
            MapStep::PaletteMap(name) => {
                let palette = palette_by_name(name)?;
                MapOutput::Color(colorize(&grid, max, |t| palette.sample(t)))
            }
            MapStep::PaletteDarkBlend(name) => {
                let palette = palette_by_name(name)?;
                MapOutput::Color(colorize(&grid, max, |t| {
                    let fwd = palette.sample(t);
                    let rev = palette.sample_reversed(t);
                    [
                        fwd[0].min(rev[0]),
                        fwd[1].min(rev[1]),
                        fwd[2].min(rev[2]),
                    ]
                }))
            }
        };
        Ok(out)
    }
}

impl fmt::Display for MapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapStep::SquareRootRemap => f.write_str("root"),
            MapStep::PaletteMap(name) => write!(f, "plt {name}"),
            MapStep::PaletteDarkBlend(name) => write!(f, "pltd {name}"),
            MapStep::ReverseOrbit => f.write_str("rev"),
            MapStep::CutOff(n) => write!(f, "cut {n}"),
            MapStep::Modulo(n) => write!(f, "mod {n}"),
            MapStep::Add(n) => write!(f, "add {n}"),
        }
    }
}

fn parse_arg(spec: &str, raw: &str) -> Result<u32, MapStepError> {
    raw.parse().map_err(|_| MapStepError::BadArgument {
        step: spec.to_owned(),
        reason: format!("entier attendu, reçu '{raw}'"),
    })
}

fn colorize(grid: &ScalarGrid, max_iter: u32, sample: impl Fn(f64) -> [u8; 3]) -> ColorGrid {
    let data = grid
        .data()
        .iter()
        .map(|&x| sample(x as f64 / max_iter as f64))
        .collect();
    ColorGrid::from_data(grid.width(), grid.height(), data)
}

/// Tolérance des étapes inconnues : l'outil historique les ignorait avec un
/// avertissement ; le mode strict échoue à la place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PipelineMode {
    #[default]
    Permissive,
    Strict,
}

/// Analyse une liste d'étapes texte. En mode permissif les étapes inconnues
/// sont ignorées avec un avertissement sur stderr ; un argument malformé
/// d'une étape reconnue reste fatal dans les deux modes.
pub fn parse_maps(specs: &[String], mode: PipelineMode) -> Result<Vec<MapStep>, MapStepError> {
    let mut steps = Vec::with_capacity(specs.len());
    for spec in specs {
        match MapStep::parse(spec) {
            Ok(step) => steps.push(step),
            Err(MapStepError::UnknownStep(name)) if mode == PipelineMode::Permissive => {
                eprintln!("étape de mapping inconnue: '{name}', ignorée");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(steps)
}

/// Résultat de la chaîne : encore scalaire, ou RGB si la dernière étape
/// était une palette.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapOutput {
    Scalar(ScalarGrid),
    Color(ColorGrid),
}

/// Applique la chaîne d'étapes de gauche à droite.
///
/// Toute étape rencontrée après une étape de palette est une erreur : les
/// étapes scalaires n'opèrent que sur des grilles d'itérations.
pub fn apply_maps(
    grid: ScalarGrid,
    steps: &[MapStep],
    max_iter: u32,
) -> Result<MapOutput, PipelineError> {
    let mut current = MapOutput::Scalar(grid);
    for step in steps {
        match current {
            MapOutput::Scalar(g) => {
                current = step.apply(g, max_iter)?;
            }
            MapOutput::Color(_) => {
                return Err(PipelineError::MisplacedStep {
                    step: step.to_string(),
                })
            }
        }
    }
    Ok(current)
}

/// Étape texte irrecevable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapStepError {
    UnknownStep(String),
    BadArgument { step: String, reason: String },
}

impl fmt::Display for MapStepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapStepError::UnknownStep(name) => {
                write!(f, "étape de mapping inconnue: '{name}'")
            }
            MapStepError::BadArgument { step, reason } => {
                write!(f, "étape de mapping invalide '{step}': {reason}")
            }
        }
    }
}

impl std::error::Error for MapStepError {}

/// Échec à l'application de la chaîne.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Palette(PaletteError),
    /// Étape placée après une étape de palette.
    MisplacedStep { step: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Palette(e) => e.fmt(f),
            PipelineError::MisplacedStep { step } => write!(
                f,
                "étape '{step}' placée après une étape de palette (seule la dernière étape peut produire des couleurs)"
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<PaletteError> for PipelineError {
    fn from(e: PaletteError) -> Self {
        PipelineError::Palette(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: &[u32]) -> ScalarGrid {
        ScalarGrid::from_data(values.len() as u32, 1, values.to_vec())
    }

    fn scalar(out: MapOutput) -> ScalarGrid {
        match out {
            MapOutput::Scalar(g) => g,
            MapOutput::Color(_) => panic!("expected scalar output"),
        }
    }

    #[test]
    fn test_parse_legacy_syntax() {
        assert_eq!(MapStep::parse("root").unwrap(), MapStep::SquareRootRemap);
        assert_eq!(
            MapStep::parse("plt twilight").unwrap(),
            MapStep::PaletteMap("twilight".into())
        );
        assert_eq!(
            MapStep::parse("pltd bugn").unwrap(),
            MapStep::PaletteDarkBlend("bugn".into())
        );
        assert_eq!(MapStep::parse("rev").unwrap(), MapStep::ReverseOrbit);
        assert_eq!(MapStep::parse("cut 10").unwrap(), MapStep::CutOff(10));
        assert_eq!(MapStep::parse("mod 16").unwrap(), MapStep::Modulo(16));
        assert_eq!(MapStep::parse("add 3").unwrap(), MapStep::Add(3));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            MapStep::parse("b&w gray"),
            Err(MapStepError::UnknownStep(_))
        ));
        assert!(matches!(
            MapStep::parse("cut dix"),
            Err(MapStepError::BadArgument { .. })
        ));
        assert!(matches!(
            MapStep::parse("mod 0"),
            Err(MapStepError::BadArgument { .. })
        ));
        assert!(matches!(
            MapStep::parse("plt"),
            Err(MapStepError::BadArgument { .. })
        ));
    }

    #[test]
    fn test_permissive_mode_skips_unknown_steps() {
        let specs = vec!["rev".to_string(), "b&w gray".to_string(), "mod 8".to_string()];
        let steps = parse_maps(&specs, PipelineMode::Permissive).unwrap();
        assert_eq!(steps, vec![MapStep::ReverseOrbit, MapStep::Modulo(8)]);
    }

    #[test]
    fn test_strict_mode_fails_on_unknown_steps() {
        let specs = vec!["b&w gray".to_string()];
        assert!(matches!(
            parse_maps(&specs, PipelineMode::Strict),
            Err(MapStepError::UnknownStep(_))
        ));
    }

    #[test]
    fn test_modulo_is_idempotent() {
        let g = grid(&[0, 5, 16, 17, 255]);
        let once = scalar(apply_maps(g.clone(), &[MapStep::Modulo(16)], 256).unwrap());
        let twice = scalar(
            apply_maps(
                g,
                &[MapStep::Modulo(16), MapStep::Modulo(16)],
                256,
            )
            .unwrap(),
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reverse_is_an_involution() {
        let g = grid(&[0, 1, 100, 255]);
        let back = scalar(
            apply_maps(
                g.clone(),
                &[MapStep::ReverseOrbit, MapStep::ReverseOrbit],
                256,
            )
            .unwrap(),
        );
        assert_eq!(back, g);
    }

    #[test]
    fn test_cut_off_zeroes_below_threshold() {
        let g = grid(&[0, 9, 10, 11]);
        let out = scalar(apply_maps(g, &[MapStep::CutOff(10)], 256).unwrap());
        assert_eq!(out.data(), &[0, 0, 10, 11]);
    }

    #[test]
    fn test_square_root_remap_expands_slow_orbits() {
        let g = grid(&[0, 64, 255]);
        let out = scalar(apply_maps(g, &[MapStep::SquareRootRemap], 256).unwrap());
        // sqrt(64/256)*256 = 128, sqrt(255/256)*256 ~= 255.5
        assert_eq!(out.data(), &[0, 128, 255]);
    }

    #[test]
    fn test_palette_step_yields_color() {
        let g = grid(&[0, 128, 255]);
        let out = apply_maps(g, &[MapStep::PaletteMap("greys".into())], 256).unwrap();
        match out {
            MapOutput::Color(c) => {
                assert_eq!(c.get(0, 0), [255, 255, 255]);
                // 255/256 est proche du noir sans l'atteindre
                assert!(c.get(2, 0)[0] < 16);
            }
            MapOutput::Scalar(_) => panic!("expected color output"),
        }
    }

    #[test]
    fn test_dark_blend_takes_darker_channel() {
        let g = grid(&[0]);
        let out = apply_maps(g, &[MapStep::PaletteDarkBlend("greys".into())], 256).unwrap();
        match out {
            // min(blanc, noir) == noir
            MapOutput::Color(c) => assert_eq!(c.get(0, 0), [0, 0, 0]),
            MapOutput::Scalar(_) => panic!("expected color output"),
        }
    }

    #[test]
    fn test_unknown_palette_is_fatal_even_in_permissive_parse() {
        // L'étape est reconnue au parsing ; la palette manquante se révèle
        // à l'application, comme une erreur de palette et non d'étape.
        let g = grid(&[0]);
        let err = apply_maps(g, &[MapStep::PaletteMap("does_not_exist".into())], 256)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Palette(PaletteError::Unknown(_))));
    }

    #[test]
    fn test_step_after_palette_is_rejected() {
        let g = grid(&[0]);
        let err = apply_maps(
            g,
            &[MapStep::PaletteMap("greys".into()), MapStep::ReverseOrbit],
            256,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::MisplacedStep { .. }));
    }

    #[test]
    fn test_chain_without_palette_stays_scalar() {
        let g = grid(&[3, 4]);
        let out = apply_maps(g, &[MapStep::Add(1)], 256).unwrap();
        assert!(matches!(out, MapOutput::Scalar(_)));
    }
}
