use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fractal::{ColorGrid, ConfigError, PlaneRegion, RenderConfig};
use crate::progress::ProgressSink;

use super::frame::render_frame;
use super::{RenderError, Strategy};

/// Piste de paramètre : fait varier un champ de la configuration d'une image
/// à l'autre selon une stratégie d'interpolation nommée.
///
/// Chaque stratégie est une fonction pure de `(i, frames_amount, paramètres
/// de piste)` — aucun état caché entre les images. La piste s'applique sur
/// un clone de la configuration de base, jamais sur la base elle-même.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParameterTrack {
    /// Interpolation linéaire de la constante entre deux valeurs.
    ConstLinear { from: Complex64, to: Complex64 },
    /// Constante entraînée sur un cercle : `base * exp(2πi·i/frames)`.
    /// Le tour n'est volontairement pas bouclé : la dernière image n'égale
    /// pas la première (la phase `2π` n'est atteinte qu'à l'indice
    /// hypothétique `frames`).
    ConstCircle { base: Complex64 },
    /// Parcours en boucle fermée d'une liste de constantes : les images sont
    /// partagées en segments égaux, interpolation linéaire du point `k` vers
    /// le point `(k+1) mod K`.
    ConstWaypoints { points: Vec<Complex64> },
    /// Interpolation linéaire des quatre bornes de la région.
    RegionLinear { to: PlaneRegion },
    /// Zoom à pas logarithmiques : poids `base^(j/(N-1))` normalisés à somme
    /// 1 puis inversés (grands pas d'abord), appliqués cumulativement à
    /// chaque borne indépendamment — la vitesse de zoom perçue reste
    /// constante malgré le changement d'échelle exponentiel.
    ZoomLog { to: PlaneRegion, base: f64 },
    /// Plafond d'itérations croissant, espacement linéaire ou logarithmique
    /// (l'espacement log détaille mieux les premières valeurs).
    IterationRamp { from: u32, to: u32, log_spread: bool },
    /// Décalage de couleur `floor(i·max_iter/frames)`, le cycle complet sur
    /// la durée de l'animation.
    ColorCycle,
}

impl ParameterTrack {
    /// Applique la valeur de la piste à l'image `i` sur un clone de la
    /// configuration de base.
    pub fn apply(&self, cfg: &mut RenderConfig, i: u32, frames_amount: u32) {
        match self {
            ParameterTrack::ConstLinear { from, to } => {
                cfg.attractor.constant = lerp_complex(*from, *to, unit_pos(i, frames_amount));
            }
            ParameterTrack::ConstCircle { base } => {
                cfg.attractor.constant = circle_value(*base, i, frames_amount);
            }
            ParameterTrack::ConstWaypoints { points } => {
                if let Some(value) = waypoint_value(points, i, frames_amount) {
                    cfg.attractor.constant = value;
                }
            }
            ParameterTrack::RegionLinear { to } => {
                let t = unit_pos(i, frames_amount);
                cfg.region = lerp_region(&cfg.region, to, t);
            }
            ParameterTrack::ZoomLog { to, base } => {
                let t = zoom_progress(i, frames_amount, *base);
                cfg.region = lerp_region(&cfg.region, to, t);
            }
            ParameterTrack::IterationRamp {
                from,
                to,
                log_spread,
            } => {
                cfg.max_iterations = iteration_cap(*from, *to, *log_spread, i, frames_amount);
            }
            ParameterTrack::ColorCycle => {
                cfg.color_shift = (i as u64 * cfg.max_iterations as u64
                    / frames_amount.max(1) as u64) as u32;
            }
        }
    }
}

/// Position normalisée de l'image `i` dans `[0, 1]`, dernière image incluse.
fn unit_pos(i: u32, frames_amount: u32) -> f64 {
    if frames_amount <= 1 {
        0.0
    } else {
        i as f64 / (frames_amount - 1) as f64
    }
}

fn lerp_complex(from: Complex64, to: Complex64, t: f64) -> Complex64 {
    from + (to - from) * t
}

fn lerp_region(from: &PlaneRegion, to: &PlaneRegion, t: f64) -> PlaneRegion {
    PlaneRegion {
        re_min: from.re_min + (to.re_min - from.re_min) * t,
        re_max: from.re_max + (to.re_max - from.re_max) * t,
        im_min: from.im_min + (to.im_min - from.im_min) * t,
        im_max: from.im_max + (to.im_max - from.im_max) * t,
    }
}

/// Valeur de la piste circulaire à l'image `i` : phase `2π·i/frames_amount`.
pub fn circle_value(base: Complex64, i: u32, frames_amount: u32) -> Complex64 {
    let phase = std::f64::consts::TAU * i as f64 / frames_amount.max(1) as f64;
    base * Complex64::new(0.0, phase).exp()
}

/// Valeur de la piste par points de passage (None si la liste est vide).
pub fn waypoint_value(points: &[Complex64], i: u32, frames_amount: u32) -> Option<Complex64> {
    if points.is_empty() {
        return None;
    }
    if points.len() == 1 {
        return Some(points[0]);
    }
    let segments = points.len() as u32;
    let seg_len = (frames_amount / segments).max(1);
    let k = (i / seg_len).min(segments - 1) as usize;
    let within = (i - k as u32 * seg_len) as f64 / seg_len as f64;
    let next = (k + 1) % points.len();
    Some(lerp_complex(points[k], points[next], within))
}

/// Fraction cumulée du trajet de zoom parcourue à l'image `i` (1.0 à la
/// dernière image) : somme préfixe des poids logarithmiques normalisés,
/// grands pas en premier.
pub fn zoom_progress(i: u32, frames_amount: u32, base: f64) -> f64 {
    let n = frames_amount.max(1);
    if n == 1 {
        return 1.0;
    }
    let weight = |j: u32| base.powf(j as f64 / (n - 1) as f64);
    let total: f64 = (0..n).map(weight).sum();
    // poids inversés : le pas de l'image j est weight(n - 1 - j)
    let prefix: f64 = (0..=i.min(n - 1)).map(|j| weight(n - 1 - j)).sum();
    (prefix / total).min(1.0)
}

fn iteration_cap(from: u32, to: u32, log_spread: bool, i: u32, frames_amount: u32) -> u32 {
    let n = frames_amount.max(1);
    if log_spread {
        // exposants répartis linéairement entre log2(from) et log2(to),
        // borne haute exclue (comme logspace(..., endpoint=False))
        let start = (from.max(1) as f64).log2();
        let end = (to.max(1) as f64).log2();
        let exp = start + (end - start) * i as f64 / n as f64;
        (exp.exp2().floor() as u32).max(1)
    } else {
        let t = unit_pos(i, n);
        ((from as f64 + (to as f64 - from as f64) * t).round() as u32).max(1)
    }
}

/// Description d'une animation : nombre d'images, durée d'une image, rendu
/// de base et pistes de paramètres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub frames_amount: u32,
    pub frame_duration_ms: u32,
    pub base: RenderConfig,
    pub tracks: Vec<ParameterTrack>,
}

impl AnimationSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_amount == 0 {
            return Err(ConfigError::ZeroFrameCount);
        }
        self.base.validate()
    }

    /// Configuration concrète de l'image `i` : clone de la base, pistes
    /// appliquées dans l'ordre.
    pub fn config_for_frame(&self, i: u32) -> RenderConfig {
        let mut cfg = self.base.clone();
        for track in &self.tracks {
            track.apply(&mut cfg, i, self.frames_amount);
        }
        cfg
    }
}

/// Génère la séquence d'images, séquentiellement, avec progression
/// monotone : un appel par image terminée et un appel final
/// `(total, total)` avant de retourner.
pub fn generate(
    spec: &AnimationSpec,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<Vec<ColorGrid>, RenderError> {
    spec.validate()?;
    let label = format!("attracteur: {}", spec.base.attractor.expression);
    let mut frames = Vec::with_capacity(spec.frames_amount as usize);

    for i in 0..spec.frames_amount {
        let cfg = spec.config_for_frame(i);
        frames.push(render_frame(&cfg, Strategy::Batched, None)?);
        if let Some(sink) = progress.as_deref_mut() {
            sink.update((i + 1) as u64, spec.frames_amount as u64, Some(&label));
        }
    }

    Ok(frames)
}

/// Variante parallèle : les images sont indépendantes (configuration en
/// lecture seule, chaque worker compile sa propre formule), les résultats
/// sont collectés dans l'ordre des images. Pas de progression fine.
pub fn generate_parallel(spec: &AnimationSpec) -> Result<Vec<ColorGrid>, RenderError> {
    spec.validate()?;
    (0..spec.frames_amount)
        .into_par_iter()
        .map(|i| {
            let cfg = spec.config_for_frame(i);
            render_frame(&cfg, Strategy::Batched, None)
        })
        .collect()
}
