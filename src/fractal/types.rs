use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::color::MapStep;

/// Description immuable de la formule d'itération.
///
/// `expression` référence librement les cinq variables `z, const, a, b, c` ;
/// les constantes non renseignées valent `0+0i`. La compilation de la même
/// expression donne toujours un évaluateur au comportement identique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttractorSpec {
    pub expression: String,
    pub constant: Complex64,
    pub a: Complex64,
    pub b: Complex64,
    pub c: Complex64,
}

impl AttractorSpec {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            constant: Complex64::new(0.0, 0.0),
            a: Complex64::new(0.0, 0.0),
            b: Complex64::new(0.0, 0.0),
            c: Complex64::new(0.0, 0.0),
        }
    }

    #[allow(dead_code)]
    pub fn with_constant(mut self, constant: Complex64) -> Self {
        self.constant = constant;
        self
    }
}

impl Default for AttractorSpec {
    fn default() -> Self {
        Self::new("z^2 + const")
    }
}

/// Rectangle du plan complexe : `re_min < re_max` et `im_min < im_max`.
/// Les régions inversées ou d'aire nulle sont refusées à la construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneRegion {
    pub re_min: f64,
    pub re_max: f64,
    pub im_min: f64,
    pub im_max: f64,
}

impl PlaneRegion {
    pub fn new(re_min: f64, re_max: f64, im_min: f64, im_max: f64) -> Result<Self, ConfigError> {
        let region = Self {
            re_min,
            re_max,
            im_min,
            im_max,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = self.re_min.is_finite()
            && self.re_max.is_finite()
            && self.im_min.is_finite()
            && self.im_max.is_finite();
        if !finite || self.re_min >= self.re_max || self.im_min >= self.im_max {
            return Err(ConfigError::EmptyPlaneRegion {
                re_min: self.re_min,
                re_max: self.re_max,
                im_min: self.im_min,
                im_max: self.im_max,
            });
        }
        Ok(())
    }

    /// Étendue réelle.
    pub fn re_span(&self) -> f64 {
        self.re_max - self.re_min
    }

    /// Étendue imaginaire.
    pub fn im_span(&self) -> f64 {
        self.im_max - self.im_min
    }
}

impl Default for PlaneRegion {
    fn default() -> Self {
        Self {
            re_min: -2.0,
            re_max: 2.0,
            im_min: -2.0,
            im_max: 2.0,
        }
    }
}

/// Paramètres d'un rendu : résolution, bornes d'itération, région du plan,
/// attracteur et chaîne de mapping couleur.
///
/// Construit une fois par invocation de rendu, jamais modifié pendant le
/// calcul d'une image ; le générateur de séquences produit un clone
/// réajusté par image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,

    pub max_iterations: u32,
    pub max_magnitude: f64,

    pub region: PlaneRegion,
    pub attractor: AttractorSpec,

    /// Chaîne de mapping orbites -> couleurs, appliquée de gauche à droite.
    pub maps: Vec<MapStep>,

    /// Décalage de couleur par image (cycle `(x + shift) % max_iterations`
    /// appliqué à la grille d'orbites avant la chaîne de mapping).
    pub color_shift: u32,
}

impl RenderConfig {
    /// Valide la configuration avant toute allocation de grille.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationCap);
        }
        if !(self.max_magnitude > 0.0) || !self.max_magnitude.is_finite() {
            return Err(ConfigError::NonPositiveMagnitude(self.max_magnitude));
        }
        self.region.validate()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            max_iterations: 256,
            max_magnitude: 2.0,
            region: PlaneRegion::default(),
            attractor: AttractorSpec::default(),
            maps: vec![MapStep::PaletteMap("twilight".into())],
            color_shift: 0,
        }
    }
}

/// Configuration invalide, détectée avant tout calcul.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyPlaneRegion {
        re_min: f64,
        re_max: f64,
        im_min: f64,
        im_max: f64,
    },
    ZeroResolution {
        width: u32,
        height: u32,
    },
    ZeroIterationCap,
    NonPositiveMagnitude(f64),
    ZeroFrameCount,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPlaneRegion {
                re_min,
                re_max,
                im_min,
                im_max,
            } => write!(
                f,
                "région du plan vide ou inversée: re [{re_min}, {re_max}], im [{im_min}, {im_max}]"
            ),
            ConfigError::ZeroResolution { width, height } => {
                write!(f, "résolution invalide: {width}x{height}")
            }
            ConfigError::ZeroIterationCap => write!(f, "max_iterations doit être positif"),
            ConfigError::NonPositiveMagnitude(m) => {
                write!(f, "max_magnitude doit être un réel positif (reçu {m})")
            }
            ConfigError::ZeroFrameCount => write!(f, "frames_amount doit être positif"),
        }
    }
}

impl std::error::Error for ConfigError {}
