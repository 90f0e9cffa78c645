pub mod animation;
pub mod escape_time;
pub mod frame;

pub use animation::{generate, generate_parallel, AnimationSpec, ParameterTrack};
pub use escape_time::{escape_batched, escape_grid, escape_point, escape_pointwise, Strategy};
pub use frame::{render_frame, render_frame_detailed, RenderedFrame};

use std::fmt;

use crate::color::{MapStepError, PipelineError};
use crate::formula::FormulaError;
use crate::fractal::ConfigError;

/// Erreur d'une invocation de rendu, de la compilation de la formule à
/// l'écriture du fichier de sortie. Aucune de ces erreurs n'est réessayée :
/// tout le cœur est un calcul pur et déterministe, un nouvel essai
/// échouerait à l'identique.
#[derive(Debug)]
pub enum RenderError {
    Formula(FormulaError),
    Config(ConfigError),
    MapStep(MapStepError),
    Pipeline(PipelineError),
    Io(std::io::Error),
    Image(image::ImageError),
    PngEncoding(png::EncodingError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Formula(e) => e.fmt(f),
            RenderError::Config(e) => e.fmt(f),
            RenderError::MapStep(e) => e.fmt(f),
            RenderError::Pipeline(e) => e.fmt(f),
            RenderError::Io(e) => write!(f, "erreur d'entrée/sortie: {e}"),
            RenderError::Image(e) => write!(f, "erreur d'encodage d'image: {e}"),
            RenderError::PngEncoding(e) => write!(f, "erreur d'encodage PNG: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Formula(e) => Some(e),
            RenderError::Config(e) => Some(e),
            RenderError::MapStep(e) => Some(e),
            RenderError::Pipeline(e) => Some(e),
            RenderError::Io(e) => Some(e),
            RenderError::Image(e) => Some(e),
            RenderError::PngEncoding(e) => Some(e),
        }
    }
}

impl From<FormulaError> for RenderError {
    fn from(e: FormulaError) -> Self {
        RenderError::Formula(e)
    }
}

impl From<ConfigError> for RenderError {
    fn from(e: ConfigError) -> Self {
        RenderError::Config(e)
    }
}

impl From<MapStepError> for RenderError {
    fn from(e: MapStepError) -> Self {
        RenderError::MapStep(e)
    }
}

impl From<PipelineError> for RenderError {
    fn from(e: PipelineError) -> Self {
        RenderError::Pipeline(e)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Image(e)
    }
}

impl From<png::EncodingError> for RenderError {
    fn from(e: png::EncodingError) -> Self {
        RenderError::PngEncoding(e)
    }
}
