pub mod palettes;
pub mod pipeline;

pub use palettes::{palette_by_name, palette_names, Palette, PaletteError};
pub use pipeline::{
    apply_maps, parse_maps, MapOutput, MapStep, MapStepError, PipelineError, PipelineMode,
};
