pub mod grid;
pub mod plane;
pub mod types;

pub use grid::{ColorGrid, ScalarGrid};
pub use types::{AttractorSpec, ConfigError, PlaneRegion, RenderConfig};
