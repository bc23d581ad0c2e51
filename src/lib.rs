pub mod config;
pub mod detector;
pub mod landmarks;
pub mod placement;
pub mod render;
pub mod sampler;
pub mod session;
pub mod shapes;

pub use config::{Config, load_config};
pub use detector::{DetectorOptions, LandmarkDetector, NoDetector, StaticDetector};
pub use landmarks::Landmarks;
pub use placement::{Placement, PlacementParams};
pub use render::{Render, Renderer, RendererKind};
pub use session::{Generated, Session};
