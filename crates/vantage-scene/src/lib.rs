//! Vantage Scene - headless viewer runtime
//!
//! Everything a host needs to show a remote model, minus the GPU:
//! - Camera rig with orbit, truck and dolly input and fit-to-bounds
//! - On-demand render scheduling driven by the host's frame clock
//! - Greedy label declutter over projected overlay labels
//! - Background model loading with an observable load status
//! - Viewer lifecycle tying these together

pub mod camera;
pub mod config;
pub mod declutter;
pub mod loader;
pub mod overlay;
pub mod render;
pub mod scheduler;
pub mod status;
pub mod viewer;

pub use camera::{
    CameraAction, CameraRig, MouseBindings, PerspectiveCamera, PointerButton, RigSettings,
};
pub use config::{load_config, save_default_config, ViewerConfig};
pub use declutter::{declutter, ScreenRect};
pub use loader::{HttpFetcher, LoadError, LoadReport, LoadTask, ModelLoader, PayloadFetcher};
pub use overlay::ProjectedOverlay;
pub use render::{LabelOverlay, PlacedLabel, RenderError, RenderSurface, Viewport};
pub use scheduler::{FrameOutcome, FrameTarget, RenderScheduler};
pub use status::{LoadStatus, LoadStatusChannel};
pub use viewer::{ModelSource, Viewer, ViewerError};

pub use vantage_core;
