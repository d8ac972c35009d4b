pub mod adapter;
pub mod config;
pub mod engine;
pub mod events;
pub mod feature_cache;
pub mod focus;
pub mod interaction;
pub mod lifecycle;
pub mod trail;
pub mod view_state;

#[cfg(test)]
pub(crate) mod mock_engine;

pub use adapter::MapAdapter;
pub use config::{ConfigError, ViewerConfig};
pub use engine::{CameraPose, EngineError, MapEngine, RenderedFeature, ScreenPoint};
pub use events::{EngineEvent, EngineEventKind};
pub use feature_cache::FeatureCache;
pub use lifecycle::{Lifecycle, LifecycleError, LifecycleEvent, LifecycleState};
pub use trail::{TrailDetails, TrailSummary};
pub use view_state::ViewState;
