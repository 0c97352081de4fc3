pub mod scene_model;
pub mod directive;
pub mod numeric;
pub mod config;
pub mod bindings;
pub mod host;
pub mod texture_sync;
pub mod interpreter;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

pub use config::{BlockScope, InterpreterConfig, NumericMode};
pub use host::{Costume, HeadlessHost, HeadlessSprite, RenderHost, VisualEntity};
pub use interpreter::PlanetInterpreter;
pub use scene_model::{SceneModel, SceneSnapshot};
pub use texture_sync::{FetchError, FetchedTexture, MemoryFetcher, SyncReport, TextureFetcher};
