//! App Tags
//!
//! Derived metadata for installed apps and APK archives:
//! - Tag catalog with per-tag requisite declarations
//! - Tri-state tag selection with change detection
//! - Single-flight requisite resolution on tokio tasks
//! - Selection-aware tag expression and display hints

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod expression;
pub mod icons;
pub mod resolver;
pub mod selection;
pub mod utils;

// Re-exports for convenience
pub use app::{App, InventoryInspector, PackageInspector};
pub use catalog::{builtin_catalog, TagCatalog, TagDefinition};
pub use config::{EngineConfig, LockScope};
pub use error::{TagError, TagResult};
pub use expression::{ExpressedTag, TagEvaluator};
pub use resolver::{Relevance, ResolutionEngine, Resources};
pub use selection::{SelectionStore, TriState, TriStateSelectable};
