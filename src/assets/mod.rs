//! Per-athlete asset generation
//!
//! - `svg`: markup tree codec with path-addressed reads and writes
//! - `layout`: per-sport template layouts and field bindings
//! - `templates`: template loading
//! - `compose`: renders an athlete card through a layout
//! - `store`: object storage and the uploader

pub mod compose;
pub mod layout;
pub mod store;
pub mod svg;
pub mod templates;

pub use compose::{AthleteCard, Compositor};
pub use layout::{layout_for, AssetKind};
pub use store::{asset_key, AssetUploader, LocalObjectStore, ObjectStore, S3ObjectStore};
pub use templates::{FsTemplateSource, TemplateSource};
