//! Core library for importing folders of source images into an asset
//! database by way of texture atlas pages.
//!
//! - Catalog: scans a directory, trims images to their alpha bounds, and
//!   classifies them by folder naming convention
//! - Packer: recursive free-rect splitting with a best-fit search and a
//!   page-size minimization loop for the last page
//! - Compose: per-page pixel buffers, page PNGs, placement manifest
//! - Projection: creates or updates sprites, backgrounds and bitmap fonts,
//!   growing bounding boxes and filling frame slots
//! - Masks: packed-bit collision masks derived from page alpha
//!
//! Quick example:
//! ```ignore
//! use atlas_import_core::{run_import, AssetDatabase, ImportConfig};
//! # fn main() -> anyhow::Result<()> {
//! let cfg = ImportConfig::builder()
//!     .directory("mod/graphics")
//!     .texture_size(2048)
//!     .build();
//! let mut db = AssetDatabase::default();
//! let report = run_import(&cfg, &mut db)?;
//! println!("pages: {}, sprites: {}", report.pages, db.sprites.len());
//! # Ok(()) }
//! ```

pub mod assets;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod font;
pub mod mask;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod project;

pub use assets::*;
pub use config::*;
pub use error::*;
pub use model::*;
pub use packer::{pack_all, AtlasLayout, PackItem, Placement, SplitAxis};
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_import_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::assets::{
        AssetDatabase, BackgroundAsset, BboxMode, CollisionMask, FontAsset, MaskMode,
        SepMaskKind, SpriteAsset, TexturePageItem,
    };
    pub use crate::catalog::SourceCatalog;
    pub use crate::config::{FitHeuristic, ImportConfig, ImportConfigBuilder};
    pub use crate::model::{Rect, SourceImage, SpriteKind};
    pub use crate::packer::{pack_all, AtlasLayout, PackItem, Placement};
    pub use crate::pipeline::{run_import, ImportReport};
    pub use crate::{ImportError, Result};
}
