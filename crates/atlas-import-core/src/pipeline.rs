//! The import pipeline: scan, validate, pack, compose, project, encode.
//!
//! Strictly single-threaded and sequential. Each page's source pixels and
//! composed buffer are dropped as soon as its projection and mask pass
//! complete, bounding peak memory to roughly one page's worth of data.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::assets::AssetDatabase;
use crate::catalog::{self, SourceCatalog};
use crate::compose;
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::mask;
use crate::packer;
use crate::project::Projector;

/// Summary of a completed import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub pages: usize,
    pub placements: usize,
    pub sprites_created: usize,
    pub backgrounds_created: usize,
    pub fonts_created: usize,
    /// Sources excluded during the scan (oversized, undecodable).
    pub rejected: Vec<String>,
    /// Per-asset failures that did not abort the batch.
    pub asset_errors: Vec<String>,
    pub manifest_path: PathBuf,
}

#[instrument(skip_all)]
/// Runs the whole import against `db`: scans `cfg.directory`, packs every
/// accepted image, persists pages and the manifest under `cfg.temp_folder`,
/// projects placements onto the database and regenerates collision masks.
pub fn run_import(cfg: &ImportConfig, db: &mut AssetDatabase) -> Result<ImportReport> {
    cfg.validate()?;

    let root = Path::new(&cfg.directory);
    catalog::validate_import_folder(root, cfg)?;

    let SourceCatalog {
        images,
        accepted,
        rejected,
    } = SourceCatalog::scan(root, cfg)?;
    if images.is_empty() {
        return Err(ImportError::EmptyFolder(root.display().to_string()));
    }
    info!(
        count = images.len(),
        rejected = rejected.len(),
        "scanned import folder"
    );

    let temp = Path::new(&cfg.temp_folder);
    fs::create_dir_all(temp)?;

    let layouts = packer::pack_all(
        images,
        cfg.texture_size,
        cfg.padding_between_images,
        cfg.fit_heuristic,
    );

    let manifest_path = temp.join("atlas.txt");
    let mut manifest = BufWriter::new(File::create(&manifest_path)?);
    writeln!(manifest, "{}", compose::MANIFEST_HEADER)?;

    let projector = Projector::new(cfg, root)?;
    let sprites_before = db.sprites.len();
    let backgrounds_before = db.backgrounds.len();
    let fonts_before = db.fonts.len();
    let mut placements = 0usize;
    let mut asset_errors = Vec::new();
    let page_count = layouts.len();

    for (index, layout) in layouts.into_iter().enumerate() {
        let file_name = compose::page_file_name("atlas", index);
        let pixels = compose::compose_page(&layout);
        pixels.save(temp.join(&file_name))?;
        compose::write_manifest_rows(&mut manifest, &layout, &file_name)?;

        let projection = projector.project_page(db, &layout, &file_name);
        mask::regenerate_masks(db, &projection.mask_jobs, &pixels);
        asset_errors.extend(projection.errors);
        placements += layout.placements.len();
        info!(
            page = index,
            width = layout.width,
            height = layout.height,
            placements = layout.placements.len(),
            "page composed and projected"
        );
        // `layout` and `pixels` drop here, releasing this page's buffers.
    }
    manifest.flush()?;
    compose::write_pack_log(&temp.join("atlas.log"), &accepted, &rejected)?;

    let report = ImportReport {
        pages: page_count,
        placements,
        sprites_created: db.sprites.len() - sprites_before,
        backgrounds_created: db.backgrounds.len() - backgrounds_before,
        fonts_created: db.fonts.len() - fonts_before,
        rejected,
        asset_errors,
        manifest_path,
    };
    info!(
        pages = report.pages,
        placements = report.placements,
        sprites = report.sprites_created,
        backgrounds = report.backgrounds_created,
        fonts = report.fonts_created,
        "import finished"
    );
    Ok(report)
}
