//! Source image catalog: directory scan, alpha trimming and the pre-pack
//! validation pass.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use image::RgbaImage;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::model::{classify_path, Rect, SourceImage, SpriteKind};

/// Result of a directory scan: loaded images in scan order plus the
/// accepted/rejected lines destined for the pack log.
#[derive(Debug, Default)]
pub struct SourceCatalog {
    pub images: Vec<SourceImage>,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl SourceCatalog {
    /// Scans `root` recursively for files matching the configured pattern,
    /// loads and trims them. Per-image failures (decode errors, oversized
    /// images) are recorded and skipped; they never abort the batch.
    pub fn scan(root: &Path, cfg: &ImportConfig) -> Result<SourceCatalog> {
        let matcher = pattern_matcher(&cfg.search_pattern)?;
        let mut catalog = SourceCatalog::default();

        for path in matching_files(root, &matcher)? {
            let mut kind = classify_path(&path);
            if kind == SpriteKind::Unknown {
                if !cfg.import_unknown_as_sprite {
                    if cfg.debug {
                        debug!(path = %path.display(), "unknown folder, skipping per importUnknownAsSprite");
                    }
                    continue;
                }
                kind = SpriteKind::Sprite;
            }
            match load_source(&path, kind, cfg.texture_size) {
                Ok(Some(image)) => {
                    catalog.accepted.push(format!("Added {}", path.display()));
                    catalog.images.push(image);
                }
                Ok(None) => {
                    catalog.rejected.push(format!(
                        "{} is too large to fit in the atlas. Skipping!",
                        path.display()
                    ));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load source image");
                    catalog
                        .rejected
                        .push(format!("{} failed to decode: {}. Skipping!", path.display(), e));
                }
            }
        }
        Ok(catalog)
    }
}

/// Collects files under `root` matching the pattern, in deterministic scan
/// order (walkdir sorted by file name).
fn matching_files(root: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn pattern_matcher(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| ImportError::InvalidConfig(format!("invalid searchPattern {pattern:?}: {e}")))
}

/// Loads one source file. Returns `Ok(None)` when the untrimmed image does
/// not fit on a page of `max_dim`.
fn load_source(path: &Path, kind: SpriteKind, max_dim: u32) -> Result<Option<SourceImage>> {
    let rgba = image::open(path)?.to_rgba8();
    let (bounding_width, bounding_height) = rgba.dimensions();
    if bounding_width > max_dim || bounding_height > max_dim {
        return Ok(None);
    }

    // Backgrounds keep their full bounds; everything else trims to the
    // alpha bounding box. A fully transparent image normalizes to 1x1.
    let (pixels, target_x, target_y) = if kind == SpriteKind::Background {
        (rgba, 0, 0)
    } else {
        match alpha_bounds(&rgba) {
            Some(b) => {
                let cropped = image::imageops::crop_imm(&rgba, b.x, b.y, b.w, b.h).to_image();
                (cropped, b.x, b.y)
            }
            None => (RgbaImage::new(1, 1), 0, 0),
        }
    };

    Ok(Some(SourceImage {
        source: path.to_path_buf(),
        kind,
        width: pixels.width(),
        height: pixels.height(),
        target_x,
        target_y,
        bounding_width,
        bounding_height,
        pixels,
    }))
}

/// Bounding box of pixels with non-zero alpha, or `None` when the image is
/// fully transparent.
pub fn alpha_bounds(rgba: &RgbaImage) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let mut x1 = 0;
    let mut y1 = 0;
    let mut x2 = w - 1;
    let mut y2 = h - 1;
    // left
    while x1 < w {
        if (0..h).any(|y| rgba.get_pixel(x1, y)[3] > 0) {
            break;
        }
        x1 += 1;
    }
    if x1 >= w {
        return None;
    }
    // right
    while x2 > x1 {
        if (0..h).any(|y| rgba.get_pixel(x2, y)[3] > 0) {
            break;
        }
        x2 -= 1;
    }
    // top
    while y1 < h {
        if (x1..=x2).any(|x| rgba.get_pixel(x, y1)[3] > 0) {
            break;
        }
        y1 += 1;
    }
    // bottom
    while y2 > y1 {
        if (x1..=x2).any(|x| rgba.get_pixel(x, y2)[3] > 0) {
            break;
        }
        y2 -= 1;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Pre-pack validation of the import folder. Fatal on an empty folder,
/// duplicate base file names, or broken frame-index sequences.
pub fn validate_import_folder(root: &Path, cfg: &ImportConfig) -> Result<()> {
    if !root.is_dir() {
        return Err(ImportError::MissingDirectory(root.display().to_string()));
    }
    let matcher = pattern_matcher(&cfg.search_pattern)?;
    let files = matching_files(root, &matcher)?;
    if files.is_empty() {
        return Err(ImportError::EmptyFolder(root.display().to_string()));
    }

    // Duplicate base file names across subdirectories.
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for f in &files {
        if let Some(name) = f.file_name() {
            *counts.entry(name.to_string_lossy().into_owned()).or_default() += 1;
        }
    }
    for (name, count) in &counts {
        if *count > 1 {
            return Err(ImportError::DuplicateFile {
                name: name.clone(),
                count: *count,
            });
        }
    }

    // Frame-numbered sprite names must form a gap-free sequence.
    let regex = cfg.frame_regex()?;
    let mut frames_by_base: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for f in &files {
        let mut kind = classify_path(f);
        if kind == SpriteKind::Unknown {
            if !cfg.import_unknown_as_sprite {
                continue;
            }
            kind = SpriteKind::Sprite;
        }
        if kind != SpriteKind::Sprite {
            continue;
        }
        let stem = f
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(caps) = regex.captures(&stem) else {
            continue;
        };
        // Sprites without a frame suffix are single-frame, nothing to check.
        let Some(frame) = caps.get(2) else {
            continue;
        };
        let file_name = f
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let index: i64 = frame
            .as_str()
            .parse()
            .map_err(|_| ImportError::InvalidFrameIndex(file_name.clone()))?;
        if index < 0 {
            return Err(ImportError::InvalidFrameIndex(file_name));
        }
        let base = caps.get(1).map(|m| m.as_str().to_owned()).unwrap_or_default();
        frames_by_base.entry(base).or_default().push(index);
    }
    for (base, mut indices) in frames_by_base {
        indices.sort_unstable();
        for pair in indices.windows(2) {
            if pair[1] - pair[0] > 1 {
                return Err(ImportError::MissingFrame {
                    sprite: base,
                    index: (pair[0] + 1) as u32,
                });
            }
        }
    }
    Ok(())
}
