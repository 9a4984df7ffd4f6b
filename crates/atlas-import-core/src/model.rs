use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if `self` and `r` share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        if self.w == 0 || self.h == 0 || r.w == 0 || r.h == 0 {
            return false;
        }
        self.x <= r.right() && r.x <= self.right() && self.y <= r.bottom() && r.y <= self.bottom()
    }
}

/// Classification of a source image derived from its parent folder name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpriteKind {
    Sprite,
    Background,
    Font,
    Unknown,
}

/// Classifies a source file by its parent folder name, case-insensitively.
pub fn classify_path(path: &Path) -> SpriteKind {
    let Some(folder) = path.parent().and_then(|p| p.file_name()) else {
        return SpriteKind::Unknown;
    };
    match folder.to_string_lossy().to_lowercase().as_str() {
        "backgrounds" | "background" => SpriteKind::Background,
        "fonts" | "font" => SpriteKind::Font,
        "sprites" | "sprite" => SpriteKind::Sprite,
        _ => SpriteKind::Unknown,
    }
}

/// A loaded source image, trimmed to its opaque content (backgrounds are
/// never trimmed). Immutable after the catalog scan.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Path of the file the image was loaded from.
    pub source: PathBuf,
    pub kind: SpriteKind,
    /// Trimmed content size.
    pub width: u32,
    pub height: u32,
    /// Offset of the trimmed content within the original bounds.
    pub target_x: u32,
    pub target_y: u32,
    /// Original (untrimmed) size.
    pub bounding_width: u32,
    pub bounding_height: u32,
    /// Trimmed pixel data.
    pub pixels: RgbaImage,
}

impl SourceImage {
    /// File stem of the source path.
    pub fn base_name(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
