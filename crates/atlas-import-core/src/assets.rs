//! In-memory asset database the projector and mask encoder mutate.
//!
//! Cross references are indices: a `TexturePageItem` names its owning page
//! in `embedded_textures`, sprite frames and font textures name entries in
//! `page_items`. Frame lists may contain `None` holes that later frames
//! fill in order.

use serde::{Deserialize, Serialize};

/// Policy governing a sprite's hit-region margins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BboxMode {
    /// Margins grow to the union of every frame's trimmed content.
    Automatic,
    /// Margins span the whole sprite.
    FullImage,
    /// Margins are authored by hand and never recomputed.
    Manual,
}

/// Shape of a sprite's separate collision mask.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SepMaskKind {
    AxisAlignedRect,
    RotatedRect,
    Precise,
}

/// How mask bits are addressed relative to the sprite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Mask cells cover the bounding box; sampling is placement-relative.
    BoundingBox,
    /// Mask cells cover the full sprite; sampling is offset by the frame's
    /// untrimmed target coordinates.
    FullSprite,
}

fn default_mask_mode() -> MaskMode {
    MaskMode::BoundingBox
}

/// A packed-bit collision mask for one sprite frame. The row stride is
/// rounded up to a multiple of 8 bits; `data.len() == stride / 8 * height`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollisionMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One placed region on an embedded texture page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TexturePageItem {
    pub name: String,
    pub source_x: u16,
    pub source_y: u16,
    pub source_width: u16,
    pub source_height: u16,
    pub target_x: u16,
    pub target_y: u16,
    pub target_width: u16,
    pub target_height: u16,
    pub bounding_width: u16,
    pub bounding_height: u16,
    /// Index of the owning page in `AssetDatabase::embedded_textures`.
    pub texture_page: usize,
}

/// One composed atlas page registered in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// File the composed page was persisted to.
    pub file_name: String,
}

/// A multi-frame sprite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteAsset {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub margin_left: i32,
    pub margin_right: i32,
    pub margin_top: i32,
    pub margin_bottom: i32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub transparent: bool,
    pub bbox_mode: BboxMode,
    pub sep_mask_kind: SepMaskKind,
    /// Frame slots in order; `None` is a hole awaiting a later frame.
    pub frames: Vec<Option<usize>>,
    pub masks: Vec<CollisionMask>,
}

impl SpriteAsset {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            margin_left: 0,
            margin_right: 0,
            margin_top: 0,
            margin_bottom: 0,
            origin_x: 0,
            origin_y: 0,
            transparent: false,
            bbox_mode: BboxMode::Automatic,
            sep_mask_kind: SepMaskKind::Precise,
            frames: Vec::new(),
            masks: Vec::new(),
        }
    }

    /// Mask cell dimensions under the given addressing mode.
    pub fn mask_dimensions(&self, mode: MaskMode) -> (u32, u32) {
        match mode {
            MaskMode::BoundingBox => (
                (self.margin_right - self.margin_left + 1).max(0) as u32,
                (self.margin_bottom - self.margin_top + 1).max(0) as u32,
            ),
            MaskMode::FullSprite => (self.width, self.height),
        }
    }
}

/// A single-frame background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundAsset {
    pub name: String,
    pub transparent: bool,
    pub preload: bool,
    /// Index into `AssetDatabase::page_items`.
    pub texture: Option<usize>,
}

/// One glyph of a bitmap font.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Glyph {
    pub character: u16,
    pub source_x: u16,
    pub source_y: u16,
    pub source_width: u16,
    pub source_height: u16,
    pub shift: i16,
    pub offset: i16,
}

/// A bitmap font backed by one texture page item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontAsset {
    pub name: String,
    pub display_name: String,
    pub em_size: u16,
    pub bold: bool,
    pub italic: bool,
    pub charset: u8,
    pub anti_aliasing: u8,
    pub scale_x: u16,
    pub scale_y: u16,
    pub range_start: u16,
    pub range_end: u32,
    pub glyphs: Vec<Glyph>,
    /// Index into `AssetDatabase::page_items`.
    pub texture: Option<usize>,
}

impl FontAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: String::new(),
            em_size: 0,
            bold: false,
            italic: false,
            charset: 0,
            anti_aliasing: 0,
            scale_x: 0,
            scale_y: 0,
            range_start: 0,
            range_end: 0,
            glyphs: Vec::new(),
            texture: None,
        }
    }
}

/// The destination asset database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDatabase {
    #[serde(default)]
    pub sprites: Vec<SpriteAsset>,
    #[serde(default)]
    pub backgrounds: Vec<BackgroundAsset>,
    #[serde(default)]
    pub fonts: Vec<FontAsset>,
    #[serde(default)]
    pub embedded_textures: Vec<EmbeddedTexture>,
    #[serde(default)]
    pub page_items: Vec<TexturePageItem>,
    /// Mask addressing mode of the consuming format.
    #[serde(default = "default_mask_mode")]
    pub mask_mode: MaskMode,
    /// Skip mask generation for sprites whose sep-mask shape is a plain
    /// rectangle (unless they already carry masks).
    #[serde(default)]
    pub skip_rect_masks: bool,
}

impl Default for AssetDatabase {
    fn default() -> Self {
        Self {
            sprites: Vec::new(),
            backgrounds: Vec::new(),
            fonts: Vec::new(),
            embedded_textures: Vec::new(),
            page_items: Vec::new(),
            mask_mode: default_mask_mode(),
            skip_rect_masks: false,
        }
    }
}

impl AssetDatabase {
    pub fn sprite_index(&self, name: &str) -> Option<usize> {
        self.sprites.iter().position(|s| s.name == name)
    }
    pub fn background_index(&self, name: &str) -> Option<usize> {
        self.backgrounds.iter().position(|b| b.name == name)
    }
    pub fn font_index(&self, name: &str) -> Option<usize> {
        self.fonts.iter().position(|f| f.name == name)
    }
    pub fn sprite_by_name(&self, name: &str) -> Option<&SpriteAsset> {
        self.sprites.iter().find(|s| s.name == name)
    }
    pub fn background_by_name(&self, name: &str) -> Option<&BackgroundAsset> {
        self.backgrounds.iter().find(|b| b.name == name)
    }
    pub fn font_by_name(&self, name: &str) -> Option<&FontAsset> {
        self.fonts.iter().find(|f| f.name == name)
    }
}
