//! Asset projection: walks every placement of a page and creates or updates
//! the corresponding sprite, background or font record.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::assets::{
    AssetDatabase, BackgroundAsset, BboxMode, EmbeddedTexture, FontAsset, MaskMode, SepMaskKind,
    SpriteAsset, TexturePageItem,
};
use crate::config::{ImportConfig, PropertyOverride};
use crate::error::Result;
use crate::font;
use crate::model::{Rect, SourceImage, SpriteKind};
use crate::packer::{AtlasLayout, Placement};

/// A mask (re)generation request for one sprite, carrying the placement it
/// samples from. At most one job per sprite per page.
#[derive(Debug, Clone, Copy)]
pub struct MaskJob {
    pub sprite: usize,
    pub bounds: Rect,
    pub target_x: u32,
    pub target_y: u32,
}

/// Result of projecting one page.
#[derive(Debug, Default)]
pub struct PageProjection {
    pub mask_jobs: Vec<MaskJob>,
    /// Per-asset failures; the rest of the page continues.
    pub errors: Vec<String>,
}

/// Projects placements onto the asset database. Context is explicit: the
/// projector borrows its configuration, the database is a parameter.
pub struct Projector<'a> {
    cfg: &'a ImportConfig,
    frame_regex: Regex,
    sidecar_dir: PathBuf,
}

impl<'a> Projector<'a> {
    pub fn new(cfg: &'a ImportConfig, sidecar_dir: &Path) -> Result<Self> {
        Ok(Self {
            cfg,
            frame_regex: cfg.frame_regex()?,
            sidecar_dir: sidecar_dir.to_path_buf(),
        })
    }

    /// Registers the page as an embedded texture and projects each placement
    /// in layout order. Returns the mask jobs the caller must run while the
    /// composed page pixels are still resident.
    pub fn project_page(
        &self,
        db: &mut AssetDatabase,
        layout: &AtlasLayout<SourceImage>,
        page_file: &str,
    ) -> PageProjection {
        let page_index = db.embedded_textures.len();
        db.embedded_textures.push(EmbeddedTexture {
            name: format!("Texture {page_index}"),
            width: layout.width,
            height: layout.height,
            file_name: page_file.to_string(),
        });

        let mut projection = PageProjection::default();
        for placement in &layout.placements {
            let page_item = register_page_item(db, placement, page_index);
            match placement.item.kind {
                SpriteKind::Background => self.project_background(db, placement, page_item),
                SpriteKind::Sprite => {
                    self.project_sprite(db, placement, page_item, &mut projection)
                }
                SpriteKind::Font => self.project_font(db, placement, page_item, &mut projection),
                // Unknown images never leave the catalog.
                SpriteKind::Unknown => {}
            }
        }
        projection
    }

    fn project_background(
        &self,
        db: &mut AssetDatabase,
        placement: &Placement<SourceImage>,
        page_item: usize,
    ) {
        let name = placement.item.base_name();
        if let Some(index) = db.background_index(&name) {
            db.backgrounds[index].texture = Some(page_item);
            debug!(background = %name, "updated background texture");
        } else {
            db.backgrounds.push(BackgroundAsset {
                name,
                transparent: false,
                preload: false,
                texture: Some(page_item),
            });
        }
    }

    fn project_sprite(
        &self,
        db: &mut AssetDatabase,
        placement: &Placement<SourceImage>,
        page_item: usize,
        projection: &mut PageProjection,
    ) {
        let stem = placement.item.base_name();
        let (name, frame) = self.parse_sprite_name(&stem);
        if name.is_empty() {
            projection
                .errors
                .push(format!("sprite name is empty for file '{stem}', skipping"));
            return;
        }

        let item = &placement.item;
        let bounds = placement.bounds;

        match db.sprite_index(&name) {
            None => {
                let mut sprite = SpriteAsset::new(&name, item.bounding_width, item.bounding_height);
                sprite.margin_left = item.target_x as i32;
                sprite.margin_right = item.target_x as i32 + bounds.w as i32 - 1;
                sprite.margin_top = item.target_y as i32;
                sprite.margin_bottom = item.target_y as i32 + bounds.h as i32 - 1;
                for _ in 0..frame {
                    sprite.frames.push(None);
                }
                sprite.frames.push(Some(page_item));

                let wants_mask = wants_mask(&sprite, db.skip_rect_masks);
                let sprite_index = db.sprites.len();
                db.sprites.push(sprite);
                if wants_mask {
                    push_mask_job(&mut projection.mask_jobs, sprite_index, placement);
                }
                self.apply_overrides(db, sprite_index, &mut projection.errors);
            }
            Some(sprite_index) => {
                let mask_mode = db.mask_mode;
                let skip_rect_masks = db.skip_rect_masks;
                let sprite = &mut db.sprites[sprite_index];

                while sprite.frames.len() <= frame {
                    sprite.frames.push(None);
                }
                sprite.frames[frame] = Some(page_item);

                let (old_width, old_height) = (sprite.width, sprite.height);
                sprite.width = item.bounding_width;
                sprite.height = item.bounding_height;
                let changed_dimensions =
                    old_width != sprite.width || old_height != sprite.height;

                // Margins only ever grow across frames; manual boxes are
                // left alone, full-image boxes grow to the whole sprite.
                let mut grew_bounding_box = false;
                if sprite.bbox_mode != BboxMode::Manual {
                    let full = sprite.bbox_mode == BboxMode::FullImage;
                    let left = if full { 0 } else { item.target_x as i32 };
                    let right = if full {
                        sprite.width as i32 - 1
                    } else {
                        item.target_x as i32 + bounds.w as i32 - 1
                    };
                    let top = if full { 0 } else { item.target_y as i32 };
                    let bottom = if full {
                        sprite.height as i32 - 1
                    } else {
                        item.target_y as i32 + bounds.h as i32 - 1
                    };
                    if left < sprite.margin_left {
                        sprite.margin_left = left;
                        grew_bounding_box = true;
                    }
                    if top < sprite.margin_top {
                        sprite.margin_top = top;
                        grew_bounding_box = true;
                    }
                    if right > sprite.margin_right {
                        sprite.margin_right = right;
                        grew_bounding_box = true;
                    }
                    if bottom > sprite.margin_bottom {
                        sprite.margin_bottom = bottom;
                        grew_bounding_box = true;
                    }
                }

                if wants_mask(sprite, skip_rect_masks) {
                    let regenerate = match mask_mode {
                        MaskMode::BoundingBox => grew_bounding_box,
                        MaskMode::FullSprite => changed_dimensions,
                    } || (sprite.sep_mask_kind == SepMaskKind::Precise
                        && sprite.masks.is_empty());
                    if regenerate {
                        push_mask_job(&mut projection.mask_jobs, sprite_index, placement);
                    }
                }
                self.apply_overrides(db, sprite_index, &mut projection.errors);
            }
        }
    }

    fn project_font(
        &self,
        db: &mut AssetDatabase,
        placement: &Placement<SourceImage>,
        page_item: usize,
        projection: &mut PageProjection,
    ) {
        let name = placement.item.base_name();
        let sidecar = font::sidecar_path(&self.sidecar_dir, &name);
        match font::parse_font_sheet(&sidecar) {
            Ok(sheet) => {
                if let Some(index) = db.font_index(&name) {
                    sheet.apply_to(&mut db.fonts[index]);
                    db.fonts[index].texture = Some(page_item);
                    debug!(font = %name, "updated font");
                } else {
                    let mut new_font = FontAsset::new(&name);
                    sheet.apply_to(&mut new_font);
                    new_font.texture = Some(page_item);
                    db.fonts.push(new_font);
                    debug!(font = %name, "added new font");
                }
            }
            Err(e) => {
                projection
                    .errors
                    .push(format!("failed to import font {name}: {e}"));
            }
        }
    }

    /// Splits a file stem into sprite base name and frame index. No frame
    /// suffix means frame 0 of a single-frame sprite.
    fn parse_sprite_name(&self, stem: &str) -> (String, usize) {
        let Some(caps) = self.frame_regex.captures(stem) else {
            return (stem.to_string(), 0);
        };
        let name = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| stem.to_string());
        let frame = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(0);
        (name, frame)
    }

    /// Applies a configured property override, after all structural fields
    /// are set, so explicit values always win. A malformed override fails
    /// only its own asset.
    fn apply_overrides(&self, db: &mut AssetDatabase, sprite_index: usize, errors: &mut Vec<String>) {
        let sprite = &mut db.sprites[sprite_index];
        let Some(raw) = self.cfg.change_props.get(&sprite.name) else {
            return;
        };
        match serde_json::from_value::<PropertyOverride>(raw.clone()) {
            Ok(props) => {
                debug!(sprite = %sprite.name, "applying custom properties");
                props.apply_to(sprite);
            }
            Err(e) => {
                errors.push(format!(
                    "invalid property override for '{}': {e}",
                    sprite.name
                ));
            }
        }
    }
}

/// Whether the sprite takes a generated mask at all. Plain-rectangle mask
/// shapes are skipped when the database says so, unless masks already exist.
fn wants_mask(sprite: &SpriteAsset, skip_rect_masks: bool) -> bool {
    !skip_rect_masks
        || !matches!(
            sprite.sep_mask_kind,
            SepMaskKind::AxisAlignedRect | SepMaskKind::RotatedRect
        )
        || !sprite.masks.is_empty()
}

/// Queues a mask job, replacing any earlier job for the same sprite.
fn push_mask_job(jobs: &mut Vec<MaskJob>, sprite: usize, placement: &Placement<SourceImage>) {
    let job = MaskJob {
        sprite,
        bounds: placement.bounds,
        target_x: placement.item.target_x,
        target_y: placement.item.target_y,
    };
    if let Some(existing) = jobs.iter_mut().find(|j| j.sprite == sprite) {
        *existing = job;
    } else {
        jobs.push(job);
    }
}

/// Registers the placement as a texture page item and returns its index.
fn register_page_item(
    db: &mut AssetDatabase,
    placement: &Placement<SourceImage>,
    page_index: usize,
) -> usize {
    let item = &placement.item;
    let bounds = placement.bounds;
    let index = db.page_items.len();
    db.page_items.push(TexturePageItem {
        name: format!("PageItem {index}"),
        source_x: bounds.x as u16,
        source_y: bounds.y as u16,
        source_width: bounds.w as u16,
        source_height: bounds.h as u16,
        target_x: item.target_x as u16,
        target_y: item.target_y as u16,
        target_width: bounds.w as u16,
        target_height: bounds.h as u16,
        bounding_width: item.bounding_width as u16,
        bounding_height: item.bounding_height as u16,
        texture_page: page_index,
    });
    index
}
