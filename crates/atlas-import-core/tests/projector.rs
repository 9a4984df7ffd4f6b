use std::path::{Path, PathBuf};

use atlas_import_core::assets::{AssetDatabase, BboxMode, SepMaskKind, SpriteAsset};
use atlas_import_core::config::ImportConfig;
use atlas_import_core::model::{Rect, SourceImage, SpriteKind};
use atlas_import_core::packer::{AtlasLayout, Placement};
use atlas_import_core::project::Projector;
use image::{Rgba, RgbaImage};
use serde_json::json;

fn source(
    name: &str,
    kind: SpriteKind,
    trimmed: (u32, u32),
    target: (u32, u32),
    bounding: (u32, u32),
) -> SourceImage {
    SourceImage {
        source: PathBuf::from(format!("sprites/{name}.png")),
        kind,
        width: trimmed.0,
        height: trimmed.1,
        target_x: target.0,
        target_y: target.1,
        bounding_width: bounding.0,
        bounding_height: bounding.1,
        pixels: RgbaImage::from_pixel(trimmed.0, trimmed.1, Rgba([255, 0, 0, 255])),
    }
}

fn layout_of(images: Vec<SourceImage>) -> AtlasLayout<SourceImage> {
    let mut x = 0;
    let placements = images
        .into_iter()
        .map(|img| {
            let bounds = Rect::new(x, 0, img.width, img.height);
            x += img.width + 2;
            Placement { item: img, bounds }
        })
        .collect();
    AtlasLayout {
        width: 256,
        height: 256,
        placements,
    }
}

fn project(cfg: &ImportConfig, db: &mut AssetDatabase, images: Vec<SourceImage>) -> Vec<String> {
    let projector = Projector::new(cfg, Path::new(".")).expect("projector");
    let layout = layout_of(images);
    let projection = projector.project_page(db, &layout, "atlas000.png");
    projection.errors
}

#[test]
fn new_sprite_gets_margins_from_trimmed_content() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    project(
        &cfg,
        &mut db,
        vec![source("hero_0", SpriteKind::Sprite, (3, 2), (2, 3), (8, 8))],
    );

    let sprite = db.sprite_by_name("hero").expect("sprite created");
    assert_eq!((sprite.width, sprite.height), (8, 8));
    assert_eq!(sprite.margin_left, 2);
    assert_eq!(sprite.margin_right, 4);
    assert_eq!(sprite.margin_top, 3);
    assert_eq!(sprite.margin_bottom, 4);
    assert_eq!(sprite.frames, vec![Some(0)]);

    let item = &db.page_items[0];
    assert_eq!((item.target_x, item.target_y), (2, 3));
    assert_eq!((item.bounding_width, item.bounding_height), (8, 8));
    assert_eq!(item.texture_page, 0);
}

#[test]
fn file_without_frame_suffix_is_frame_zero() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    project(
        &cfg,
        &mut db,
        vec![source("coin", SpriteKind::Sprite, (4, 4), (0, 0), (4, 4))],
    );
    let sprite = db.sprite_by_name("coin").expect("sprite created");
    assert_eq!(sprite.frames, vec![Some(0)]);
}

#[test]
fn out_of_order_frames_leave_holes_then_fill_them() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    project(
        &cfg,
        &mut db,
        vec![source("walk_2", SpriteKind::Sprite, (4, 4), (0, 0), (4, 4))],
    );
    assert_eq!(
        db.sprite_by_name("walk").unwrap().frames,
        vec![None, None, Some(0)]
    );

    project(
        &cfg,
        &mut db,
        vec![source("walk_0", SpriteKind::Sprite, (4, 4), (0, 0), (4, 4))],
    );
    assert_eq!(
        db.sprite_by_name("walk").unwrap().frames,
        vec![Some(1), None, Some(0)]
    );
}

/// Margins union across frames and never shrink.
#[test]
fn auto_bbox_margins_grow_monotonically() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    project(
        &cfg,
        &mut db,
        vec![
            source("run_0", SpriteKind::Sprite, (2, 2), (3, 3), (8, 8)),
            source("run_1", SpriteKind::Sprite, (6, 6), (1, 1), (8, 8)),
            source("run_2", SpriteKind::Sprite, (2, 2), (4, 4), (8, 8)),
        ],
    );

    let sprite = db.sprite_by_name("run").unwrap();
    // frame 1 widened the box to 1..=6; frame 2 lies inside it
    assert_eq!(sprite.margin_left, 1);
    assert_eq!(sprite.margin_top, 1);
    assert_eq!(sprite.margin_right, 6);
    assert_eq!(sprite.margin_bottom, 6);
}

#[test]
fn manual_bbox_margins_are_untouched() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    let mut sprite = SpriteAsset::new("door", 8, 8);
    sprite.bbox_mode = BboxMode::Manual;
    sprite.margin_left = 2;
    sprite.margin_right = 5;
    sprite.margin_top = 2;
    sprite.margin_bottom = 5;
    sprite.frames.push(Some(999));
    db.sprites.push(sprite);

    project(
        &cfg,
        &mut db,
        vec![source("door_1", SpriteKind::Sprite, (8, 8), (0, 0), (8, 8))],
    );

    let sprite = db.sprite_by_name("door").unwrap();
    assert_eq!(
        (
            sprite.margin_left,
            sprite.margin_right,
            sprite.margin_top,
            sprite.margin_bottom
        ),
        (2, 5, 2, 5)
    );
}

#[test]
fn full_image_bbox_spans_whole_sprite() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    let mut sprite = SpriteAsset::new("tile", 8, 8);
    sprite.bbox_mode = BboxMode::FullImage;
    sprite.margin_left = 3;
    sprite.margin_right = 4;
    sprite.margin_top = 3;
    sprite.margin_bottom = 4;
    sprite.frames.push(Some(999));
    db.sprites.push(sprite);

    project(
        &cfg,
        &mut db,
        vec![source("tile_1", SpriteKind::Sprite, (2, 2), (3, 3), (8, 8))],
    );

    let sprite = db.sprite_by_name("tile").unwrap();
    assert_eq!(
        (
            sprite.margin_left,
            sprite.margin_right,
            sprite.margin_top,
            sprite.margin_bottom
        ),
        (0, 7, 0, 7)
    );
}

#[test]
fn backgrounds_are_created_then_retargeted() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    project(
        &cfg,
        &mut db,
        vec![source("cave", SpriteKind::Background, (16, 16), (0, 0), (16, 16))],
    );
    assert_eq!(db.backgrounds.len(), 1);
    assert_eq!(db.backgrounds[0].texture, Some(0));

    project(
        &cfg,
        &mut db,
        vec![source("cave", SpriteKind::Background, (16, 16), (0, 0), (16, 16))],
    );
    assert_eq!(db.backgrounds.len(), 1);
    assert_eq!(db.backgrounds[0].texture, Some(1));
}

/// Overrides run after structural updates, so explicit values always win.
#[test]
fn property_overrides_win_last() {
    let cfg = ImportConfig::builder()
        .change_prop(
            "hero",
            json!({
                "size": { "width": 99 },
                "margin": { "left": 1, "right": 6 },
                "transparent": true,
                "origin": { "x": 4, "y": 5 }
            }),
        )
        .build();
    let mut db = AssetDatabase::default();
    let errors = project(
        &cfg,
        &mut db,
        vec![source("hero_0", SpriteKind::Sprite, (3, 2), (2, 3), (8, 8))],
    );
    assert!(errors.is_empty());

    let sprite = db.sprite_by_name("hero").unwrap();
    assert_eq!(sprite.width, 99);
    assert_eq!(sprite.height, 8);
    assert_eq!((sprite.margin_left, sprite.margin_right), (1, 6));
    assert!(sprite.transparent);
    assert_eq!((sprite.origin_x, sprite.origin_y), (4, 5));
}

#[test]
fn malformed_override_fails_only_its_asset() {
    let cfg = ImportConfig::builder()
        .change_prop("hero", json!({ "size": "not-an-object" }))
        .build();
    let mut db = AssetDatabase::default();
    let errors = project(
        &cfg,
        &mut db,
        vec![
            source("hero_0", SpriteKind::Sprite, (3, 2), (2, 3), (8, 8)),
            source("villain_0", SpriteKind::Sprite, (3, 2), (2, 3), (8, 8)),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("hero"));
    // both sprites were still created, structural fields intact
    assert_eq!(db.sprites.len(), 2);
    assert_eq!(db.sprite_by_name("hero").unwrap().width, 8);
}

#[test]
fn rect_mask_sprites_are_skipped_when_configured() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    db.skip_rect_masks = true;
    let mut sprite = SpriteAsset::new("box", 8, 8);
    sprite.sep_mask_kind = SepMaskKind::AxisAlignedRect;
    sprite.frames.push(Some(999));
    db.sprites.push(sprite);

    let projector = Projector::new(&cfg, Path::new(".")).expect("projector");
    let layout = layout_of(vec![source(
        "box_1",
        SpriteKind::Sprite,
        (8, 8),
        (0, 0),
        (8, 8),
    )]);
    let projection = projector.project_page(&mut db, &layout, "atlas000.png");
    assert!(projection.mask_jobs.is_empty());
}

#[test]
fn precise_sprite_without_mask_queues_a_job() {
    let cfg = ImportConfig::default();
    let mut db = AssetDatabase::default();
    let mut sprite = SpriteAsset::new("slime", 8, 8);
    sprite.sep_mask_kind = SepMaskKind::Precise;
    sprite.margin_right = 7;
    sprite.margin_bottom = 7;
    sprite.frames.push(Some(999));
    db.sprites.push(sprite);

    let projector = Projector::new(&cfg, Path::new(".")).expect("projector");
    // frame fits inside the existing box, so margins do not grow
    let layout = layout_of(vec![source(
        "slime_1",
        SpriteKind::Sprite,
        (4, 4),
        (1, 1),
        (8, 8),
    )]);
    let projection = projector.project_page(&mut db, &layout, "atlas000.png");
    assert_eq!(projection.mask_jobs.len(), 1);
    assert_eq!(projection.mask_jobs[0].sprite, 0);
}
