use std::fs;
use std::path::Path;

use atlas_import_core::assets::AssetDatabase;
use atlas_import_core::config::ImportConfig;
use atlas_import_core::error::ImportError;
use atlas_import_core::pipeline::run_import;
use image::{Rgba, RgbaImage};

fn save_png(path: &Path, img: &RgbaImage) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    img.save(path).unwrap();
}

fn opaque(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([200, 100, 50, 255]))
}

fn cfg(dir: &Path, out: &Path, texture_size: u32) -> ImportConfig {
    ImportConfig::builder()
        .directory(dir.to_str().unwrap())
        .temp_folder(out.to_str().unwrap())
        .texture_size(texture_size)
        .build()
}

/// Four opaque walk frames on one 128px page: one sprite with four frames,
/// full-span margins and an all-ones collision mask.
#[test]
fn walk_sprite_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    for i in 0..4u32 {
        save_png(&tmp.path().join(format!("in/sprites/walk_{i}.png")), &opaque(32, 32));
    }
    let out = tmp.path().join("out");

    let mut db = AssetDatabase::default();
    let report = run_import(&cfg(&tmp.path().join("in"), &out, 128), &mut db).expect("import");

    assert_eq!(report.pages, 1);
    assert_eq!(report.placements, 4);
    assert_eq!(report.sprites_created, 1);
    assert!(report.rejected.is_empty());
    assert!(report.asset_errors.is_empty());

    let sprite = db.sprite_by_name("walk").expect("walk sprite");
    assert_eq!(sprite.frames.len(), 4);
    assert!(sprite.frames.iter().all(|f| f.is_some()));
    assert_eq!((sprite.width, sprite.height), (32, 32));
    assert_eq!(
        (
            sprite.margin_left,
            sprite.margin_right,
            sprite.margin_top,
            sprite.margin_bottom
        ),
        (0, 31, 0, 31)
    );

    // 32-bit stride, 32 rows, every sampled pixel opaque
    assert_eq!(sprite.masks.len(), 1);
    let mask = &sprite.masks[0];
    assert_eq!((mask.width, mask.height), (32, 32));
    assert_eq!(mask.data.len(), 128);
    assert!(mask.data.iter().all(|&b| b == 0xFF));

    let page_dims = image::image_dimensions(out.join("atlas000.png")).unwrap();
    assert_eq!(page_dims, (128, 128));

    let manifest = fs::read_to_string(out.join("atlas.txt")).unwrap();
    let lines: Vec<&str> = manifest.lines().collect();
    assert_eq!(lines[0], "source_tex, atlas_tex, x, y, width, height");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].contains("walk_0.png, atlas000.png"));

    assert!(fs::read_to_string(out.join("atlas.log"))
        .unwrap()
        .contains("walk_0.png"));
}

/// With a 64px page and padding 2 each frame needs its own page, and the
/// last page is minimized down to 32x32.
#[test]
fn small_pages_spill_and_last_page_shrinks() {
    let tmp = tempfile::tempdir().unwrap();
    for i in 0..4u32 {
        save_png(&tmp.path().join(format!("in/sprites/walk_{i}.png")), &opaque(32, 32));
    }
    let out = tmp.path().join("out");

    let mut db = AssetDatabase::default();
    let report = run_import(&cfg(&tmp.path().join("in"), &out, 64), &mut db).expect("import");

    assert_eq!(report.pages, 4);
    assert_eq!(db.sprite_by_name("walk").unwrap().frames.len(), 4);
    assert_eq!(db.embedded_textures.len(), 4);

    let last_dims = image::image_dimensions(out.join("atlas003.png")).unwrap();
    assert_eq!(last_dims, (32, 32));
}

/// Rerunning the pipeline on unchanged input produces identical page
/// dimensions, placements and byte-identical composed pages.
#[test]
fn rerun_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let mut art = opaque(24, 16);
    art.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    save_png(&tmp.path().join("in/sprites/slab_0.png"), &art);
    save_png(&tmp.path().join("in/sprites/slab_1.png"), &opaque(10, 10));
    save_png(&tmp.path().join("in/backgrounds/sky.png"), &opaque(30, 20));

    let out_a = tmp.path().join("out_a");
    let out_b = tmp.path().join("out_b");
    let mut db_a = AssetDatabase::default();
    let mut db_b = AssetDatabase::default();
    run_import(&cfg(&tmp.path().join("in"), &out_a, 256), &mut db_a).expect("first run");
    run_import(&cfg(&tmp.path().join("in"), &out_b, 256), &mut db_b).expect("second run");

    let manifest_a = fs::read_to_string(out_a.join("atlas.txt")).unwrap();
    let manifest_b = fs::read_to_string(out_b.join("atlas.txt")).unwrap();
    assert_eq!(manifest_a, manifest_b);

    let page_a = fs::read(out_a.join("atlas000.png")).unwrap();
    let page_b = fs::read(out_b.join("atlas000.png")).unwrap();
    assert_eq!(page_a, page_b);
}

/// A page-sized fully transparent image still receives a valid placement
/// and a single-bit, all-clear mask.
#[test]
fn transparent_page_sized_image_gets_unit_mask() {
    let tmp = tempfile::tempdir().unwrap();
    save_png(
        &tmp.path().join("in/sprites/void.png"),
        &RgbaImage::new(2048, 2048),
    );
    let out = tmp.path().join("out");

    let mut db = AssetDatabase::default();
    let report = run_import(&cfg(&tmp.path().join("in"), &out, 2048), &mut db).expect("import");

    assert_eq!(report.pages, 1);
    assert_eq!(report.placements, 1);
    let sprite = db.sprite_by_name("void").expect("void sprite");
    assert_eq!((sprite.width, sprite.height), (2048, 2048));
    assert_eq!(
        (sprite.margin_left, sprite.margin_right, sprite.margin_top, sprite.margin_bottom),
        (0, 0, 0, 0)
    );
    assert_eq!(sprite.masks.len(), 1);
    assert_eq!((sprite.masks[0].width, sprite.masks[0].height), (1, 1));
    assert_eq!(sprite.masks[0].data, vec![0x00]);

    // the 1x1 placement minimizes the page all the way down
    let page_dims = image::image_dimensions(out.join("atlas000.png")).unwrap();
    assert_eq!(page_dims, (1, 1));
}

#[test]
fn font_strip_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    save_png(&tmp.path().join("in/fonts/Pixel.png"), &opaque(64, 16));
    fs::write(
        tmp.path().join("in/glyphs_Pixel.csv"),
        "\"Pixel\";8;False;False;1;0;1;1\n48;0;0;6;8;7;0\n49;6;0;6;8;7;0\n",
    )
    .unwrap();
    let out = tmp.path().join("out");

    let mut db = AssetDatabase::default();
    let report = run_import(&cfg(&tmp.path().join("in"), &out, 256), &mut db).expect("import");

    assert_eq!(report.fonts_created, 1);
    let font = db.font_by_name("Pixel").expect("font");
    assert_eq!(font.display_name, "Pixel");
    assert_eq!(font.em_size, 8);
    assert_eq!(font.glyphs.len(), 2);
    assert_eq!((font.range_start, font.range_end), (48, 49));
    assert!(font.texture.is_some());
}

#[test]
fn missing_directory_is_fatal_with_code_311() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = ImportConfig::builder()
        .directory(tmp.path().join("nope").to_str().unwrap())
        .temp_folder(tmp.path().join("out").to_str().unwrap())
        .build();
    let err = run_import(&cfg, &mut AssetDatabase::default()).unwrap_err();
    assert!(matches!(err, ImportError::MissingDirectory(_)));
    assert_eq!(err.outcome_code(), 311);
}

#[test]
fn folder_without_matches_is_fatal_with_code_312() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("in/sprites")).unwrap();
    fs::write(tmp.path().join("in/sprites/readme.txt"), "not an image").unwrap();
    let cfg = ImportConfig::builder()
        .directory(tmp.path().join("in").to_str().unwrap())
        .temp_folder(tmp.path().join("out").to_str().unwrap())
        .build();
    let err = run_import(&cfg, &mut AssetDatabase::default()).unwrap_err();
    assert!(matches!(err, ImportError::EmptyFolder(_)));
    assert_eq!(err.outcome_code(), 312);
}

#[test]
fn invalid_regex_is_fatal_with_code_316() {
    let tmp = tempfile::tempdir().unwrap();
    save_png(&tmp.path().join("in/sprites/a.png"), &opaque(8, 8));
    let cfg = ImportConfig::builder()
        .directory(tmp.path().join("in").to_str().unwrap())
        .temp_folder(tmp.path().join("out").to_str().unwrap())
        .spr_frame_regex("([")
        .build();
    let err = run_import(&cfg, &mut AssetDatabase::default()).unwrap_err();
    assert!(matches!(err, ImportError::InvalidRegex { .. }));
    assert_eq!(err.outcome_code(), 316);
}

/// A bad sidecar fails only its font; sprites on the same page import fine.
#[test]
fn sidecar_failure_does_not_abort_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    save_png(&tmp.path().join("in/fonts/Broken.png"), &opaque(16, 16));
    save_png(&tmp.path().join("in/sprites/hero_0.png"), &opaque(8, 8));
    fs::write(
        tmp.path().join("in/glyphs_Broken.csv"),
        "\"Broken\";8;False;False;1;0;1;1\n48;bad;0;6;8;7;0\n",
    )
    .unwrap();
    let out = tmp.path().join("out");

    let mut db = AssetDatabase::default();
    let report = run_import(&cfg(&tmp.path().join("in"), &out, 256), &mut db).expect("import");

    assert_eq!(report.asset_errors.len(), 1);
    assert!(report.asset_errors[0].contains("Broken"));
    assert_eq!(report.fonts_created, 0);
    assert!(db.sprite_by_name("hero").is_some());
}
