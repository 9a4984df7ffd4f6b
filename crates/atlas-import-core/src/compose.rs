//! Atlas page composition and the manifest/log sidecar files.

use std::io::{self, Write};
use std::path::Path;

use image::RgbaImage;

use crate::model::SourceImage;
use crate::packer::AtlasLayout;

/// Header row of the placement manifest.
pub const MANIFEST_HEADER: &str = "source_tex, atlas_tex, x, y, width, height";

/// Page image file name: shared prefix plus a zero-padded three-digit index.
pub fn page_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:03}.png")
}

/// Composites one page: a transparent canvas with every placement's trimmed
/// pixels copied in. Placements never overlap, and copy (rather than
/// alpha-over) keeps fully transparent source pixels transparent on the
/// page, which mask encoding relies on.
pub fn compose_page(layout: &AtlasLayout<SourceImage>) -> RgbaImage {
    let mut canvas = RgbaImage::new(layout.width, layout.height);
    for p in &layout.placements {
        copy_region(&p.item.pixels, &mut canvas, p.bounds.x, p.bounds.y);
    }
    canvas
}

/// Copies `src` into `canvas` at `(dx, dy)`, replacing destination pixels.
pub(crate) fn copy_region(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        for xx in 0..sw {
            if dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(xx, yy));
            }
        }
    }
}

/// Appends one manifest row per placement of `layout`.
pub fn write_manifest_rows<W: Write>(
    out: &mut W,
    layout: &AtlasLayout<SourceImage>,
    atlas_name: &str,
) -> io::Result<()> {
    for p in &layout.placements {
        writeln!(
            out,
            "{}, {}, {}, {}, {}, {}",
            p.item.source.display(),
            atlas_name,
            p.bounds.x,
            p.bounds.y,
            p.bounds.w,
            p.bounds.h
        )?;
    }
    Ok(())
}

/// Writes the human-readable scan log next to the manifest.
pub fn write_pack_log(path: &Path, accepted: &[String], rejected: &[String]) -> io::Result<()> {
    let mut out = String::new();
    out.push_str("--- LOG -------------------------------------------\n");
    for line in accepted {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("--- ERROR -----------------------------------------\n");
    for line in rejected {
        out.push_str(line);
        out.push('\n');
    }
    std::fs::write(path, out)
}
