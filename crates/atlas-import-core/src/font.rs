//! Font sidecar parsing (`glyphs_<fontName>.csv`).
//!
//! The sheet is staged in full before anything touches the database: a file
//! with any unparseable field is rejected as a whole, after the complete
//! scan, and a pre-existing font record stays untouched.

use std::path::{Path, PathBuf};

use crate::assets::{FontAsset, Glyph};
use crate::error::{ImportError, Result};

/// Parsed contents of one sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontSheet {
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
}

impl FontSheet {
    /// Commits the sheet to a font record. Called only on a fully valid sheet.
    pub fn apply_to(&self, font: &mut FontAsset) {
        font.display_name = self.display_name.clone();
        font.em_size = self.em_size;
        font.bold = self.bold;
        font.italic = self.italic;
        font.charset = self.charset;
        font.anti_aliasing = self.anti_aliasing;
        font.scale_x = self.scale_x;
        font.scale_y = self.scale_y;
        font.range_start = self.range_start;
        font.range_end = self.range_end;
        font.glyphs = self.glyphs.clone();
    }
}

/// Path of the sidecar for `font_name` under the import directory.
pub fn sidecar_path(dir: &Path, font_name: &str) -> PathBuf {
    dir.join(format!("glyphs_{font_name}.csv"))
}

/// Parses a sidecar file. The first non-blank row holds the display
/// metadata, every following row one glyph; the glyph range derives from
/// the first and last glyph rows. Rows whose fields are all empty are
/// skipped. Parse errors are collected across the whole file and reported
/// once at the end.
pub fn parse_font_sheet(path: &Path) -> Result<FontSheet> {
    let content = std::fs::read_to_string(path)?;
    let file = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut sheet = FontSheet::default();
    let mut saw_header = false;
    let mut had_error = false;

    for line in content.lines() {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let ok = if saw_header {
            parse_glyph_row(&fields, &mut sheet)
        } else {
            saw_header = true;
            parse_header_row(&fields, &mut sheet)
        };
        if !ok {
            had_error = true;
        }
    }

    if !saw_header || had_error {
        return Err(ImportError::FontSidecar { file });
    }
    Ok(sheet)
}

fn parse_header_row(fields: &[&str], sheet: &mut FontSheet) -> bool {
    let Some(result) = header_fields(fields) else {
        return false;
    };
    let (display_name, em_size, bold, italic, charset, anti_aliasing, scale_x, scale_y) = result;
    sheet.display_name = display_name;
    sheet.em_size = em_size;
    sheet.bold = bold;
    sheet.italic = italic;
    sheet.charset = charset;
    sheet.anti_aliasing = anti_aliasing;
    sheet.scale_x = scale_x;
    sheet.scale_y = scale_y;
    true
}

#[allow(clippy::type_complexity)]
fn header_fields(fields: &[&str]) -> Option<(String, u16, bool, bool, u8, u8, u16, u16)> {
    if fields.len() < 8 {
        return None;
    }
    Some((
        fields[0].replace('"', ""),
        fields[1].trim().parse().ok()?,
        parse_bool(fields[2])?,
        parse_bool(fields[3])?,
        fields[4].trim().parse().ok()?,
        fields[5].trim().parse().ok()?,
        fields[6].trim().parse().ok()?,
        fields[7].trim().parse().ok()?,
    ))
}

fn parse_glyph_row(fields: &[&str], sheet: &mut FontSheet) -> bool {
    let Some(glyph) = glyph_fields(fields) else {
        return false;
    };
    if sheet.glyphs.is_empty() {
        sheet.range_start = glyph.character;
    }
    sheet.range_end = glyph.character as u32;
    sheet.glyphs.push(glyph);
    true
}

fn glyph_fields(fields: &[&str]) -> Option<Glyph> {
    if fields.len() < 7 {
        return None;
    }
    Some(Glyph {
        character: fields[0].trim().parse().ok()?,
        source_x: fields[1].trim().parse().ok()?,
        source_y: fields[2].trim().parse().ok()?,
        source_width: fields[3].trim().parse().ok()?,
        source_height: fields[4].trim().parse().ok()?,
        shift: fields[5].trim().parse().ok()?,
        offset: fields[6].trim().parse().ok()?,
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    s.trim().to_ascii_lowercase().parse().ok()
}
