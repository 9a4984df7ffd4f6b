use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::assets::SpriteAsset;

/// Best-fit heuristics for choosing which rectangle lands in a free node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FitHeuristic {
    /// Maximize placed area / node area.
    Area,
    /// Maximize the larger of the width and height ratios.
    MaxOneAxis,
}

impl FromStr for FitHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area" => Ok(Self::Area),
            "max_one_axis" | "maxoneaxis" => Ok(Self::MaxOneAxis),
            _ => Err(()),
        }
    }
}

/// Import pipeline configuration.
///
/// Field names follow the camelCase keys of the JSON/YAML config file
/// (`searchPattern`, `textureSize`, `changeProps`, ...). Every field except
/// `directory` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    /// Root folder to scan for source images.
    pub directory: String,
    /// Wildcard matched against file names during the scan.
    #[serde(default = "default_search_pattern")]
    pub search_pattern: String,
    /// Atlas page width and height in pixels (pages are square).
    #[serde(default = "default_texture_size")]
    pub texture_size: u32,
    /// Pixels left free between packed images.
    #[serde(default = "default_padding")]
    pub padding_between_images: u32,
    /// Import images from unrecognized folders as sprites instead of skipping them.
    #[serde(default)]
    pub import_unknown_as_sprite: bool,
    /// Pattern capturing a sprite base name and an optional trailing frame index.
    #[serde(default = "default_frame_regex")]
    pub spr_frame_regex: String,
    /// Folder receiving the page images, the manifest and the scan log.
    #[serde(default = "default_temp_folder")]
    pub temp_folder: String,
    /// Log skip decisions for unknown-folder images.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_fit_heuristic")]
    pub fit_heuristic: FitHeuristic,
    /// Per-asset property overrides, keyed by sprite name. Values are parsed
    /// lazily so a malformed override only fails its own asset.
    #[serde(default)]
    pub change_props: HashMap<String, serde_json::Value>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            directory: String::new(),
            search_pattern: default_search_pattern(),
            texture_size: default_texture_size(),
            padding_between_images: default_padding(),
            import_unknown_as_sprite: false,
            spr_frame_regex: default_frame_regex(),
            temp_folder: default_temp_folder(),
            debug: false,
            fit_heuristic: default_fit_heuristic(),
            change_props: HashMap::new(),
        }
    }
}

fn default_search_pattern() -> String {
    "*.png".into()
}
fn default_texture_size() -> u32 {
    2048
}
fn default_padding() -> u32 {
    2
}
fn default_frame_regex() -> String {
    r"^(.+?)(?:_(\d+))$".into()
}
fn default_temp_folder() -> String {
    "graphics-temp/".into()
}
fn default_fit_heuristic() -> FitHeuristic {
    FitHeuristic::Area
}

impl ImportConfig {
    /// Validates the configuration before any scanning or packing starts.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ImportError;

        if self.directory.is_empty() {
            return Err(ImportError::InvalidConfig("directory is not set".into()));
        }
        if self.texture_size == 0 {
            return Err(ImportError::InvalidConfig(
                "textureSize must be at least 1".into(),
            ));
        }
        if self.search_pattern.is_empty() {
            return Err(ImportError::InvalidConfig(
                "searchPattern must not be empty".into(),
            ));
        }
        self.frame_regex()?;
        Ok(())
    }

    /// Compiles `spr_frame_regex`.
    pub fn frame_regex(&self) -> crate::error::Result<Regex> {
        Regex::new(&self.spr_frame_regex).map_err(|e| crate::error::ImportError::InvalidRegex {
            pattern: self.spr_frame_regex.clone(),
            reason: e.to_string(),
        })
    }

    /// Create a fluent builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder::new()
    }
}

/// Builder for `ImportConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct ImportConfigBuilder {
    cfg: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: ImportConfig::default(),
        }
    }
    pub fn directory(mut self, v: impl Into<String>) -> Self {
        self.cfg.directory = v.into();
        self
    }
    pub fn search_pattern(mut self, v: impl Into<String>) -> Self {
        self.cfg.search_pattern = v.into();
        self
    }
    pub fn texture_size(mut self, v: u32) -> Self {
        self.cfg.texture_size = v;
        self
    }
    pub fn padding_between_images(mut self, v: u32) -> Self {
        self.cfg.padding_between_images = v;
        self
    }
    pub fn import_unknown_as_sprite(mut self, v: bool) -> Self {
        self.cfg.import_unknown_as_sprite = v;
        self
    }
    pub fn spr_frame_regex(mut self, v: impl Into<String>) -> Self {
        self.cfg.spr_frame_regex = v.into();
        self
    }
    pub fn temp_folder(mut self, v: impl Into<String>) -> Self {
        self.cfg.temp_folder = v.into();
        self
    }
    pub fn debug(mut self, v: bool) -> Self {
        self.cfg.debug = v;
        self
    }
    pub fn fit_heuristic(mut self, v: FitHeuristic) -> Self {
        self.cfg.fit_heuristic = v;
        self
    }
    pub fn change_prop(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.cfg.change_props.insert(name.into(), value);
        self
    }
    pub fn build(self) -> ImportConfig {
        self.cfg
    }
}

/// Typed shape of one `changeProps` entry. Parsed from the raw JSON value
/// when the override is applied, so one malformed entry only fails its asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyOverride {
    #[serde(default)]
    pub size: Option<SizeOverride>,
    #[serde(default)]
    pub margin: Option<MarginOverride>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub origin: Option<OriginOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeOverride {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginOverride {
    #[serde(default)]
    pub left: Option<i32>,
    #[serde(default)]
    pub right: Option<i32>,
    #[serde(default)]
    pub top: Option<i32>,
    #[serde(default)]
    pub bottom: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginOverride {
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
}

impl PropertyOverride {
    /// Applies the override to a sprite. Runs after all structural updates
    /// for the placement, so explicit values always win.
    pub fn apply_to(&self, sprite: &mut SpriteAsset) {
        if let Some(size) = &self.size {
            if let Some(w) = size.width {
                sprite.width = w;
            }
            if let Some(h) = size.height {
                sprite.height = h;
            }
        }
        if let Some(margin) = &self.margin {
            if let Some(l) = margin.left {
                sprite.margin_left = l;
            }
            if let Some(r) = margin.right {
                sprite.margin_right = r;
            }
            if let Some(t) = margin.top {
                sprite.margin_top = t;
            }
            if let Some(b) = margin.bottom {
                sprite.margin_bottom = b;
            }
            // Margins must stay ordered.
            if sprite.margin_right < sprite.margin_left {
                sprite.margin_right = sprite.margin_left;
            }
            if sprite.margin_bottom < sprite.margin_top {
                sprite.margin_bottom = sprite.margin_top;
            }
        }
        if let Some(t) = self.transparent {
            sprite.transparent = t;
        }
        if let Some(origin) = &self.origin {
            if let Some(x) = origin.x {
                sprite.origin_x = x;
            }
            if let Some(y) = origin.y {
                sprite.origin_y = y;
            }
        }
    }
}
