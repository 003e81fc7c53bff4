//! Page sizes and property maps.

use crate::error::{Error, Result};

/// A page format identified by a CSS class on the page element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSize {
    /// Class name without the leading dot, e.g. `A5Portrait`.
    pub name: String,
    pub height_mm: f64,
    pub width_mm: f64,
}

impl PageSize {
    pub fn new(name: impl Into<String>, height_mm: f64, width_mm: f64) -> Self {
        Self {
            name: name.into(),
            height_mm,
            width_mm,
        }
    }
}

/// Page formats known to the legacy layout, as (class, height, width) in mm.
const BUILTIN_PAGE_SIZES: &[(&str, f64, f64)] = &[
    ("A5Portrait", 210.0, 148.0),
    ("A5Landscape", 148.0, 210.0),
    ("A4Landscape", 210.0, 297.0),
    ("A4Portrait", 297.0, 210.0),
    ("A3Landscape", 297.0, 420.0),
    ("A3Portrait", 420.0, 297.0),
    ("A6Portrait", 148.0, 105.0),
    ("A6Landscape", 105.0, 148.0),
    ("Cm13Landscape", 130.0, 130.0),
    ("Device16x9Portrait", 177.777_777_78, 100.0),
    ("Device16x9Landscape", 100.0, 177.777_777_78),
    ("PictureStoryLandscape", 100.0, 177.777_777_78),
];

/// The four legacy geometry properties of an absolutely positioned margin box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Left,
    Top,
    Height,
    Width,
}

impl Geometry {
    pub fn from_property(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Geometry::Left),
            "top" => Some(Geometry::Top),
            "height" => Some(Geometry::Height),
            "width" => Some(Geometry::Width),
            _ => None,
        }
    }
}

/// Legacy property → margin variable names for one kind of page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMap {
    pub left: &'static str,
    pub top: &'static str,
    pub height: &'static str,
    pub width: &'static str,
}

impl PropertyMap {
    /// Interior pages.
    pub const PAGE: PropertyMap = PropertyMap {
        left: "--page-margin-left",
        top: "--page-margin-top",
        height: "--page-margin-bottom",
        width: "--page-margin-right",
    };

    /// Cover pages. Only the vertical margins use their own variables.
    pub const COVER: PropertyMap = PropertyMap {
        left: "--page-margin-left",
        top: "--cover-margin-top",
        height: "--cover-margin-bottom",
        width: "--page-margin-right",
    };

    pub fn get(&self, geometry: Geometry) -> &'static str {
        match geometry {
            Geometry::Left => self.left,
            Geometry::Top => self.top,
            Geometry::Height => self.height,
            Geometry::Width => self.width,
        }
    }
}

/// Position of a margin variable in a rewritten rule: top, bottom, left,
/// right. Unknown names sort last.
pub fn variable_rank(name: &str) -> usize {
    match name {
        "--cover-margin-top" | "--page-margin-top" => 0,
        "--cover-margin-bottom" | "--page-margin-bottom" => 1,
        "--page-margin-left" => 2,
        "--page-margin-right" => 3,
        _ => usize::MAX,
    }
}

/// Everything the engine needs besides the stylesheet itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationConfig {
    /// Looked up in order; the first size whose class a rule mentions wins.
    pub page_sizes: Vec<PageSize>,
    pub page_map: PropertyMap,
    pub cover_map: PropertyMap,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            page_sizes: BUILTIN_PAGE_SIZES
                .iter()
                .map(|&(name, height, width)| PageSize::new(name, height, width))
                .collect(),
            page_map: PropertyMap::PAGE,
            cover_map: PropertyMap::COVER,
        }
    }
}

impl MigrationConfig {
    /// Add page sizes after the built-in ones. A leading `.` on a name is
    /// accepted and dropped.
    pub fn with_page_sizes(mut self, sizes: impl IntoIterator<Item = PageSize>) -> Result<Self> {
        for mut size in sizes {
            if let Some(stripped) = size.name.strip_prefix('.') {
                size.name = stripped.to_string();
            }
            if size.name.is_empty() {
                return Err(Error::InvalidConfig("page size with empty name".into()));
            }
            if !(size.height_mm > 0.0 && size.width_mm > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "page size {} must have positive dimensions",
                    size.name
                )));
            }
            self.page_sizes.push(size);
        }
        Ok(self)
    }

    /// Built-in sizes plus those listed in a JSON file
    /// (`[{"name": "...", "height_mm": 0, "width_mm": 0}, ...]`).
    #[cfg(feature = "cli")]
    pub fn with_page_sizes_file(self, path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let sizes: Vec<PageSize> = serde_json::from_str(&json)?;
        self.with_page_sizes(sizes)
    }

    pub fn property_map(&self, cover: bool) -> &PropertyMap {
        if cover { &self.cover_map } else { &self.page_map }
    }
}
