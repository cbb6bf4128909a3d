//! Locating a font that can render Persian text.

use super::truetype_parser::FontProgram;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Font files tried, in order of preference.
pub const FONT_CANDIDATES: &[&str] = &[
    "Vazir.ttf",
    "Vazir-Regular.ttf",
    "BNazanin.ttf",
    "B-Nazanin.ttf",
    "Sahel.ttf",
    "IRANSans.ttf",
    "XB Niloofar.ttf",
];

/// Directories searched for candidates. `""` is the working directory.
const SEARCH_DIRS: &[&str] = &[
    "",
    "fonts",
    "C:/Windows/Fonts",
    "/usr/share/fonts/truetype",
    "/usr/share/fonts/truetype/vazir-font",
    "/usr/local/share/fonts",
    "/System/Library/Fonts",
    "/Library/Fonts",
];

/// The font every payslip is drawn with.
#[derive(Debug, Clone)]
pub enum FontResource {
    /// Base-14 Helvetica; only Latin-1 text renders
    Builtin,
    /// TrueType program embedded into each document
    Embedded(Arc<FontProgram>),
}

impl FontResource {
    /// Resolve the font once at start-up.
    ///
    /// An explicit path wins when it parses. Otherwise the well-known
    /// candidates are probed; with nothing usable the builtin font is
    /// returned and a warning logged.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            match FontProgram::from_file(path) {
                Ok(program) => {
                    log::info!("Using font {}", path.display());
                    return FontResource::Embedded(Arc::new(program));
                },
                Err(e) => log::warn!("Cannot use font {}: {}", path.display(), e),
            }
        }

        for path in candidate_paths() {
            if !path.is_file() {
                continue;
            }
            match FontProgram::from_file(&path) {
                Ok(program) => {
                    log::info!("Using font {}", path.display());
                    return FontResource::Embedded(Arc::new(program));
                },
                Err(e) => log::warn!("Skipping font {}: {}", path.display(), e),
            }
        }

        log::warn!(
            "No Persian font found (tried {}); falling back to Helvetica, non-Latin text will not render",
            FONT_CANDIDATES.join(", ")
        );
        FontResource::Builtin
    }

    /// True when a TrueType program will be embedded.
    pub fn is_embedded(&self) -> bool {
        matches!(self, FontResource::Embedded(_))
    }
}

/// Every (directory, candidate) combination, in probe order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = SEARCH_DIRS.iter().map(PathBuf::from).collect();
    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        dirs.insert(dirs.len() - 2, Path::new(&home).join(".fonts"));
    }

    dirs.iter()
        .flat_map(|dir| FONT_CANDIDATES.iter().map(move |name| dir.join(name)))
        .collect()
}
