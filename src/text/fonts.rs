use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;

use crate::foundation::error::{PinError, PinResult};

/// Environment variable naming an extra directory of font files.
pub const FONT_DIR_ENV: &str = "PINFORGE_FONT_DIR";

/// One concrete face chosen for a family list.
#[derive(Clone, Debug)]
pub struct FontFace {
    pub(crate) id: fontdb::ID,
    /// Family name as reported by the font file.
    pub family: String,
    /// Raw bytes of the font file (may be a collection).
    pub data: Arc<Vec<u8>>,
    /// Face index inside `data`.
    pub index: u32,
}

/// Font database used to resolve CSS-like family lists into faces.
pub struct FontBook {
    db: fontdb::Database,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontBook {
    /// A book with no faces. Useful for rendering frames without text.
    pub fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
        }
    }

    /// Load installed system fonts plus the directory named by `PINFORGE_FONT_DIR`, if set.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = std::env::var_os(FONT_DIR_ENV) {
            db.load_fonts_dir(dir);
        }
        tracing::debug!(faces = db.len(), "loaded font book");
        Self { db }
    }

    pub fn load_font_data(&mut self, bytes: Vec<u8>) {
        self.db.load_font_data(bytes);
    }

    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> PinResult<()> {
        let path = path.as_ref();
        self.db.load_font_file(path).map_err(|e| {
            PinError::font(format!("failed to load font '{}': {e}", path.display()))
        })
    }

    pub fn load_fonts_dir(&mut self, dir: impl AsRef<Path>) {
        self.db.load_fonts_dir(dir);
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Resolve a family list at bold weight, falling back to the first face in the book.
    pub fn resolve(&self, family_list: &str) -> PinResult<FontFace> {
        let names = parse_family_list(family_list);
        let families: Vec<fontdb::Family<'_>> = names.iter().map(FamilyName::as_fontdb).collect();
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };

        let id = match self.db.query(&query) {
            Some(id) => id,
            None => {
                let first = self.db.faces().next().ok_or_else(|| {
                    PinError::font(format!("no font face available for '{family_list}'"))
                })?;
                tracing::warn!(
                    families = family_list,
                    fallback = ?first.families.first().map(|(n, _)| n),
                    "font family not found; using first available face"
                );
                first.id
            }
        };
        self.face(id)
    }

    fn face(&self, id: fontdb::ID) -> PinResult<FontFace> {
        let info = self
            .db
            .face(id)
            .ok_or_else(|| PinError::font("resolved font face disappeared"))?;
        let family = info
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (Arc::new(data.to_vec()), index))
            .ok_or_else(|| PinError::font(format!("font data for '{family}' is unreadable")))?;
        Ok(FontFace {
            id,
            family,
            data,
            index,
        })
    }
}

/// One entry in a CSS-like `font-family` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FamilyName {
    Named(String),
    Serif,
    SansSerif,
    Cursive,
    Fantasy,
    Monospace,
}

impl FamilyName {
    fn as_fontdb(&self) -> fontdb::Family<'_> {
        match self {
            FamilyName::Named(n) => fontdb::Family::Name(n.as_str()),
            FamilyName::Serif => fontdb::Family::Serif,
            FamilyName::SansSerif => fontdb::Family::SansSerif,
            FamilyName::Cursive => fontdb::Family::Cursive,
            FamilyName::Fantasy => fontdb::Family::Fantasy,
            FamilyName::Monospace => fontdb::Family::Monospace,
        }
    }
}

/// Split `"Arial Black", 'Helvetica Neue', sans-serif` into family entries.
pub fn parse_family_list(list: &str) -> Vec<FamilyName> {
    list.split(',')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|name| !name.is_empty())
        .map(|name| match name.to_ascii_lowercase().as_str() {
            "serif" => FamilyName::Serif,
            "sans-serif" | "system-ui" => FamilyName::SansSerif,
            "cursive" => FamilyName::Cursive,
            "fantasy" => FamilyName::Fantasy,
            "monospace" => FamilyName::Monospace,
            _ => FamilyName::Named(name.to_owned()),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
