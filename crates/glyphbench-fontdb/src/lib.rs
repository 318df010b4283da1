//! Fonts for glyphbench: loading, family lookup, and one shared default
//!
//! Fonts store their raw data and create a `FontRef` on demand for parsing,
//! which keeps TTC collections (several faces, one file) working.
//!
//! The benchmarks want one font for the whole process. [`shared_font`] and
//! [`shared_default_font`] find it on first use and hand out the same `Arc`
//! afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use read_fonts::{FileRef, FontRef as ReadFontRef, TableProvider};
use skrifa::{string::StringId, MetadataProvider};
use walkdir::WalkDir;

use glyphbench_core::{
    config::DEFAULT_FAMILY,
    error::{FontLoadError, Result},
    traits::FontRef,
    types::GlyphId,
};

/// Families tried, in order, when nothing else is asked for
pub const FALLBACK_FAMILIES: [&str; 5] = [
    DEFAULT_FAMILY,
    "Liberation Sans",
    "DejaVu Sans",
    "Helvetica",
    "Noto Sans",
];

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// A font that's been brought into memory, ready to shape text
pub struct Font {
    data: Vec<u8>,
    face_index: u32,
    units_per_em: u16,
}

impl Font {
    /// Opens a font file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_index(path, 0)
    }

    /// Opens a specific face from a font file (for TTC collections)
    pub fn from_file_index(path: impl AsRef<Path>, face_index: u32) -> Result<Self> {
        let data = fs::read(path.as_ref())
            .map_err(|_| FontLoadError::FileNotFound(path.as_ref().display().to_string()))?;

        Self::from_data_index(data, face_index)
    }

    /// Turns raw font bytes into something we can work with
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    /// Turns raw font bytes into a specific face (for TTC collections)
    pub fn from_data_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let font_ref =
            ReadFontRef::from_index(&data, face_index).map_err(|_| FontLoadError::InvalidData)?;

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .map_err(|_| FontLoadError::InvalidData)?;
        if units_per_em == 0 {
            return Err(FontLoadError::InvalidData.into());
        }

        Ok(Font {
            data,
            face_index,
            units_per_em,
        })
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    fn font_ref(&self) -> Option<ReadFontRef<'_>> {
        ReadFontRef::from_index(&self.data, self.face_index).ok()
    }

    /// The family name from the `name` table, English when there is one
    pub fn family_name(&self) -> Option<String> {
        family_name_of(&self.data, self.face_index)
    }

    /// Finds which glyph draws this character
    pub fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.font_ref()
            .and_then(|font| font.cmap().ok()?.map_codepoint(ch).map(|gid| gid.to_u32()))
    }

    /// Advance of a glyph in font units
    pub fn advance_width(&self, glyph_id: GlyphId) -> f32 {
        self.font_ref()
            .and_then(|font| {
                let hmtx = font.hmtx().ok()?;
                let advance = hmtx.advance(read_fonts::types::GlyphId::new(glyph_id))?;
                Some(advance as f32)
            })
            .unwrap_or(self.units_per_em as f32 / 2.0)
    }

    pub fn glyph_count(&self) -> Option<u32> {
        self.font_ref()
            .and_then(|font| font.maxp().ok().map(|maxp| maxp.num_glyphs() as u32))
    }
}

impl FontRef for Font {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn face_index(&self) -> u32 {
        self.face_index
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.glyph_id(ch)
    }

    fn advance_width(&self, glyph_id: GlyphId) -> f32 {
        self.advance_width(glyph_id)
    }

    fn glyph_count(&self) -> Option<u32> {
        self.glyph_count()
    }
}

fn family_name_of(data: &[u8], face_index: u32) -> Option<String> {
    let font = skrifa::FontRef::from_index(data, face_index).ok()?;
    [StringId::TYPOGRAPHIC_FAMILY_NAME, StringId::FAMILY_NAME]
        .into_iter()
        .find_map(|id| {
            font.localized_strings(id)
                .english_or_first()
                .map(|name| name.to_string())
        })
}

/// Number of faces in a font file, 0 when it isn't one
fn face_count(data: &[u8]) -> u32 {
    match FileRef::new(data) {
        Ok(FileRef::Font(_)) => 1,
        Ok(FileRef::Collection(collection)) => collection.len(),
        Err(_) => 0,
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Directories the platform keeps installed fonts in
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
    } else if cfg!(target_os = "windows") {
        let root = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
        dirs.push(PathBuf::from(root).join("Fonts"));
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        if cfg!(target_os = "macos") {
            dirs.push(home.join("Library/Fonts"));
        } else {
            dirs.push(home.join(".fonts"));
            dirs.push(home.join(".local/share/fonts"));
        }
    }

    dirs
}

/// Your font library: keeps track of all loaded fonts
pub struct FontDatabase {
    fonts: Vec<Arc<Font>>,
    /// Maps canonical paths to their loaded fonts
    path_cache: HashMap<PathBuf, Arc<Font>>,
    default_font: Option<Arc<Font>>,
    search_dirs: Vec<PathBuf>,
}

impl FontDatabase {
    /// An empty library searching the platform font directories
    pub fn new() -> Self {
        Self::with_search_dirs(system_font_dirs())
    }

    /// An empty library searching only `dirs`
    pub fn with_search_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            fonts: Vec::new(),
            path_cache: HashMap::new(),
            default_font: None,
            search_dirs: dirs,
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Loads a font file, or returns the one already loaded from that path
    pub fn load_font(&mut self, path: impl AsRef<Path>) -> Result<Arc<Font>> {
        let path = path.as_ref();
        let cache_key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(font) = self.path_cache.get(&cache_key) {
            return Ok(font.clone());
        }

        let font = Arc::new(Font::from_file(path)?);
        log::info!("Loaded font {}", path.display());
        self.path_cache.insert(cache_key, font.clone());
        self.remember(font.clone());

        Ok(font)
    }

    /// Adds a font from memory to the library
    pub fn load_font_data(&mut self, data: Vec<u8>) -> Result<Arc<Font>> {
        let font = Arc::new(Font::from_data(data)?);
        self.remember(font.clone());
        Ok(font)
    }

    fn remember(&mut self, font: Arc<Font>) {
        self.fonts.push(font.clone());
        if self.default_font.is_none() {
            self.default_font = Some(font);
        }
    }

    /// Scans the search directories for a face whose family is `family`
    ///
    /// Names compare case-insensitively. The first matching face wins and is
    /// loaded into the library.
    pub fn find_family(&mut self, family: &str) -> Result<Arc<Font>> {
        let hit = self
            .search_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .flat_map(|dir| WalkDir::new(dir).follow_links(true).into_iter())
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_font_file(entry.path()))
            .find_map(|entry| {
                let data = fs::read(entry.path()).ok()?;
                let index = (0..face_count(&data)).find(|&index| {
                    family_name_of(&data, index)
                        .is_some_and(|name| name.eq_ignore_ascii_case(family))
                })?;
                Some((entry.into_path(), data, index))
            });

        let Some((path, data, index)) = hit else {
            return Err(FontLoadError::SystemFontNotFound(family.to_string()).into());
        };

        log::info!("Found family {} at {} (face {})", family, path.display(), index);
        let font = Arc::new(Font::from_data_index(data, index)?);
        self.path_cache.insert(path, font.clone());
        self.remember(font.clone());
        Ok(font)
    }

    /// First family of `families` that is installed
    pub fn find_any_family(&mut self, families: &[&str]) -> Result<Arc<Font>> {
        for family in families {
            match self.find_family(family) {
                Ok(font) => return Ok(font),
                Err(e) => log::warn!("{}", e),
            }
        }
        Err(FontLoadError::SystemFontNotFound(families.join(", ")).into())
    }

    /// Returns the font we fall back to when nothing else is specified
    pub fn default_font(&self) -> Option<Arc<Font>> {
        self.default_font.clone()
    }

    pub fn fonts(&self) -> &[Arc<Font>] {
        &self.fonts
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }
}

impl Default for FontDatabase {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED_DEFAULT: OnceLock<Option<Arc<Font>>> = OnceLock::new();

/// The process-wide default font
///
/// The first call searches the system for [`FALLBACK_FAMILIES`]; every later
/// call returns the same font, or the same failure.
pub fn shared_default_font() -> Result<Arc<Font>> {
    SHARED_DEFAULT
        .get_or_init(|| {
            FontDatabase::new()
                .find_any_family(&FALLBACK_FAMILIES)
                .ok()
        })
        .clone()
        .ok_or_else(|| FontLoadError::SystemFontNotFound(FALLBACK_FAMILIES.join(", ")).into())
}

type FamilyHandles = RwLock<HashMap<String, Option<Arc<Font>>>>;

static SHARED_FAMILIES: OnceLock<FamilyHandles> = OnceLock::new();

/// The process-wide font for `family`, matched case-insensitively
///
/// Each family is searched for once; later calls get the same `Arc`, and a
/// family that wasn't found stays not found.
pub fn shared_font(family: &str) -> Result<Arc<Font>> {
    let handles = SHARED_FAMILIES.get_or_init(|| RwLock::new(HashMap::new()));
    let key = family.to_lowercase();

    if let Some(entry) = handles.read().get(&key) {
        return entry
            .clone()
            .ok_or_else(|| FontLoadError::SystemFontNotFound(family.to_string()).into());
    }

    let mut handles = handles.write();
    let entry = handles.entry(key).or_insert_with(|| {
        let found = FontDatabase::new().find_family(family);
        if let Err(ref e) = found {
            log::debug!("{}", e);
        }
        found.ok()
    });
    entry
        .clone()
        .ok_or_else(|| FontLoadError::SystemFontNotFound(family.to_string()).into())
}
