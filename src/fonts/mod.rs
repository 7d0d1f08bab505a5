//! Font registry and font file discovery.
//!
//! The report names its font family in the document's default style; the
//! [`FontFamilyDescriptor`] maps that name to the four files of the family,
//! mirroring the `fonts` registry of pdfmake. Files are searched in:
//!
//! 1. the directory named by `LOOKAHEAD_FONTS_DIR`,
//! 2. `assets/fonts` next to the running executable,
//! 3. `assets/fonts` in this crate's manifest directory.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use serde::{Deserialize, Serialize};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable overriding the font directory.
pub const FONTS_DIR_ENV: &str = "LOOKAHEAD_FONTS_DIR";

/// A font family and the files backing its four variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFamilyDescriptor {
    /// Family name referenced by `defaultStyle.font`.
    pub name: String,
    /// Regular variant file name.
    pub normal: String,
    /// Bold variant file name.
    pub bold: String,
    /// Italic variant file name.
    pub italics: String,
    /// Bold italic variant file name.
    pub bolditalics: String,
}

impl Default for FontFamilyDescriptor {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_FAMILY_NAME.to_string(),
            normal: "Roboto-Regular.ttf".to_string(),
            bold: "Roboto-Bold.ttf".to_string(),
            italics: "Roboto-Italic.ttf".to_string(),
            bolditalics: "Roboto-BoldItalic.ttf".to_string(),
        }
    }
}

impl FontFamilyDescriptor {
    fn files(&self) -> [(&'static str, &str); 4] {
        [
            ("normal", self.normal.as_str()),
            ("bold", self.bold.as_str()),
            ("italics", self.italics.as_str()),
            ("bolditalics", self.bolditalics.as_str()),
        ]
    }
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = env::var(FONTS_DIR_ENV) {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path, family: &FontFamilyDescriptor) -> Vec<String> {
    family
        .files()
        .into_iter()
        .filter(|(_, file)| !path.join(file).is_file())
        .map(|(_, file)| file.to_string())
        .collect()
}

/// Returns the first directory holding all four files of the family.
pub fn resolve_font_directory(family: &FontFamilyDescriptor) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate, family);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            format!("directory missing at {}", candidate.display())
        } else {
            format!("missing files [{}]", missing.join(", "))
        };
        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    let summary = if attempts.is_empty() {
        "no search paths were available".to_owned()
    } else {
        attempts.join(", ")
    };

    Err(Error::new(
        format!(
            "Unable to locate fonts for family '{}'. Checked: {}. See assets/fonts/README.md or set {}.",
            family.name, summary, FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

fn load_variant(directory: &Path, file: &str, variant: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load {} font at {}: {}",
                variant,
                path.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Loads the four variants of the family for `genpdf`.
pub fn load_font_family(family: &FontFamilyDescriptor) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory(family)?;

    Ok(FontFamily {
        regular: load_variant(&directory, &family.normal, "regular")?,
        bold: load_variant(&directory, &family.bold, "bold")?,
        italic: load_variant(&directory, &family.italics, "italic")?,
        bold_italic: load_variant(&directory, &family.bolditalics, "bold italic")?,
    })
}

/// Reads the raw bytes of the regular variant, used for raster capture.
pub fn load_regular_font_bytes(family: &FontFamilyDescriptor) -> Result<Vec<u8>, Error> {
    let directory = resolve_font_directory(family)?;
    let path = directory.join(&family.normal);
    std::fs::read(&path).map_err(|err| {
        Error::new(
            format!("Failed to read font file {}", path.display()),
            err,
        )
    })
}

/// Indicates whether all files of the family can be found.
pub fn fonts_available(family: &FontFamilyDescriptor) -> bool {
    resolve_font_directory(family).is_ok()
}
