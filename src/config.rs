//! Process-wide report configuration.
//!
//! Built once at start-up and passed by reference; nothing mutates it after
//! construction.

use std::path::Path;

use serde::Deserialize;

use crate::assembler::{DocumentTemplate, DEFAULT_SNAPSHOT_WIDTH};
use crate::builder::PdfRenderer;
use crate::capture::GlyphRasterizer;
use crate::error::{ReportError, Result};
use crate::fonts::FontFamilyDescriptor;
use crate::model::DocumentDescription;

/// Template, font registry and snapshot settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    template: DocumentTemplate,
    fonts: FontFamilyDescriptor,
    snapshot_width: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    fonts: Option<FontFamilyDescriptor>,
    template: Option<DocumentDescription>,
    snapshot_width: Option<f64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            template: DocumentTemplate::default(),
            fonts: FontFamilyDescriptor::default(),
            snapshot_width: DEFAULT_SNAPSHOT_WIDTH,
        }
    }
}

impl ReportConfig {
    /// Parses a configuration override. Every key is optional; a missing
    /// template falls back to the look-ahead template in the configured font.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|err| ReportError::Config(err.to_string()))?;

        let fonts = raw.fonts.unwrap_or_default();
        let template = match raw.template {
            Some(description) => DocumentTemplate::from_description(description)?,
            None => DocumentTemplate::look_ahead(fonts.name.clone()),
        };

        Self::default()
            .with_fonts(fonts)
            .with_template(template)
            .with_snapshot_width(raw.snapshot_width.unwrap_or(DEFAULT_SNAPSHOT_WIDTH))
            .validated()
    }

    /// Reads a configuration override from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Replaces the template and returns the updated configuration.
    pub fn with_template(mut self, template: DocumentTemplate) -> Self {
        self.template = template;
        self
    }

    /// Replaces the font family and returns the updated configuration.
    pub fn with_fonts(mut self, fonts: FontFamilyDescriptor) -> Self {
        self.fonts = fonts;
        self
    }

    /// Sets the snapshot image width in points.
    pub fn with_snapshot_width(mut self, width: f64) -> Self {
        self.snapshot_width = width;
        self
    }

    /// Checks that the template font is registered and the snapshot width is
    /// usable.
    pub fn validated(self) -> Result<Self> {
        if self.template.font_family() != self.fonts.name {
            return Err(ReportError::UnknownFont {
                requested: self.template.font_family().to_string(),
                registered: self.fonts.name.clone(),
            });
        }
        if !self.snapshot_width.is_finite() || self.snapshot_width <= 0.0 {
            return Err(ReportError::Config(format!(
                "snapshotWidth must be a positive number, got {}",
                self.snapshot_width
            )));
        }
        Ok(self)
    }

    /// Template every export is assembled from.
    pub fn template(&self) -> &DocumentTemplate {
        &self.template
    }

    /// Registered font family.
    pub fn fonts(&self) -> &FontFamilyDescriptor {
        &self.fonts
    }

    /// Width of the embedded snapshot image in points.
    pub fn snapshot_width(&self) -> f64 {
        self.snapshot_width
    }

    /// Structured renderer for the configured font family.
    pub fn renderer(&self) -> PdfRenderer {
        PdfRenderer::new(self.fonts.clone())
    }

    /// Rasterizer using the regular variant of the configured font family.
    pub fn rasterizer(&self) -> Result<GlyphRasterizer> {
        GlyphRasterizer::from_family(&self.fonts)
    }
}
