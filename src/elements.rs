//! Helpers for turning description nodes into `genpdf` elements.
//!
//! Covers image decoding (including `data:` URLs as produced by the raster
//! capture), point/millimetre conversion and style mapping.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{Alignment, Mm, Scale, Size};

use crate::model::{HorizontalAlignment, StyleDefinition};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts typographic points to millimetres.
pub fn points_to_mm(points: f64) -> f64 {
    points * MM_PER_INCH / POINTS_PER_INCH
}

/// Converts millimetres to typographic points.
pub fn mm_to_points(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

pub(crate) fn mm_from_points(points: f64) -> Mm {
    mm_from_f64(points_to_mm(points))
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Extracts the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, Error> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            Error::new(
                "Image source is not a base64 data URL",
                ErrorKind::InvalidData,
            )
        })?;

    STANDARD.decode(payload.trim()).map_err(|err| {
        Error::new(
            format!("Invalid base64 payload in image data URL: {}", err),
            ErrorKind::InvalidData,
        )
    })
}

/// Encodes PNG bytes as a `data:image/png;base64,...` URL.
pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Builds a `genpdf` image scaled to `width_points`, keeping the aspect ratio.
///
/// The alpha channel is dropped first since the PDF backend cannot embed it.
pub fn scaled_image(
    image: image::DynamicImage,
    width_points: Option<f64>,
    alignment: Alignment,
) -> Result<Image, Error> {
    let opaque = image::DynamicImage::ImageRgb8(image.to_rgb8());
    let natural = estimated_image_size(&opaque, DEFAULT_IMAGE_DPI);
    let mut element = Image::from_dynamic_image(opaque)?;
    element.set_alignment(alignment);

    if let Some(width) = width_points {
        let natural_width = mm_to_f64(natural.width);
        if natural_width > f64::EPSILON {
            let scale = points_to_mm(width) / natural_width;
            element.set_scale(Scale::new(scale, scale));
        }
    }

    Ok(element)
}

/// Maps a description alignment onto `genpdf`, which has no justified mode.
pub fn to_alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left | HorizontalAlignment::Justify => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

/// Maps a named style onto a `genpdf` style. Font sizes are rounded to whole
/// points.
pub fn to_style(definition: &StyleDefinition) -> Style {
    let mut style = Style::new();
    if let Some(size) = definition.font_size {
        style.set_font_size(size.round().clamp(1.0, f64::from(u8::MAX)) as u8);
    }
    if definition.bold == Some(true) {
        style.set_bold();
    }
    if definition.italics == Some(true) {
        style.set_italic();
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trip() {
        let url = png_data_url(&[1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(decode_data_url("https://example.com/table.png").is_err());
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }

    #[test]
    fn points_and_millimetres_convert() {
        assert!((points_to_mm(72.0) - 25.4).abs() < 1e-9);
        assert!((mm_to_points(25.4) - 72.0).abs() < 1e-9);
    }

    #[test]
    fn style_flags_are_mapped() {
        let style = to_style(&StyleDefinition::new().with_font_size(18.0).with_bold(true));
        assert!(style.is_bold());
        assert!(!style.is_italic());
        assert_eq!(style.font_size(), 18);
    }

    #[test]
    fn justify_falls_back_to_left() {
        assert_eq!(to_alignment(HorizontalAlignment::Justify), Alignment::Left);
        assert_eq!(to_alignment(HorizontalAlignment::Center), Alignment::Center);
    }
}
