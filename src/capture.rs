//! On-screen table view and raster capture of that view.
//!
//! Capturing is a two-phase operation: [`render_table`] produces a
//! [`RenderedTable`], and only a rendered table can be handed to a
//! [`RasterCapture`]. The capture therefore always sees a fully populated
//! table.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use log::debug;
use rusttype::{point, Font, Scale};

use crate::elements::png_data_url;
use crate::error::{ReportError, Result};
use crate::fonts::{self, FontFamilyDescriptor};
use crate::schedule::{FlatMilestoneRecord, MilestoneStatus};
use crate::table::{display_rows, DisplayRow, COLUMN_HEADERS, STATUS_COLUMN};

const ADAPTER: &str = "raster capture";

const STATUS_CHIP_CLASS: &str = "status-chip";

const PAGE_STYLE: &str = "table{border-collapse:collapse;font-family:sans-serif}\
th,td{padding:4px 8px;border-bottom:1px solid #ddd;text-align:left}\
th{background:#f2f2f2}\
.status-chip{display:inline-block;padding:2px 8px;border-radius:12px;background:#e8e8e8}\
.status-chip.in-progress{background:#d6e9ff}";

/// The on-screen table after it has been populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedTable {
    rows: Vec<DisplayRow>,
}

/// Populates the on-screen table with the given records.
pub fn render_table(records: &[FlatMilestoneRecord]) -> RenderedTable {
    RenderedTable {
        rows: display_rows(records),
    }
}

impl RenderedTable {
    /// Column titles.
    pub fn header(&self) -> &[&'static str] {
        &COLUMN_HEADERS
    }

    /// Data rows in display order.
    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    /// Renders the table as an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div id=\"divToPrint\"><table><thead><tr>");
        for title in COLUMN_HEADERS {
            html.push_str("<th>");
            html.push_str(&escape(title));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead><tbody>");

        for row in &self.rows {
            html.push_str("<tr>");
            for (column, cell) in row.cells().iter().enumerate() {
                html.push_str("<td>");
                if column == STATUS_COLUMN {
                    let modifier = if is_in_progress(row) { " in-progress" } else { "" };
                    html.push_str(&format!(
                        "<div class=\"{}{}\">{}</div>",
                        STATUS_CHIP_CLASS,
                        modifier,
                        escape(&cell.text())
                    ));
                } else {
                    html.push_str(&escape(&cell.text()));
                }
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }

        html.push_str("</tbody></table></div>");
        html
    }

    /// Renders a standalone HTML page containing the table.
    pub fn to_html_document(&self, title: &str) -> String {
        format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title>\
             <style>{}</style></head><body><h1>{}</h1>{}</body></html>",
            escape(title),
            PAGE_STYLE,
            escape(title),
            self.to_html()
        )
    }
}

fn is_in_progress(row: &DisplayRow) -> bool {
    row.status().text() == MilestoneStatus::InProgress.label()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Bitmap captured from a rendered table.
#[derive(Clone, Debug)]
pub struct Snapshot {
    image: RgbImage,
}

impl Snapshot {
    /// Wraps a captured bitmap.
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns the bitmap.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encodes the bitmap as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(self.image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .map_err(|err| ReportError::render_adapter("image", "PNG encoding failed", err))?;
        Ok(bytes)
    }

    /// Encodes the bitmap as a PNG `data:` URL.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(png_data_url(&self.to_png()?))
    }
}

/// Converts a rendered table into a bitmap.
pub trait RasterCapture {
    /// Captures the table.
    fn capture(&self, table: &RenderedTable) -> Result<Snapshot>;
}

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const HEADER_BACKGROUND: Rgb<u8> = Rgb([242, 242, 242]);
const RULE: Rgb<u8> = Rgb([221, 221, 221]);
const TEXT: Rgb<u8> = Rgb([33, 33, 33]);
const CHIP_IN_PROGRESS: Rgb<u8> = Rgb([214, 233, 255]);
const CHIP_NOT_STARTED: Rgb<u8> = Rgb([232, 232, 232]);

/// Draws the table with a TrueType font.
pub struct GlyphRasterizer {
    font: Font<'static>,
    font_size: f32,
    padding: u32,
}

impl GlyphRasterizer {
    /// Default glyph height in pixels.
    pub const DEFAULT_FONT_SIZE: f32 = 16.0;

    /// Default cell padding in pixels.
    pub const DEFAULT_PADDING: u32 = 8;

    /// Creates a rasterizer from TrueType font data.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = Font::try_from_vec(data)
            .ok_or_else(|| ReportError::render_rejected(ADAPTER, "font data is not a valid font"))?;
        Ok(Self {
            font,
            font_size: Self::DEFAULT_FONT_SIZE,
            padding: Self::DEFAULT_PADDING,
        })
    }

    /// Creates a rasterizer from the regular variant of a registered family.
    pub fn from_family(family: &FontFamilyDescriptor) -> Result<Self> {
        let data = fonts::load_regular_font_bytes(family).map_err(ReportError::FontLoad)?;
        Self::from_bytes(data)
    }

    /// Sets the glyph height in pixels and returns the updated rasterizer.
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the cell padding in pixels and returns the updated rasterizer.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    fn scale(&self) -> Scale {
        Scale::uniform(self.font_size)
    }

    fn text_width(&self, text: &str) -> f32 {
        self.font
            .layout(text, self.scale(), point(0.0, 0.0))
            .last()
            .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn draw_text(&self, canvas: &mut RgbImage, text: &str, x: f32, baseline: f32) {
        let (width, height) = canvas.dimensions();
        for glyph in self.font.layout(text, self.scale(), point(x, baseline)) {
            let Some(bounds) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bounds.min.x + gx as i32;
                let py = bounds.min.y + gy as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                blend(canvas.get_pixel_mut(px as u32, py as u32), TEXT, coverage);
            });
        }
    }
}

fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    for channel in 0..3 {
        let base = f32::from(pixel.0[channel]);
        let target = f32::from(color.0[channel]);
        pixel.0[channel] = (base + (target - base) * coverage).round() as u8;
    }
}

fn fill(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

impl RasterCapture for GlyphRasterizer {
    fn capture(&self, table: &RenderedTable) -> Result<Snapshot> {
        let header: Vec<String> = COLUMN_HEADERS.iter().map(|title| title.to_string()).collect();
        let lines: Vec<Vec<String>> = std::iter::once(header)
            .chain(table.rows().iter().map(|row| {
                row.cells()
                    .iter()
                    .map(|cell| cell.text().into_owned())
                    .collect::<Vec<_>>()
            }))
            .collect();

        let padding = self.padding;
        let metrics = self.font.v_metrics(self.scale());
        let row_height = (metrics.ascent - metrics.descent).ceil() as u32 + 2 * padding;

        let column_widths: Vec<u32> = (0..COLUMN_HEADERS.len())
            .map(|column| {
                let widest = lines
                    .iter()
                    .map(|line| self.text_width(&line[column]))
                    .fold(0.0_f32, f32::max);
                widest.ceil() as u32 + 2 * padding
            })
            .collect();

        let width = column_widths.iter().sum::<u32>().max(1);
        let height = row_height * lines.len() as u32 + 1;
        let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

        fill(&mut canvas, 0, 0, width, row_height, HEADER_BACKGROUND);

        for (index, line) in lines.iter().enumerate() {
            let top = row_height * index as u32;
            fill(&mut canvas, 0, top + row_height, width, 1, RULE);

            let mut left = 0;
            for (column, text) in line.iter().enumerate() {
                if index > 0 && column == STATUS_COLUMN {
                    let chip = if is_in_progress(&table.rows()[index - 1]) {
                        CHIP_IN_PROGRESS
                    } else {
                        CHIP_NOT_STARTED
                    };
                    fill(
                        &mut canvas,
                        left + padding / 2,
                        top + padding / 2,
                        column_widths[column].saturating_sub(padding),
                        row_height.saturating_sub(padding),
                        chip,
                    );
                }

                let baseline = (top + padding) as f32 + metrics.ascent;
                self.draw_text(&mut canvas, text, (left + padding) as f32, baseline);
                left += column_widths[column];
            }
        }

        debug!(
            "captured table with {} rows into a {}x{} bitmap",
            table.rows().len(),
            width,
            height
        );
        Ok(Snapshot::new(canvas))
    }
}
