//! Rendering of document descriptions into PDF bytes with `genpdf`.

use genpdf::elements::{CellDecorator, Paragraph, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{self, Color, Style};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::{debug, warn};

use crate::assembler::validate_columns;
use crate::elements::{
    decode_data_url, decode_image_from_bytes, mm_from_f64, mm_from_points, mm_to_f64,
    mm_to_points, scaled_image, to_alignment, to_style,
};
use crate::error::{ReportError, Result};
use crate::fonts::{self, FontFamilyDescriptor};
use crate::layout::column_weights;
use crate::model::{
    ContentNode, DocumentDescription, HorizontalAlignment, ImageNode, Margins as BoxMargins,
    PageOrientation, PageSize, StyleDefinition, TableLayoutName, TableNode, TextNode,
};
use crate::table::Cell;

const ADAPTER: &str = "genpdf";

/// Font size `genpdf` uses when the description does not set one.
const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Height reserved for the page-number footer.
const FOOTER_HEIGHT_MM: f64 = 8.0;

/// Binary output of a render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPdf {
    /// The PDF document.
    pub bytes: Vec<u8>,
}

/// Turns a document description into a downloadable document.
pub trait DocumentRenderer {
    /// Renders the description. Implementations must reject descriptions
    /// whose tables do not match their declared columns.
    fn render(&self, description: &DocumentDescription) -> Result<RenderedPdf>;
}

/// Renders descriptions through `genpdf` using a registered font family.
#[derive(Clone, Debug)]
pub struct PdfRenderer {
    fonts: FontFamilyDescriptor,
    page_numbers: bool,
}

impl PdfRenderer {
    /// Creates a renderer for the given font family.
    pub fn new(fonts: FontFamilyDescriptor) -> Self {
        Self {
            fonts,
            page_numbers: false,
        }
    }

    /// Prints "Page N" in the bottom margin of every page.
    pub fn with_page_numbers(mut self, page_numbers: bool) -> Self {
        self.page_numbers = page_numbers;
        self
    }

    fn build(&self, description: &DocumentDescription) -> Result<genpdf::Document> {
        if description.default_style.font != self.fonts.name {
            return Err(ReportError::UnknownFont {
                requested: description.default_style.font.clone(),
                registered: self.fonts.name.clone(),
            });
        }

        let family = fonts::load_font_family(&self.fonts).map_err(ReportError::FontLoad)?;
        let mut document = genpdf::Document::new(family);

        let paper = paper_size(description.page_size, description.page_orientation);
        document.set_paper_size(paper);
        if let Some(size) = description.default_style.font_size {
            document.set_font_size(size.round().clamp(1.0, f64::from(u8::MAX)) as u8);
        }

        let margins = description.page_margins;
        let footer = self.page_numbers.then(|| FooterSpec::new(FOOTER_HEIGHT_MM, page_label));
        document.set_page_decorator(ConfiguredPageDecorator::new(Some(margins), footer));

        let line_width = mm_to_points(mm_to_f64(paper.width)) - margins.left - margins.right;
        let font_size = description
            .default_style
            .font_size
            .unwrap_or(DEFAULT_FONT_SIZE);

        for (index, node) in description.content.iter().enumerate() {
            match node {
                ContentNode::Text(text) => push_text(&mut document, description, text),
                ContentNode::Table(table) => {
                    push_table(&mut document, description, table, line_width, font_size)
                        .map_err(|err| {
                            ReportError::render_adapter(
                                ADAPTER,
                                format!("content node {index}: table rejected"),
                                err,
                            )
                        })?
                }
                ContentNode::Image(image) => push_image(&mut document, image).map_err(|err| {
                    ReportError::render_adapter(
                        ADAPTER,
                        format!("content node {index}: image rejected"),
                        err,
                    )
                })?,
            }
        }

        Ok(document)
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(FontFamilyDescriptor::default())
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, description: &DocumentDescription) -> Result<RenderedPdf> {
        validate_columns(description)?;
        let document = self.build(description)?;

        let mut bytes = Vec::new();
        document
            .render(&mut bytes)
            .map_err(|err| ReportError::render_adapter(ADAPTER, "rendering failed", err))?;

        debug!(
            "rendered {} content nodes into {} bytes",
            description.content.len(),
            bytes.len()
        );
        Ok(RenderedPdf { bytes })
    }
}

fn paper_size(size: PageSize, orientation: PageOrientation) -> Size {
    let portrait: Size = match size {
        PageSize::A3 => Size::new(297, 420),
        PageSize::A4 => PaperSize::A4.into(),
        PageSize::A5 => Size::new(148, 210),
        PageSize::Letter => PaperSize::Letter.into(),
        PageSize::Legal => PaperSize::Legal.into(),
    };
    match orientation {
        PageOrientation::Portrait => portrait,
        PageOrientation::Landscape => Size::new(portrait.height, portrait.width),
    }
}

fn page_label(page: usize) -> Paragraph {
    let mut paragraph = Paragraph::new(format!("Page {}", page));
    paragraph.set_alignment(Alignment::Right);
    paragraph
}

fn named_style<'a>(
    description: &'a DocumentDescription,
    name: Option<&str>,
) -> Option<&'a StyleDefinition> {
    let name = name?;
    let style = description.style(name);
    if style.is_none() {
        warn!("style '{}' is not defined; rendering without it", name);
    }
    style
}

fn node_margins(style: Option<&StyleDefinition>) -> Margins {
    to_page_margins(style.and_then(|style| style.margin).unwrap_or_default())
}

fn to_page_margins(margins: BoxMargins) -> Margins {
    let BoxMargins {
        left,
        top,
        right,
        bottom,
    } = margins;
    Margins::trbl(
        mm_from_points(top),
        mm_from_points(right),
        mm_from_points(bottom),
        mm_from_points(left),
    )
}

fn push_text(document: &mut genpdf::Document, description: &DocumentDescription, node: &TextNode) {
    let style = named_style(description, node.style.as_deref());
    let alignment = node
        .alignment
        .or_else(|| style.and_then(|style| style.alignment))
        .unwrap_or_default();
    if alignment == HorizontalAlignment::Justify {
        debug!("justified text is rendered left aligned");
    }

    let mut paragraph = Paragraph::new(node.text.clone());
    paragraph.set_alignment(to_alignment(alignment));
    document.push(
        paragraph
            .styled(style.map(to_style).unwrap_or_default())
            .padded(node_margins(style)),
    );
}

fn push_table(
    document: &mut genpdf::Document,
    description: &DocumentDescription,
    node: &TableNode,
    line_width: f64,
    font_size: f64,
) -> std::result::Result<(), Error> {
    let style = named_style(description, node.style.as_deref());
    let margins = style.and_then(|style| style.margin).unwrap_or_default();
    let available = line_width - margins.left - margins.right;

    let spec = &node.table;
    let mut table = TableLayout::new(column_weights(
        &spec.widths,
        &spec.body,
        available,
        font_size,
    ));
    if let Some(decorator) =
        HorizontalRuleDecorator::for_layout(node.layout.unwrap_or_default(), spec.header_rows)
    {
        table.set_cell_decorator(decorator);
    }

    for (index, cells) in spec.body.iter().enumerate() {
        let mut row = table.row();
        for cell in cells {
            row = row.element(
                Paragraph::new(cell.text().into_owned())
                    .styled(cell_style(cell, index < spec.header_rows))
                    .padded(Margins::trbl(1, 1, 1, 1)),
            );
        }
        row.push()?;
    }

    document.push(
        table
            .styled(style.map(to_style).unwrap_or_default())
            .padded(node_margins(style)),
    );
    Ok(())
}

fn cell_style(cell: &Cell, header: bool) -> Style {
    let mut style = Style::new();
    let emphasis = cell.emphasis();
    if emphasis.and_then(|cell| cell.bold).unwrap_or(header) {
        style.set_bold();
    }
    if emphasis.and_then(|cell| cell.italics) == Some(true) {
        style.set_italic();
    }
    style
}

fn push_image(document: &mut genpdf::Document, node: &ImageNode) -> std::result::Result<(), Error> {
    let bytes = decode_data_url(&node.image)?;
    let image = decode_image_from_bytes(bytes)?;
    let alignment = to_alignment(node.alignment.unwrap_or_default());
    document.push(scaled_image(image, node.width, alignment)?);
    Ok(())
}

const HEADER_RULE: Color = Color::Greyscale(0);
const LIGHT_RULE: Color = Color::Greyscale(170);

/// Draws horizontal rules between table rows. `lightHorizontalLines` rules
/// every row boundary, `headerLineOnly` only the one below the header rows.
/// Neither draws vertical rules or a frame around the table.
#[derive(Clone, Debug)]
struct HorizontalRuleDecorator {
    header_rows: usize,
    between_rows: bool,
    num_rows: usize,
}

impl HorizontalRuleDecorator {
    fn for_layout(layout: TableLayoutName, header_rows: usize) -> Option<Self> {
        let between_rows = match layout {
            TableLayoutName::NoBorders => return None,
            TableLayoutName::HeaderLineOnly => false,
            TableLayoutName::LightHorizontalLines => true,
        };
        Some(Self {
            header_rows,
            between_rows,
            num_rows: 0,
        })
    }

    /// Colour of the rule below `row`, if one is drawn.
    fn rule_below(&self, row: usize) -> Option<Color> {
        if row + 1 >= self.num_rows {
            None
        } else if row + 1 == self.header_rows {
            Some(HEADER_RULE)
        } else if self.between_rows {
            Some(LIGHT_RULE)
        } else {
            None
        }
    }
}

impl CellDecorator for HorizontalRuleDecorator {
    fn set_table_size(&mut self, _num_columns: usize, num_rows: usize) {
        self.num_rows = num_rows;
    }

    fn decorate_cell(
        &mut self,
        _column: usize,
        row: usize,
        has_more: bool,
        area: genpdf::render::Area<'_>,
        style: Style,
    ) {
        if has_more {
            return;
        }
        if let Some(color) = self.rule_below(row) {
            let size = area.size();
            area.draw_line(
                vec![Position::new(0, size.height), Position::new(size.width, size.height)],
                style.with_color(color),
            );
        }
    }
}

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Definition of a footer rendered through the page decorator.
struct FooterSpec {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl FooterSpec {
    fn new<F, E>(height_mm: f64, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: mm_from_f64(height_mm),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

/// Applies the description's page margins and the optional footer.
struct ConfiguredPageDecorator {
    page: usize,
    margins: Option<BoxMargins>,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Option<BoxMargins>, footer: Option<FooterSpec>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> std::result::Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(to_page_margins(margins));
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{build_document, DocumentTemplate};
    use crate::table::StyledCell;

    fn rules(layout: TableLayoutName, header_rows: usize, rows: usize) -> Vec<Option<Color>> {
        let Some(mut decorator) = HorizontalRuleDecorator::for_layout(layout, header_rows) else {
            return vec![None; rows];
        };
        decorator.set_table_size(8, rows);
        (0..rows).map(|row| decorator.rule_below(row)).collect()
    }

    #[test]
    fn light_horizontal_lines_rule_every_inner_boundary() {
        assert_eq!(
            rules(TableLayoutName::LightHorizontalLines, 1, 4),
            vec![Some(HEADER_RULE), Some(LIGHT_RULE), Some(LIGHT_RULE), None]
        );
    }

    #[test]
    fn header_line_only_rules_below_the_header() {
        assert_eq!(
            rules(TableLayoutName::HeaderLineOnly, 1, 4),
            vec![Some(HEADER_RULE), None, None, None]
        );
        assert_eq!(rules(TableLayoutName::HeaderLineOnly, 0, 3), vec![None; 3]);
    }

    #[test]
    fn no_borders_has_no_decorator() {
        assert!(HorizontalRuleDecorator::for_layout(TableLayoutName::NoBorders, 1).is_none());
    }

    #[test]
    fn cell_emphasis_overrides_header_weight() {
        assert!(cell_style(&Cell::from("Project"), true).is_bold());
        assert!(!cell_style(&Cell::from("A"), false).is_bold());

        let bold = Cell::Styled(StyledCell {
            text: "Bold value".into(),
            bold: Some(true),
            italics: Some(true),
        });
        let style = cell_style(&bold, false);
        assert!(style.is_bold());
        assert!(style.is_italic());

        let plain = Cell::Styled(StyledCell {
            text: "Plain header".into(),
            bold: Some(false),
            italics: None,
        });
        assert!(!cell_style(&plain, true).is_bold());
    }

    #[test]
    fn landscape_swaps_paper_dimensions() {
        let portrait = paper_size(PageSize::A4, PageOrientation::Portrait);
        let landscape = paper_size(PageSize::A4, PageOrientation::Landscape);
        assert_eq!(portrait.width, landscape.height);
        assert_eq!(portrait.height, landscape.width);
        assert!((mm_to_f64(landscape.width) - 297.0).abs() < 1e-9);
    }

    #[test]
    fn column_mismatch_is_rejected_before_loading_fonts() {
        let template = DocumentTemplate::default();
        let mut description = build_document(&[], &template);
        if let ContentNode::Table(node) = &mut description.content[template.table_index()] {
            node.table.body.push(vec![Cell::Null]);
        }

        let err = PdfRenderer::default().render(&description).unwrap_err();
        assert!(matches!(err, ReportError::ColumnMismatch { row: 1, .. }));
    }

    #[test]
    fn unknown_font_is_rejected() {
        let template = DocumentTemplate::look_ahead("NimbusSans");
        let description = build_document(&[], &template);

        let err = PdfRenderer::default().render(&description).unwrap_err();
        assert!(matches!(
            err,
            ReportError::UnknownFont { ref requested, .. } if requested == "NimbusSans"
        ));
    }
}
