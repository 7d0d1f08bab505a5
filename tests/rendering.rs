use lookahead_report::fonts::{self, FontFamilyDescriptor};
use lookahead_report::sample::sample_dataset;
use lookahead_report::{
    build_document, render_table, snapshot_document, DocumentRenderer, GlyphRasterizer,
    PdfRenderer, RasterCapture, ReportConfig,
};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "fonts missing. Set LOOKAHEAD_FONTS_DIR or copy the Roboto files into assets/fonts.";

fn fonts_ready(test: &str) -> bool {
    let ready = fonts::fonts_available(&FontFamilyDescriptor::default());
    if !ready {
        eprintln!("Skipping {test}: {SKIP_HINT}");
    }
    ready
}

fn structured_pdf(page_numbers: bool) -> Vec<u8> {
    let config = ReportConfig::default();
    let records = sample_dataset().expect("sample parses").records();
    let description = build_document(&records, config.template());
    config
        .renderer()
        .with_page_numbers(page_numbers)
        .render(&description)
        .expect("structured render")
        .bytes
}

fn snapshot_pdf() -> Vec<u8> {
    let config = ReportConfig::default();
    let records = sample_dataset().expect("sample parses").records();
    let snapshot = config
        .rasterizer()
        .expect("rasterizer")
        .capture(&render_table(&records))
        .expect("capture");
    let description = snapshot_document(
        snapshot.to_data_url().expect("png"),
        config.template(),
        config.snapshot_width(),
    );
    config
        .renderer()
        .render(&description)
        .expect("snapshot render")
        .bytes
}

/// Zeroes the bytes between `open` and `close` wherever `open` occurs, keeping
/// the length of the document intact.
fn blank_between(data: &mut [u8], open: &[u8], close: &[u8]) {
    let mut offset = 0;
    while let Some(found) = find(&data[offset..], open) {
        let start = offset + found + open.len();
        let Some(length) = find(&data[start..], close) else {
            break;
        };
        for byte in &mut data[start..start + length] {
            if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                *byte = b'0';
            }
        }
        offset = start + length + close.len();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    const VOLATILE: [(&[u8], &[u8]); 10] = [
        (b"/CreationDate(", b")"),
        (b"/ModDate(", b")"),
        (b"/ID[", b"]"),
        (b"/Producer(", b")"),
        (b"<xmp:CreateDate>", b"</xmp:CreateDate>"),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ];

    let mut normalized = bytes.to_vec();
    for (open, close) in VOLATILE {
        blank_between(&mut normalized, open, close);
    }
    Sha256::digest(&normalized).into()
}

#[test]
fn structured_export_produces_a_pdf() {
    if !fonts_ready("structured_export_produces_a_pdf") {
        return;
    }
    let bytes = structured_pdf(false);
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn structured_export_is_deterministic() {
    if !fonts_ready("structured_export_is_deterministic") {
        return;
    }
    let first = structured_pdf(true);
    let second = structured_pdf(true);

    assert_eq!(first.len(), second.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first),
        normalized_hash(&second),
        "renders must be identical after metadata normalization"
    );
}

#[test]
fn snapshot_export_is_deterministic() {
    if !fonts_ready("snapshot_export_is_deterministic") {
        return;
    }
    let first = snapshot_pdf();
    let second = snapshot_pdf();

    assert!(first.starts_with(b"%PDF"));
    assert_eq!(normalized_hash(&first), normalized_hash(&second));
}

#[test]
fn rasterizer_output_is_stable() {
    if !fonts_ready("rasterizer_output_is_stable") {
        return;
    }
    let records = sample_dataset().expect("sample parses").records();
    let rasterizer =
        GlyphRasterizer::from_family(&FontFamilyDescriptor::default()).expect("rasterizer");
    let table = render_table(&records);

    let first = rasterizer.capture(&table).expect("capture");
    let second = rasterizer.capture(&table).expect("capture");
    assert_eq!(first.image(), second.image());
}

#[test]
fn page_numbers_change_the_output() {
    if !fonts_ready("page_numbers_change_the_output") {
        return;
    }
    assert_ne!(
        normalized_hash(&structured_pdf(false)),
        normalized_hash(&structured_pdf(true))
    );
}
