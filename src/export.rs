//! Export session: the two export actions and the artifact they leave behind.
//!
//! Each export writes one PDF file and hands out an [`ArtifactHandle`] for
//! it. A session keeps at most one live artifact; a newer export releases the
//! previous one, and dropping the session releases the last one unless it was
//! taken with [`ExportSession::take_artifact`] and kept.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::assembler::{build_document, snapshot_document};
use crate::builder::{DocumentRenderer, RenderedPdf};
use crate::capture::{render_table, RasterCapture, RenderedTable, Snapshot};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::model::DocumentDescription;
use crate::schedule::FlatMilestoneRecord;
use crate::table::{display_rows, DisplayRow};

/// File written by an export. The file is deleted exactly once: on
/// [`release`](Self::release) or on drop, unless [`keep`](Self::keep) was
/// called first.
#[derive(Debug)]
pub struct ArtifactHandle {
    path: PathBuf,
    armed: bool,
}

impl ArtifactHandle {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Location of the written file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarms the release and returns the path of the file.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        mem::take(&mut self.path)
    }

    /// Deletes the file now.
    pub fn release(mut self) -> Result<()> {
        self.armed = false;
        fs::remove_file(&self.path)?;
        debug!("released artifact {}", self.path.display());
        Ok(())
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("released artifact {}", self.path.display()),
            Err(err) => warn!(
                "failed to release artifact {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

/// Holds the current records and runs the export actions against them.
pub struct ExportSession<'a> {
    config: &'a ReportConfig,
    records: Vec<FlatMilestoneRecord>,
    rows: Vec<DisplayRow>,
    artifact: Option<ArtifactHandle>,
}

impl<'a> ExportSession<'a> {
    /// Starts a session over the given records.
    pub fn new(config: &'a ReportConfig, records: Vec<FlatMilestoneRecord>) -> Self {
        let rows = display_rows(&records);
        Self {
            config,
            records,
            rows,
            artifact: None,
        }
    }

    /// Replaces the records and rebuilds the on-screen rows.
    pub fn set_records(&mut self, records: Vec<FlatMilestoneRecord>) {
        self.rows = display_rows(&records);
        self.records = records;
    }

    /// Records the exports are built from.
    pub fn records(&self) -> &[FlatMilestoneRecord] {
        &self.records
    }

    /// On-screen rows for the current records.
    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    /// A freshly assembled description for the current records.
    pub fn document(&self) -> DocumentDescription {
        build_document(&self.records, self.config.template())
    }

    /// Populates the on-screen table for the current records.
    pub fn render_table(&self) -> RenderedTable {
        render_table(&self.records)
    }

    /// The artifact of the latest export, if it has not been taken.
    pub fn artifact(&self) -> Option<&ArtifactHandle> {
        self.artifact.as_ref()
    }

    /// Removes the latest artifact from the session without releasing it.
    pub fn take_artifact(&mut self) -> Option<ArtifactHandle> {
        self.artifact.take()
    }

    /// Renders the current records as a structured document and writes it to
    /// `path`.
    pub fn export_structured(
        &mut self,
        renderer: &dyn DocumentRenderer,
        path: impl AsRef<Path>,
    ) -> Result<&ArtifactHandle> {
        let description = self.document();
        let pdf = renderer.render(&description)?;
        self.store(pdf, path.as_ref())
    }

    /// Renders the table, captures it and writes a PDF embedding the capture
    /// to `path`.
    pub fn export_snapshot(
        &mut self,
        capture: &dyn RasterCapture,
        renderer: &dyn DocumentRenderer,
        path: impl AsRef<Path>,
    ) -> Result<&ArtifactHandle> {
        let snapshot = self.capture(capture)?;
        self.export_captured(&snapshot, renderer, path)
    }

    /// Captures the on-screen table.
    pub fn capture(&self, capture: &dyn RasterCapture) -> Result<Snapshot> {
        capture.capture(&self.render_table())
    }

    /// Writes a PDF embedding an existing capture to `path`.
    pub fn export_captured(
        &mut self,
        snapshot: &Snapshot,
        renderer: &dyn DocumentRenderer,
        path: impl AsRef<Path>,
    ) -> Result<&ArtifactHandle> {
        let description = snapshot_document(
            snapshot.to_data_url()?,
            self.config.template(),
            self.config.snapshot_width(),
        );
        let pdf = renderer.render(&description)?;
        self.store(pdf, path.as_ref())
    }

    fn store(&mut self, pdf: RenderedPdf, path: &Path) -> Result<&ArtifactHandle> {
        fs::write(path, &pdf.bytes)?;
        debug!("wrote {} bytes to {}", pdf.bytes.len(), path.display());

        if let Some(previous) = self.artifact.take() {
            // Same path: the file now holds the new export.
            if previous.path() == path {
                previous.keep();
            }
        }
        Ok(self.artifact.insert(ArtifactHandle::new(path.to_path_buf())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use image::RgbImage;
    use serde_json::Number;

    use crate::model::ContentNode;

    #[derive(Default)]
    struct RecordingRenderer {
        seen: RefCell<Vec<DocumentDescription>>,
    }

    impl DocumentRenderer for RecordingRenderer {
        fn render(&self, description: &DocumentDescription) -> Result<RenderedPdf> {
            self.seen.borrow_mut().push(description.clone());
            Ok(RenderedPdf {
                bytes: b"%PDF-1.3 fake".to_vec(),
            })
        }
    }

    struct BlankCapture;

    impl RasterCapture for BlankCapture {
        fn capture(&self, table: &RenderedTable) -> Result<Snapshot> {
            let height = table.rows().len() as u32 + 1;
            Ok(Snapshot::new(RgbImage::new(8, height)))
        }
    }

    fn record(name: &str) -> FlatMilestoneRecord {
        FlatMilestoneRecord {
            project_name: "A".into(),
            phase_name: "P1".into(),
            completion_date: None,
            total_delay: Number::from(0),
            name: name.into(),
            status: None,
            baseline_date: None,
            planned_date: None,
        }
    }

    #[test]
    fn newer_export_releases_the_previous_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, vec![record("M1")]);

        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        session.export_structured(&renderer, &first).expect("export");
        assert!(first.is_file());

        session.export_structured(&renderer, &second).expect("export");
        assert!(!first.exists());
        assert!(second.is_file());

        drop(session);
        assert!(!second.exists());
    }

    #[test]
    fn re_exporting_to_the_same_path_keeps_the_new_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, vec![record("M1")]);
        let path = dir.path().join("look_ahead.pdf");

        session.export_structured(&renderer, &path).expect("export");
        session.export_structured(&renderer, &path).expect("export");

        assert!(path.is_file());
        assert_eq!(session.artifact().map(ArtifactHandle::path), Some(path.as_path()));
    }

    #[test]
    fn kept_artifact_survives_the_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, Vec::new());
        let path = dir.path().join("kept.pdf");

        session.export_structured(&renderer, &path).expect("export");
        let kept = session.take_artifact().expect("artifact").keep();
        drop(session);

        assert_eq!(kept, path);
        assert!(path.is_file());
    }

    #[test]
    fn each_export_assembles_a_fresh_description() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, vec![record("M1")]);

        session
            .export_structured(&renderer, dir.path().join("a.pdf"))
            .expect("export");
        session.set_records(vec![record("M1"), record("M2")]);
        session
            .export_structured(&renderer, dir.path().join("b.pdf"))
            .expect("export");

        let seen = renderer.seen.borrow();
        let body_len = |description: &DocumentDescription| {
            description.tables().next().map(|(_, node)| node.table.body.len())
        };
        assert_eq!(body_len(&seen[0]), Some(2));
        assert_eq!(body_len(&seen[1]), Some(3));
        assert_eq!(session.rows().len(), 2);
    }

    #[test]
    fn snapshot_export_embeds_one_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, vec![record("M1")]);

        session
            .export_snapshot(&BlankCapture, &renderer, dir.path().join("snap.pdf"))
            .expect("export");

        let seen = renderer.seen.borrow();
        assert_eq!(seen[0].content.len(), 1);
        match &seen[0].content[0] {
            ContentNode::Image(image) => {
                assert!(image.image.starts_with("data:image/png;base64,"));
                assert_eq!(image.width, Some(config.snapshot_width()));
            }
            other => panic!("expected image node, got {other:?}"),
        }
    }

    #[test]
    fn failed_write_keeps_the_last_good_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, vec![record("M1")]);
        let good = dir.path().join("good.pdf");

        session.export_structured(&renderer, &good).expect("export");
        let unwritable = dir.path().join("missing").join("next.pdf");
        assert!(session.export_structured(&renderer, &unwritable).is_err());

        assert!(good.is_file());
        assert_eq!(session.artifact().map(ArtifactHandle::path), Some(good.as_path()));
    }

    #[test]
    fn explicit_release_deletes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReportConfig::default();
        let renderer = RecordingRenderer::default();
        let mut session = ExportSession::new(&config, Vec::new());
        let path = dir.path().join("released.pdf");

        session.export_structured(&renderer, &path).expect("export");
        session
            .take_artifact()
            .expect("artifact")
            .release()
            .expect("release");
        assert!(!path.exists());
    }
}
