//! End-to-end integration tests for batchpress.
//!
//! Everything here runs against in-memory payloads and temp directories —
//! no network, no fixtures to download. Payloads are generated with the
//! `image` crate so the image path exercises a real decode/re-encode.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use batchpress::{
    derive_output_name, export_all, export_one, run, BatchProgressCallback, CompressionConfig,
    FileStatus, PixelReencode, ProgressCallback, SimulatedShrink, SourceFile, Workspace,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// High-frequency noise compresses terribly as PNG (large original) and far
/// better as lossy JPEG, which is exactly the shape the re-encode tests need.
fn noise_png(name: &str, width: u32, height: u32) -> SourceFile {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(2_654_435_761).wrapping_add(y.wrapping_mul(40_503));
        Rgba([(v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, ((v >> 16) & 0xFF) as u8, 255])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    SourceFile::from_bytes(name, buf)
}

/// Bytes that no raster decoder will accept.
fn junk_image(name: &str) -> SourceFile {
    SourceFile::from_bytes(name, vec![0xAB; 512])
}

fn pdf_payload(name: &str, len: usize) -> SourceFile {
    SourceFile::from_bytes(name, vec![0u8; len])
}

fn image_workspace() -> Workspace {
    Workspace::new(Arc::new(PixelReencode::new()))
}

fn pdf_workspace() -> Workspace {
    Workspace::new(Arc::new(SimulatedShrink::new()))
}

/// Image config with all pacing removed so tests run instantly.
fn fast_image_config() -> CompressionConfig {
    CompressionConfig::image_defaults()
        .to_builder()
        .inter_file_pause_ms(0)
        .progress_tick_ms(0)
        .build()
        .unwrap()
}

fn fast_pdf_config() -> CompressionConfig {
    CompressionConfig::pdf_defaults()
        .to_builder()
        .inter_file_pause_ms(0)
        .progress_tick_ms(0)
        .build()
        .unwrap()
}

/// Records the order files were started in.
struct StartOrder {
    names: Mutex<Vec<String>>,
}

impl BatchProgressCallback for StartOrder {
    fn on_file_start(&self, _file_num: usize, _total_files: usize, name: &str) {
        self.names.lock().unwrap().push(name.to_string());
    }
}

// ── Intake ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn intake_preserves_order_across_multiple_adds() {
    let ws = pdf_workspace();
    let first = ws.add(vec![pdf_payload("a.pdf", 10), pdf_payload("b.pdf", 10)]).unwrap();
    let second = ws.add(vec![pdf_payload("c.pdf", 10)]).unwrap();

    let ids = ws.ids();
    assert_eq!(ids, [first, second].concat());

    let names: Vec<String> = ws.snapshot().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
}

#[tokio::test]
async fn remove_is_idempotent_and_never_panics() {
    let ws = image_workspace();
    let ids = ws.add(vec![noise_png("a.png", 16, 16)]).unwrap();

    assert!(ws.remove(ids[0]));
    assert!(!ws.remove(ids[0]));
    assert!(!ws.remove(ids[0]));
    assert_eq!(ws.live_handles(), 0);
}

// ── Status/result coupling ───────────────────────────────────────────────────

#[tokio::test]
async fn done_records_have_results_and_failed_records_have_errors() {
    let ws = image_workspace();
    ws.add(vec![
        noise_png("ok.png", 32, 32),
        junk_image("broken.jpg"),
    ])
    .unwrap();

    run(&ws, &fast_image_config()).await;

    for record in ws.snapshot() {
        match record.status {
            FileStatus::Done => {
                assert!(record.result_size.is_some(), "{}: done without size", record.name);
                assert!(record.error.is_none(), "{}: done with error", record.name);
                assert_eq!(record.progress, 100);
            }
            FileStatus::Failed => {
                assert!(record.result_size.is_none(), "{}: failed with size", record.name);
                assert!(record.error.is_some(), "{}: failed without message", record.name);
            }
            other => panic!("{}: unexpected status {:?}", record.name, other),
        }
    }
}

#[tokio::test]
async fn one_bad_file_does_not_block_the_batch() {
    let ws = image_workspace();
    ws.add(vec![
        noise_png("one.png", 32, 32),
        junk_image("bad.jpg"),
        noise_png("three.png", 32, 32),
    ])
    .unwrap();

    let report = run(&ws, &fast_image_config()).await;

    assert_eq!(report.eligible, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let statuses: Vec<FileStatus> = ws.snapshot().into_iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [FileStatus::Done, FileStatus::Failed, FileStatus::Done]
    );
}

#[tokio::test]
async fn failed_records_are_reattempted_on_the_next_run() {
    let ws = image_workspace();
    ws.add(vec![junk_image("bad.jpg")]).unwrap();

    let first = run(&ws, &fast_image_config()).await;
    assert_eq!(first.failed, 1);

    // The payload is still undecodable, but the record must be retried.
    let second = run(&ws, &fast_image_config()).await;
    assert_eq!(second.eligible, 1);
    assert_eq!(second.failed, 1);
    assert_eq!(ws.snapshot()[0].status, FileStatus::Failed);
}

// ── Image path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_reencode_shrinks_and_exports() {
    let ws = image_workspace();
    let source = noise_png("photo.png", 256, 256);
    let original_size = source.len();
    let ids = ws.add(vec![source]).unwrap();

    let report = run(&ws, &fast_image_config()).await;
    assert_eq!(report.succeeded, 1);

    let record = ws.get(ids[0]).unwrap();
    assert_eq!(record.status, FileStatus::Done);
    let result_size = record.result_size.unwrap();
    assert!(
        result_size <= original_size,
        "JPEG at quality 80 should not exceed a noise PNG ({result_size} > {original_size})"
    );

    // The staged result is a valid exportable resource.
    let out = tempfile::tempdir().unwrap();
    let path = export_one(&ws, ids[0], out.path())
        .unwrap()
        .expect("done record exports");
    assert_eq!(path.file_name().unwrap(), "photo-compressed.png");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), result_size);
}

// ── Document path ────────────────────────────────────────────────────────────

#[tokio::test]
async fn simulated_shrink_lands_in_the_advertised_range() {
    let ws = pdf_workspace();
    let ids = ws.add(vec![pdf_payload("report.pdf", 2_000_000)]).unwrap();

    let report = run(&ws, &fast_pdf_config()).await;
    assert_eq!(report.succeeded, 1);

    let result_size = ws.get(ids[0]).unwrap().result_size.unwrap();
    assert!(result_size >= 600_000, "below 0.3×: {result_size}");
    assert!(result_size < 1_600_000, "at or above 0.8×: {result_size}");
}

// ── Removal and ordering ─────────────────────────────────────────────────────

#[tokio::test]
async fn removing_before_a_run_skips_exactly_that_record() {
    let ws = image_workspace();
    let ids = ws
        .add(vec![
            noise_png("first.png", 16, 16),
            noise_png("second.png", 16, 16),
            noise_png("third.png", 16, 16),
        ])
        .unwrap();
    ws.remove(ids[1]);

    let order = Arc::new(StartOrder { names: Mutex::new(Vec::new()) });
    let config = fast_image_config()
        .to_builder()
        .progress_callback(Arc::clone(&order) as ProgressCallback)
        .build()
        .unwrap();

    let report = run(&ws, &config).await;
    assert_eq!(report.eligible, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(*order.names.lock().unwrap(), ["first.png", "third.png"]);
}

/// Removes one record the moment it starts processing.
struct RemoveOnStart {
    ws: Arc<Workspace>,
    target: String,
}

impl BatchProgressCallback for RemoveOnStart {
    fn on_file_start(&self, _file_num: usize, _total_files: usize, name: &str) {
        if name == self.target {
            if let Some(record) = self.ws.snapshot().into_iter().find(|r| r.name == name) {
                self.ws.remove(record.id);
            }
        }
    }
}

#[tokio::test]
async fn removing_the_in_flight_record_is_benign() {
    let ws = Arc::new(pdf_workspace());
    ws.add(vec![pdf_payload("keep.pdf", 1_000), pdf_payload("drop.pdf", 1_000)])
        .unwrap();

    let config = fast_pdf_config()
        .to_builder()
        .progress_callback(Arc::new(RemoveOnStart {
            ws: Arc::clone(&ws),
            target: "drop.pdf".to_string(),
        }) as ProgressCallback)
        .build()
        .unwrap();

    let report = run(&ws, &config).await;

    // The removed record's updates were dropped, nothing panicked, and no
    // handle leaked for it.
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(ws.len(), 1);
    assert_eq!(ws.snapshot()[0].name, "keep.pdf");
    assert_eq!(ws.live_handles(), 1); // only keep.pdf's staged result
}

#[tokio::test]
async fn concurrent_runs_do_not_double_process() {
    let ws = pdf_workspace();
    ws.add(vec![
        pdf_payload("a.pdf", 1_000),
        pdf_payload("b.pdf", 1_000),
        pdf_payload("c.pdf", 1_000),
    ])
    .unwrap();

    // One-millisecond ticks force the first run to suspend so the second
    // call observes the run-in-progress guard.
    let config = fast_pdf_config().to_builder().progress_tick_ms(1).build().unwrap();
    let (r1, r2) = tokio::join!(run(&ws, &config), run(&ws, &config));

    assert_eq!(r1.succeeded + r2.succeeded, 3);
    assert_eq!(r1.eligible.min(r2.eligible), 0, "one call must no-op");
    assert!(ws.snapshot().iter().all(|r| r.status == FileStatus::Done));
}

// ── Resource accounting ──────────────────────────────────────────────────────

#[tokio::test]
async fn clear_releases_every_handle_after_a_run() {
    let ws = image_workspace();
    ws.add(vec![noise_png("a.png", 32, 32), noise_png("b.png", 32, 32)])
        .unwrap();
    assert_eq!(ws.live_handles(), 2); // previews

    run(&ws, &fast_image_config()).await;
    assert_eq!(ws.live_handles(), 4); // previews + results

    ws.clear();
    assert_eq!(ws.live_handles(), 0);
    assert!(ws.is_empty());
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_one_on_an_unprocessed_record_is_a_noop() {
    let ws = pdf_workspace();
    let ids = ws.add(vec![pdf_payload("report.pdf", 1_000)]).unwrap();

    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("never");
    let exported = export_one(&ws, ids[0], &target).unwrap();

    assert!(exported.is_none());
    assert!(!target.exists(), "no-op export must not touch the disk");
}

#[tokio::test]
async fn export_all_writes_only_completed_records_in_order() {
    let ws = image_workspace();
    ws.add(vec![
        noise_png("one.png", 32, 32),
        junk_image("bad.jpg"),
        noise_png("two.png", 32, 32),
    ])
    .unwrap();
    run(&ws, &fast_image_config()).await;

    let out = tempfile::tempdir().unwrap();
    let written = export_all(&ws, out.path()).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["one-compressed.png", "two-compressed.png"]);
}

#[test]
fn derived_names_match_the_download_convention() {
    assert_eq!(derive_output_name("photo.jpeg"), "photo-compressed.jpeg");
    assert_eq!(derive_output_name("notes"), "notes-compressed");
}
