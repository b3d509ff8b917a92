//! Whole-batch runs against an in-memory page source and AnkiConnect.
//!
//! Run with:
//!   cargo test --test batch

mod support;

use pdf2anki::pipeline::render::DocumentLoader;
use pdf2anki::{
    BatchRunner, CancellationToken, FlashcardProcessor, Logger, PdfProcessor, Pdf2AnkiError,
    ProcessingReport, ProcessorConfig, RetryPolicy, SyncConfig, SyncService,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use support::{png_count, write_pdfs, FakeAnki, FakeLoader, FakePage};
use tempfile::TempDir;

struct Workspace {
    _root: TempDir,
    source: std::path::PathBuf,
    output: std::path::PathBuf,
    temp: std::path::PathBuf,
}

fn workspace(pdfs: &[&str]) -> Workspace {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("notes");
    write_pdfs(&source, pdfs);
    Workspace {
        source,
        output: root.path().join("flashcards"),
        temp: root.path().join("scratch"),
        _root: root,
    }
}

fn processor<L: DocumentLoader>(ws: &Workspace, loader: L) -> FlashcardProcessor<L> {
    processor_in(&ws.temp, &ws.output, loader)
}

fn processor_in<L: DocumentLoader>(temp: &Path, output: &Path, loader: L) -> FlashcardProcessor<L> {
    let config = ProcessorConfig::builder()
        .temp_dir(temp)
        .output_dir(output)
        .build()
        .unwrap();
    FlashcardProcessor::with_loader(config, loader, Logger::disabled()).unwrap()
}

fn sync(anki: &FakeAnki) -> SyncService<&FakeAnki> {
    let config = SyncConfig::default().with_retry(RetryPolicy::immediate(3));
    SyncService::with_transport(anki, config, Logger::disabled())
}

/// `biology/cells.pdf`: two cards and a notes page. `chem.pdf`: one card
/// and an A4 card that fails the size check.
fn study_notes() -> (Workspace, FakeLoader) {
    let ws = workspace(&["biology/cells.pdf", "chem.pdf"]);
    let loader = FakeLoader::default()
        .with(
            "cells.pdf",
            vec![FakePage::card(10), FakePage::notes(20), FakePage::card(30)],
        )
        .with("chem.pdf", vec![FakePage::card(40), FakePage::a4_card(50)]);
    (ws, loader)
}

#[test]
fn first_run_adds_every_flashcard() {
    let (ws, loader) = study_notes();
    let processor = processor(&ws, loader);
    let anki = FakeAnki::default();
    let sync = sync(&anki);

    let mut report = ProcessingReport::start();
    BatchRunner::new(&processor, &sync)
        .root_deck(Some("School".into()))
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap();

    assert_eq!(report.processed_pdfs, 2);
    assert_eq!(report.total_flashcards, 3);
    assert_eq!(report.added_count, 3);
    assert_eq!(report.skipped_count, 0);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.total_processed, 3);
    assert!(report.is_finished());

    assert_eq!(anki.decks(), vec!["School::biology::cells", "School::chem"]);
    assert_eq!(anki.calls("createModel"), 1);

    let notes = anki.notes();
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0].deck, "School::biology::cells");
    assert_eq!(notes[2].deck, "School::chem");
    assert_eq!(notes[0].tags, vec!["pdf2anki", "School::biology::cells"]);
    assert!(notes[0].front.starts_with("<img src=\"cells_"), "got {}", notes[0].front);
    assert!(notes[0].back.ends_with("_answer.png\">"), "got {}", notes[0].back);
    assert_eq!(notes[0].hash.len(), 64);

    // Question + answer per card; full-page renders stay in the temp dir.
    assert_eq!(png_count(&ws.output), 6);
    assert_eq!(png_count(&ws.temp), 3);
    assert_eq!(anki.state.lock().unwrap().media.len(), 6);
}

#[test]
fn second_run_skips_everything() {
    let (ws, loader) = study_notes();
    let processor = processor(&ws, loader);
    let anki = FakeAnki::default();
    let sync = sync(&anki);
    let cancel = CancellationToken::new();

    let mut first = ProcessingReport::start();
    BatchRunner::new(&processor, &sync)
        .run(&ws.source, &cancel, &mut first)
        .unwrap();

    let mut second = ProcessingReport::start();
    BatchRunner::new(&processor, &sync)
        .run(&ws.source, &cancel, &mut second)
        .unwrap();

    assert_eq!(second.added_count, 0);
    assert_eq!(second.skipped_count, 3);
    assert_eq!(second.total_processed, 3);
    assert_eq!(anki.notes().len(), 3);

    let skipped: Vec<(String, usize)> = second
        .skipped_cards
        .iter()
        .map(|c| (c.deck_name.clone(), c.page_number))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("biology::cells".to_string(), 1),
            ("biology::cells".to_string(), 3),
            ("chem".to_string(), 1),
        ]
    );
    assert!(second.to_string().contains("- biology::cells (Page 3, Hash:"));
}

#[test]
fn identical_page_in_two_pdfs_is_added_once() {
    let ws = workspace(&["a.pdf", "b.pdf"]);
    let loader = FakeLoader::default()
        .with("a.pdf", vec![FakePage::card(77)])
        .with("b.pdf", vec![FakePage::card(77)]);
    let processor = processor(&ws, loader);
    let anki = FakeAnki::default();
    let sync = sync(&anki);

    let mut report = ProcessingReport::start();
    BatchRunner::new(&processor, &sync)
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap();

    assert_eq!(report.added_count, 1);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.skipped_cards[0].deck_name, "b");
    assert_eq!(anki.notes().len(), 1);
}

#[test]
fn dry_run_writes_images_without_syncing() {
    let (ws, loader) = study_notes();
    let processor = processor(&ws, loader);

    let mut report = ProcessingReport::start();
    let runner = BatchRunner::dry_run(&processor);
    assert!(runner.is_dry_run());
    runner
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap();

    assert_eq!(report.total_flashcards, 3);
    assert_eq!(report.total_processed, 0);
    assert_eq!(png_count(&ws.output), 6);
}

#[test]
fn unreachable_anki_stops_before_any_pdf() {
    let (ws, loader) = study_notes();
    let processor = processor(&ws, loader);
    let anki = FakeAnki::offline();
    let sync = sync(&anki);

    let mut report = ProcessingReport::start();
    let err = BatchRunner::new(&processor, &sync)
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap_err();

    assert!(matches!(err, Pdf2AnkiError::ConnectionFailed { .. }), "got {err:?}");
    assert_eq!(report.processed_pdfs, 0);
    assert_eq!(png_count(&ws.output), 0);
    assert!(report.is_finished());
}

#[test]
fn unreadable_pdf_is_reported_and_the_batch_continues() {
    // `broken.pdf` exists on disk but the loader cannot open it.
    let ws = workspace(&["broken.pdf", "chem.pdf"]);
    let loader = FakeLoader::default().with("chem.pdf", vec![FakePage::card(40)]);
    let processor = processor(&ws, loader);
    let anki = FakeAnki::default();
    let sync = sync(&anki);

    let mut report = ProcessingReport::start();
    BatchRunner::new(&processor, &sync)
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap();

    assert_eq!(report.processed_pdfs, 1);
    assert_eq!(report.added_count, 1);
}

#[test]
fn cancelled_run_keeps_a_partial_report() {
    let (ws, loader) = study_notes();
    let processor = processor(&ws, loader);
    let anki = FakeAnki::default();
    let sync = sync(&anki);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut report = ProcessingReport::start();
    let err = BatchRunner::new(&processor, &sync)
        .run(&ws.source, &cancel, &mut report)
        .unwrap_err();

    assert!(matches!(err, Pdf2AnkiError::Cancelled));
    assert_eq!(report.processed_pdfs, 0);
    assert!(anki.notes().is_empty());
    assert!(report.is_finished());
}

#[test]
fn cleanup_removes_the_scratch_directory() {
    let (ws, loader) = study_notes();
    let processor = processor(&ws, loader);

    let mut report = ProcessingReport::start();
    BatchRunner::dry_run(&processor)
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap();
    assert!(ws.temp.exists());

    processor.cleanup().unwrap();
    assert!(!ws.temp.exists());
    assert_eq!(png_count(&ws.output), 6);
}

#[test]
fn temp_dir_holding_the_pdfs_is_rejected_before_anything_runs() {
    let (ws, loader) = study_notes();
    let anki = FakeAnki::default();
    let sync = sync(&anki);

    let elsewhere = tempfile::tempdir().unwrap();
    let cases = [
        (ws.source.clone(), ws.output.clone()),
        (ws.source.parent().unwrap().to_path_buf(), elsewhere.path().join("cards")),
    ];
    for (temp, output) in cases {
        let processor = processor_in(&temp, &output, loader.clone());
        let mut report = ProcessingReport::start();
        let err = BatchRunner::new(&processor, &sync)
            .run(&ws.source, &CancellationToken::new(), &mut report)
            .unwrap_err();

        assert!(matches!(err, Pdf2AnkiError::InvalidConfig(_)), "got {err:?}");
        assert_eq!(report.processed_pdfs, 0);
        processor.cleanup().unwrap();
    }

    assert_eq!(anki.calls("version"), 0);
    assert_eq!(png_count(&ws.output), 0);
    assert_eq!(png_count(&elsewhere.path().join("cards")), 0);
    assert!(ws.source.join("chem.pdf").exists());
    assert!(ws.source.join("biology/cells.pdf").exists());
}

#[test]
fn temp_dir_around_the_output_dir_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let err = ProcessorConfig::builder()
        .temp_dir(root.path().join("work"))
        .output_dir(root.path().join("work/cards"))
        .build()
        .unwrap_err();
    assert!(matches!(err, Pdf2AnkiError::InvalidConfig(_)), "got {err:?}");
}

#[test]
fn cleanup_in_a_shared_temp_dir_only_removes_page_renders() {
    let (ws, loader) = study_notes();
    std::fs::create_dir_all(&ws.temp).unwrap();
    std::fs::write(ws.temp.join("draft.png"), b"not ours").unwrap();
    let processor = processor(&ws, loader);

    let mut report = ProcessingReport::start();
    BatchRunner::dry_run(&processor)
        .run(&ws.source, &CancellationToken::new(), &mut report)
        .unwrap();
    assert_eq!(png_count(&ws.temp), 4);

    processor.cleanup().unwrap();
    assert_eq!(png_count(&ws.temp), 1);
    assert!(ws.temp.join("draft.png").exists());
    assert_eq!(png_count(&ws.output), 6);
}
