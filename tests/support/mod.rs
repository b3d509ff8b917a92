//! Shared fakes for the integration tests: an in-memory document loader and
//! an in-memory AnkiConnect.

#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use pdf2anki::pipeline::render::{BackendError, DocumentLoader, PageSource};
use pdf2anki::{PageDimensions, Pdf2AnkiError, SyncError, Transport};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CARD_TEXT: &str = "QUESTION\nWhat is mitosis?\nANSWER\nCell division";

#[derive(Debug, Clone)]
pub struct FakePage {
    pub bounds: PageDimensions,
    pub text: String,
    /// Fill colour of the rendered raster; equal shades hash equal.
    pub shade: u8,
}

impl FakePage {
    /// A standard-size page with both markers.
    pub fn card(shade: u8) -> Self {
        Self {
            bounds: PageDimensions::STANDARD_FLASHCARD,
            text: CARD_TEXT.to_string(),
            shade,
        }
    }

    /// A standard-size page without markers.
    pub fn notes(shade: u8) -> Self {
        Self {
            bounds: PageDimensions::STANDARD_FLASHCARD,
            text: "Lecture notes, week 3".to_string(),
            shade,
        }
    }

    /// An A4 page with both markers.
    pub fn a4_card(shade: u8) -> Self {
        Self {
            bounds: PageDimensions::new(595.28, 841.89),
            text: CARD_TEXT.to_string(),
            shade,
        }
    }
}

/// Serves pages by PDF file name.
#[derive(Default, Clone)]
pub struct FakeLoader {
    documents: HashMap<String, Vec<FakePage>>,
}

impl FakeLoader {
    pub fn with(mut self, file_name: &str, pages: Vec<FakePage>) -> Self {
        self.documents.insert(file_name.to_string(), pages);
        self
    }
}

struct FakeDocument {
    pages: Vec<FakePage>,
}

impl PageSource for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, index: usize) -> Result<PageDimensions, BackendError> {
        Ok(self.pages[index].bounds)
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        Ok(self.pages[index].text.clone())
    }

    fn render_page(&self, index: usize) -> Result<DynamicImage, BackendError> {
        let s = self.pages[index].shade;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            46,
            60,
            Rgba([s, s, s, 255]),
        )))
    }
}

impl DocumentLoader for FakeLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, Pdf2AnkiError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.documents.get(&name) {
            Some(pages) => Ok(Box::new(FakeDocument {
                pages: pages.clone(),
            })),
            None => Err(Pdf2AnkiError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "no such fake document".into(),
            }),
        }
    }
}

/// Write placeholder PDFs (valid magic bytes only) under `root`.
pub fn write_pdfs(root: &Path, relative: &[&str]) -> Vec<PathBuf> {
    relative
        .iter()
        .map(|rel| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"%PDF-1.7\n%placeholder\n").unwrap();
            path
        })
        .collect()
}

pub fn png_count(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
            .count(),
        Err(_) => 0,
    }
}

// ── Fake AnkiConnect ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredNote {
    pub id: u64,
    pub deck: String,
    pub hash: String,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

#[derive(Default)]
pub struct AnkiState {
    pub models: Vec<String>,
    pub decks: Vec<String>,
    pub media: HashMap<String, String>,
    pub notes: Vec<StoredNote>,
    pub calls: Vec<String>,
    pub offline: bool,
}

/// AnkiConnect stand-in behind a `Mutex`, so one instance can be shared
/// across runs through `&`.
#[derive(Default)]
pub struct FakeAnki {
    pub state: Mutex<AnkiState>,
}

impl FakeAnki {
    pub fn offline() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().offline = true;
        fake
    }

    pub fn notes(&self) -> Vec<StoredNote> {
        self.state.lock().unwrap().notes.clone()
    }

    pub fn decks(&self) -> Vec<String> {
        self.state.lock().unwrap().decks.clone()
    }

    pub fn calls(&self, action: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|a| *a == action)
            .count()
    }

    fn handle(state: &mut AnkiState, action: &str, params: &Value) -> Value {
        let ok = |result: Value| json!({ "result": result, "error": null });
        match action {
            "version" => ok(json!(6)),
            "modelNames" => ok(json!(state.models)),
            "createModel" => {
                state
                    .models
                    .push(params["modelName"].as_str().unwrap_or_default().to_string());
                ok(json!({ "id": 1 }))
            }
            "createDeck" => {
                let deck = params["deck"].as_str().unwrap_or_default().to_string();
                if !state.decks.contains(&deck) {
                    state.decks.push(deck);
                }
                ok(json!(1))
            }
            "findNotes" => {
                let query = params["query"].as_str().unwrap_or_default();
                let wanted = query.trim_start_matches("Hash:");
                let ids: Vec<u64> = state
                    .notes
                    .iter()
                    .filter(|n| n.hash.starts_with(wanted))
                    .map(|n| n.id)
                    .collect();
                ok(json!(ids))
            }
            "notesInfo" => {
                let ids: Vec<u64> =
                    serde_json::from_value(params["notes"].clone()).unwrap_or_default();
                let infos: Vec<Value> = ids
                    .iter()
                    .filter_map(|id| state.notes.iter().find(|n| n.id == *id))
                    .map(|n| {
                        json!({
                            "noteId": n.id,
                            "fields": { "Hash": { "value": n.hash, "order": 2 } }
                        })
                    })
                    .collect();
                ok(json!(infos))
            }
            "storeMediaFile" => {
                let name = params["filename"].as_str().unwrap_or_default().to_string();
                let data = params["data"].as_str().unwrap_or_default().to_string();
                state.media.insert(name.clone(), data);
                ok(json!(name))
            }
            "addNote" => {
                let note = &params["note"];
                let id = 1_000 + state.notes.len() as u64;
                state.notes.push(StoredNote {
                    id,
                    deck: note["deckName"].as_str().unwrap_or_default().to_string(),
                    hash: note["fields"]["Hash"].as_str().unwrap_or_default().to_string(),
                    front: note["fields"]["Front"].as_str().unwrap_or_default().to_string(),
                    back: note["fields"]["Back"].as_str().unwrap_or_default().to_string(),
                    tags: serde_json::from_value(note["tags"].clone()).unwrap_or_default(),
                });
                ok(json!(id))
            }
            other => json!({ "result": null, "error": format!("unsupported action {other}") }),
        }
    }
}

impl Transport for FakeAnki {
    fn post(&self, body: &Value) -> Result<String, SyncError> {
        let mut state = self.state.lock().unwrap();
        let action = body["action"].as_str().unwrap_or_default().to_string();
        state.calls.push(action.clone());
        if state.offline {
            return Err(SyncError::Transport {
                detail: "connection refused".into(),
            });
        }
        Ok(Self::handle(&mut state, &action, &body["params"]).to_string())
    }
}

impl Transport for &FakeAnki {
    fn post(&self, body: &Value) -> Result<String, SyncError> {
        (**self).post(body)
    }
}
