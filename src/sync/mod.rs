//! Flashcard sync over AnkiConnect.
//!
//! [`SyncService`] makes the flashcard application's state reflect a
//! `(deck, ImagePair)` exactly once: a note whose `Hash` field equals the
//! pair's content hash is never created twice, across runs.
//!
//! Every outbound request goes through the same retry loop: transport
//! failures, unparsable envelopes, unexpected `result` shapes and non-null
//! `error` fields are all retried per the configured [`RetryPolicy`]. After the
//! last attempt the final error is surfaced wrapped in
//! [`SyncError::RetriesExhausted`].
//!
//! Per-card state is `PENDING → ADDED | SKIPPED | FAILED`, recorded in the
//! caller's [`ProcessingReport`].

pub mod deck;
pub mod protocol;
pub mod retry;
pub mod transport;

pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport};

use crate::config::SyncConfig;
use crate::error::{Pdf2AnkiError, SyncError};
use crate::logging::Logger;
use crate::output::{ImagePair, ProcessingReport, SkippedCardInfo, SyncOutcome};
use crate::pipeline::encode::{encode_media, img_tag, MediaFile};
use protocol::{
    hash_query, ModelDefinition, Note, NoteFields, NoteInfo, NoteOptions, Response,
    ACTION_ADD_NOTE, ACTION_CREATE_DECK, ACTION_CREATE_MODEL, ACTION_FIND_NOTES,
    ACTION_MODEL_NAMES, ACTION_NOTES_INFO, ACTION_STORE_MEDIA, ACTION_VERSION, FIELD_HASH,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, trace, warn};

/// Client for one AnkiConnect endpoint.
pub struct SyncService<T: Transport = HttpTransport> {
    transport: T,
    config: SyncConfig,
    logger: Logger,
}

impl SyncService<HttpTransport> {
    /// HTTP client for `config.endpoint`.
    pub fn new(config: SyncConfig, logger: Logger) -> Result<Self, SyncError> {
        let transport = HttpTransport::new(config.endpoint.clone())?;
        Ok(Self::with_transport(transport, config, logger))
    }
}

impl<T: Transport> SyncService<T> {
    pub fn with_transport(transport: T, config: SyncConfig, logger: Logger) -> Self {
        Self {
            transport,
            config,
            logger,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ask the API for its `version`. Failure aborts a run.
    pub fn check_connection(&self) -> Result<(), Pdf2AnkiError> {
        self.logger.in_scope(|| {
            match self.request::<Value>(ACTION_VERSION, json!({})) {
                Ok(version) => {
                    debug!("Connected to AnkiConnect {} (version {version})", self.config.endpoint);
                    Ok(())
                }
                Err(e) => {
                    info!("Error sending request to Anki: {e}");
                    Err(Pdf2AnkiError::ConnectionFailed {
                        endpoint: self.config.endpoint.clone(),
                        detail: e.to_string(),
                    })
                }
            }
        })
    }

    /// Create the note type unless a model with the configured name exists.
    pub fn ensure_model_exists(&self) -> Result<(), SyncError> {
        self.logger.in_scope(|| {
            let model_name = &self.config.model_name;
            let names: Vec<String> = self.request(ACTION_MODEL_NAMES, json!({}))?;
            if names.iter().any(|n| n == model_name) {
                debug!("{model_name} model already exists");
                return Ok(());
            }

            let definition = ModelDefinition::flashcard(model_name);
            self.request::<Value>(ACTION_CREATE_MODEL, json!(definition))?;
            info!("Created {model_name} model");
            Ok(())
        })
    }

    /// Create-or-no-op.
    pub fn create_deck(&self, name: &str) -> Result<(), SyncError> {
        self.logger.in_scope(|| {
            info!("Creating deck: {name}");
            self.request::<Value>(ACTION_CREATE_DECK, json!({ "deck": name }))?;
            Ok(())
        })
    }

    /// Id of a note whose `Hash` field is exactly `hash`, if any.
    ///
    /// `findNotes` matches loosely (wildcards, case), so candidates are
    /// confirmed through `notesInfo`.
    pub fn find_existing_note(&self, hash: &str) -> Result<Option<u64>, SyncError> {
        self.logger.in_scope(|| {
            let ids: Vec<u64> =
                self.request(ACTION_FIND_NOTES, json!({ "query": hash_query(hash) }))?;
            if ids.is_empty() {
                return Ok(None);
            }

            let infos: Vec<NoteInfo> = self.request(ACTION_NOTES_INFO, json!({ "notes": ids }))?;
            Ok(infos
                .iter()
                .find(|info| info.field(FIELD_HASH) == Some(hash))
                .map(|info| info.note_id))
        })
    }

    /// Sync one flashcard and record the outcome in `report`.
    ///
    /// A duplicate is `Ok(Skipped)`. Any failure is returned for this card
    /// only and counted in `report.failed_count`.
    ///
    /// Does not create the note type; call [`ensure_model_exists`] first or
    /// use [`add_all_flashcards`].
    ///
    /// [`ensure_model_exists`]: Self::ensure_model_exists
    /// [`add_all_flashcards`]: Self::add_all_flashcards
    pub fn add_flashcard(
        &self,
        deck_name: &str,
        pair: &ImagePair,
        page_number: usize,
        report: &mut ProcessingReport,
    ) -> Result<SyncOutcome, SyncError> {
        self.logger.in_scope(|| {
            report.record_attempt();
            debug!("Processing flashcard for deck: {deck_name}");
            trace!("Question image: {}", pair.question.display());
            trace!("Answer image: {}", pair.answer.display());

            let result = self.sync_one(deck_name, pair);
            match &result {
                Ok(SyncOutcome::Skipped { existing_note_id }) => {
                    info!(
                        "Skipping duplicate flashcard with hash: {} (note {existing_note_id})",
                        pair.hash
                    );
                    report.record_skipped(SkippedCardInfo {
                        deck_name: deck_name.to_string(),
                        hash: pair.hash.clone(),
                        page_number,
                    });
                }
                Ok(SyncOutcome::Added { note_id }) => {
                    debug!("Added flashcard {} as note {note_id}", pair.hash.short());
                    report.record_added();
                }
                Err(e) => {
                    warn!("Failed to add flashcard {} (page {page_number}): {e}", pair.hash.short());
                    report.record_failed();
                }
            }
            result
        })
    }

    /// Ensure the note type once, then attempt every pair.
    ///
    /// Never stops early. Returns [`SyncError::BatchIncomplete`] naming how
    /// many of the pairs failed. `page_numbers[i]` labels `pairs[i]`; missing
    /// entries are reported as page 0.
    pub fn add_all_flashcards(
        &self,
        deck_name: &str,
        pairs: &[ImagePair],
        page_numbers: &[usize],
        report: &mut ProcessingReport,
    ) -> Result<(), SyncError> {
        self.logger.in_scope(|| {
            if let Err(e) = self.ensure_model_exists() {
                warn!("Cannot add {} flashcards to '{deck_name}': {e}", pairs.len());
                report.record_unsynced(pairs.len());
                return Err(SyncError::BatchIncomplete {
                    failed: pairs.len(),
                    total: pairs.len(),
                });
            }

            let pages = page_numbers.iter().copied().chain(std::iter::repeat(0));
            let mut failed = 0;
            for (pair, page) in pairs.iter().zip(pages) {
                if self.add_flashcard(deck_name, pair, page, report).is_err() {
                    failed += 1;
                }
            }

            if failed > 0 {
                return Err(SyncError::BatchIncomplete {
                    failed,
                    total: pairs.len(),
                });
            }
            debug!("Synced {} flashcards to '{deck_name}'", pairs.len());
            Ok(())
        })
    }

    fn sync_one(&self, deck_name: &str, pair: &ImagePair) -> Result<SyncOutcome, SyncError> {
        if let Some(existing_note_id) = self.find_existing_note(pair.hash.as_str())? {
            return Ok(SyncOutcome::Skipped { existing_note_id });
        }

        let question = encode_media(&pair.question)?;
        let answer = encode_media(&pair.answer)?;
        self.store_media(&question)?;
        self.store_media(&answer)?;

        let note = Note {
            deck_name: deck_name.to_string(),
            model_name: self.config.model_name.clone(),
            fields: NoteFields {
                front: img_tag(&question.filename),
                back: img_tag(&answer.filename),
                hash: pair.hash.to_string(),
            },
            options: NoteOptions {
                allow_duplicate: false,
            },
            tags: deck::note_tags(deck_name),
        };

        // addNote is not idempotent: an attempt may have stored the note and
        // lost the reply, after which every retry reports a duplicate.
        let note_id = match self.request::<u64>(ACTION_ADD_NOTE, json!({ "note": note })) {
            Ok(note_id) => note_id,
            Err(e) => match self.find_existing_note(pair.hash.as_str()) {
                Ok(Some(note_id)) => {
                    debug!("addNote reported '{e}' but note {note_id} holds the hash");
                    note_id
                }
                _ => return Err(e),
            },
        };
        Ok(SyncOutcome::Added { note_id })
    }

    fn store_media(&self, media: &MediaFile) -> Result<(), SyncError> {
        trace!("Storing media file {}", media.filename);
        self.request::<Value>(ACTION_STORE_MEDIA, json!(media))?;
        Ok(())
    }

    /// Send `action` with retries and decode `result` as `R`.
    fn request<R: DeserializeOwned>(&self, action: &str, params: Value) -> Result<R, SyncError> {
        let body = json!({
            "action": action,
            "version": self.config.api_version,
            "params": params,
        });
        let max = self.config.retry.max_attempts();

        let mut attempt = 1;
        loop {
            match self.attempt(action, &body) {
                Ok(result) => return Ok(result),
                Err(e) if attempt < max => {
                    warn!("'{action}' attempt {attempt}/{max} failed: {e}; retrying");
                    let delay = self.config.retry.delay_after(attempt);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    return Err(SyncError::RetriesExhausted {
                        action: action.to_string(),
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
            }
        }
    }

    fn attempt<R: DeserializeOwned>(&self, action: &str, body: &Value) -> Result<R, SyncError> {
        let raw = self.transport.post(body)?;
        let response: Response =
            serde_json::from_str(&raw).map_err(|e| SyncError::MalformedResponse {
                action: action.to_string(),
                detail: format!("failed to parse response: {e}"),
            })?;

        if let Some(message) = response.error {
            return Err(SyncError::Application {
                action: action.to_string(),
                message,
            });
        }

        serde_json::from_value(response.result).map_err(|e| SyncError::MalformedResponse {
            action: action.to_string(),
            detail: format!("unexpected result: {e}"),
        })
    }
}
