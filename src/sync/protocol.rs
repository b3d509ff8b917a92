//! AnkiConnect wire types.
//!
//! Every request is `{"action", "version", "params"}`; every response is
//! `{"error", "result"}`. A non-null `error` is a failure whatever the HTTP
//! status.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const ACTION_VERSION: &str = "version";
pub const ACTION_MODEL_NAMES: &str = "modelNames";
pub const ACTION_CREATE_MODEL: &str = "createModel";
pub const ACTION_CREATE_DECK: &str = "createDeck";
pub const ACTION_FIND_NOTES: &str = "findNotes";
pub const ACTION_NOTES_INFO: &str = "notesInfo";
pub const ACTION_STORE_MEDIA: &str = "storeMediaFile";
pub const ACTION_ADD_NOTE: &str = "addNote";

pub const FIELD_FRONT: &str = "Front";
pub const FIELD_BACK: &str = "Back";
pub const FIELD_HASH: &str = "Hash";

/// Card styling. The hash is on the card so it can be searched, but hidden.
pub const CARD_CSS: &str = ".card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}
.hash { display: none; }";

pub const FRONT_TEMPLATE: &str = "{{Front}}\n<div class=\"hash\">{{Hash}}</div>";
pub const BACK_TEMPLATE: &str = "{{FrontSide}}\n<hr id=\"answer\">\n{{Back}}";

#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Value,
}

/// Query matching notes whose `Hash` field equals `hash`.
pub fn hash_query(hash: &str) -> String {
    format!("{FIELD_HASH}:{hash}")
}

#[derive(Debug, Clone, Serialize)]
pub struct CardTemplate {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
}

/// `createModel` parameters for the pdf2anki note type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub model_name: String,
    pub in_order_fields: Vec<String>,
    pub css: String,
    pub card_templates: Vec<CardTemplate>,
}

impl ModelDefinition {
    pub fn flashcard(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            in_order_fields: [FIELD_FRONT, FIELD_BACK, FIELD_HASH]
                .map(String::from)
                .to_vec(),
            css: CARD_CSS.to_string(),
            card_templates: vec![CardTemplate {
                name: "Card 1".to_string(),
                front: FRONT_TEMPLATE.to_string(),
                back: BACK_TEMPLATE.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteFields {
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
    #[serde(rename = "Hash")]
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

/// `addNote` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    pub options: NoteOptions,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldValue {
    pub value: String,
    #[serde(default)]
    pub order: u32,
}

/// One entry of a `notesInfo` result. Unknown ids come back as `{}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    #[serde(default)]
    pub note_id: u64,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

impl NoteInfo {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }
}
