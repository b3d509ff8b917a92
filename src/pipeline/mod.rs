//! Pipeline stages for turning PDF pages into flashcard images.
//!
//! Each submodule implements one step and is testable on its own; the
//! [`crate::processor`] wires them together per page.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ classify ──▶ render ──▶ hash ──▶ split ──▶ encode
//! (scan)   (bounds,    (dims +      (raster)   (sha256)  (halves)  (base64,
//!           text)       markers)                                   at sync)
//! ```
//!
//! 1. [`input`]      — find PDFs under a directory and check their magic bytes
//! 2. [`render`]     — page bounds, text and rasters through a [`render::PageSource`]
//! 3. [`classify`]   — apply [`dimensions`] and [`markers`] per [`crate::ProcessingOptions`]
//! 4. [`hash`]       — fingerprint the full-page raster
//! 5. [`split`]      — write question (top) and answer (bottom) PNGs
//! 6. [`encode`]     — base64 media payloads for the sync service

pub mod classify;
pub mod dimensions;
pub mod encode;
pub mod hash;
pub mod input;
pub mod markers;
pub mod render;
pub mod split;
