//! Glyphmine - repeated glyph-sequence mining for papyrus transcriptions
//!
//! This library turns annotated glyph bounding boxes into a reading-order
//! symbol sequence, mines repeated subsequences with suffix arrays, suffix
//! trees or closed n-grams, persists them per image, and scores them by
//! contextual stability for morphological reports.

pub mod cli;
pub mod config;
pub mod glyph;
pub mod linearizer;
pub mod pipeline;
pub mod report;
pub mod repository;
pub mod sequence;
pub mod stability;
pub mod symbols;
