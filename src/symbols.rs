//! Symbol metadata: display codes and Unicode renderings of sign classes
//!
//! Reports carry raw `SymbolId`s; a `SymbolMetadata` source turns them into
//! sign-list codes ("G17") and characters ("𓅓"). The bundled source is a
//! `SymbolCatalog` read from TOML:
//!
//! ```toml
//! [[symbol]]
//! id = 17
//! code = "G17"
//! unicode = "U+13153"
//! ```

use crate::glyph::SymbolId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a symbol catalog
#[derive(Error, Debug)]
pub enum SymbolCatalogError {
    #[error("Failed to read symbol catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid symbol catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Symbol {0} is defined more than once")]
    DuplicateSymbol(SymbolId),
}

/// Display data for one symbol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub code: String,
    pub unicode: String,
}

/// Lookup of display data by symbol id
pub trait SymbolMetadata {
    fn symbol_info(&self, symbol: SymbolId) -> Option<SymbolInfo>;
}

/// Metadata source that knows nothing; reports fall back to empty strings
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl SymbolMetadata for NoMetadata {
    fn symbol_info(&self, _symbol: SymbolId) -> Option<SymbolInfo> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: SymbolId,
    #[serde(default)]
    code: String,
    #[serde(default)]
    unicode: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    symbol: Vec<CatalogEntry>,
}

/// Symbol metadata loaded from a TOML `[[symbol]]` table
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    entries: HashMap<SymbolId, SymbolInfo>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, SymbolCatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SymbolCatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SymbolCatalogError> {
        let file: CatalogFile = toml::from_str(content)?;

        let mut catalog = Self::new();
        for entry in file.symbol {
            let info = SymbolInfo {
                code: entry.code,
                unicode: entry.unicode,
            };
            if catalog.entries.insert(entry.id, info).is_some() {
                return Err(SymbolCatalogError::DuplicateSymbol(entry.id));
            }
        }

        tracing::debug!(symbols = catalog.len(), "symbol catalog loaded");
        Ok(catalog)
    }

    pub fn insert(&mut self, symbol: SymbolId, info: SymbolInfo) {
        self.entries.insert(symbol, info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolMetadata for SymbolCatalog {
    fn symbol_info(&self, symbol: SymbolId) -> Option<SymbolInfo> {
        self.entries.get(&symbol).cloned()
    }
}

/// Trimmed, upper-cased, `U+` prefixed; empty stays empty
pub fn normalize_unicode(value: &str) -> String {
    let normalized = value.trim().to_uppercase();
    if normalized.is_empty() || normalized.starts_with("U+") {
        normalized
    } else {
        format!("U+{}", normalized)
    }
}

/// Trimmed and upper-cased sign-list code
pub fn normalize_code(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Render a `U+XXXX` value as its character; invalid values render as ""
pub fn unicode_to_symbol(value: &str) -> String {
    let upper = value.trim().to_uppercase();
    let hex_digits = upper.trim_start_matches("U+");
    u32::from_str_radix(hex_digits, 16)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_default()
}
