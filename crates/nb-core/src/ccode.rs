//! C-code Decoder
//!
//! The C-code is the 4-digit classification printed on Japanese books:
//! digit 0 is the target audience, digit 1 the format and digits 2-3 the
//! content category. Each part is looked up in its own table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::types::Subject;

/// Error type for C-code decoding and table loading.
#[derive(Debug, thiserror::Error)]
pub enum CcodeError {
    #[error("Invalid C-code {code:?}: {reason}")]
    InvalidCode { code: String, reason: &'static str },
    #[error("Failed to read C-code table '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse C-code table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Lookup tables for the three parts of a C-code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CcodeDecoder {
    /// Target audience, keyed by digit 0
    #[serde(default)]
    pub taishou: HashMap<String, String>,
    /// Format, keyed by digit 1
    #[serde(default)]
    pub keitai: HashMap<String, String>,
    /// Content category, keyed by digits 2-3
    #[serde(default)]
    pub naiyou: HashMap<String, String>,
}

impl CcodeDecoder {
    /// Load tables from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CcodeError> {
        let text = fs::read_to_string(path).map_err(|source| CcodeError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let decoder = Self::from_json(&text)?;
        log::debug!(
            "Loaded C-code table '{}': {} target, {} format, {} content entries",
            path.display(),
            decoder.taishou.len(),
            decoder.keitai.len(),
            decoder.naiyou.len(),
        );
        Ok(decoder)
    }

    /// Parse tables from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CcodeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a C-code into its three labels.
    ///
    /// A well-formed code whose parts are missing from the tables decodes to
    /// empty labels rather than an error.
    pub fn decode(&self, code: &str) -> Result<Subject, CcodeError> {
        if code.chars().count() != 4 {
            return Err(CcodeError::InvalidCode {
                code: code.to_string(),
                reason: "not 4 digits",
            });
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CcodeError::InvalidCode {
                code: code.to_string(),
                reason: "contains a non-digit",
            });
        }

        // all ASCII from here on, byte slicing is safe
        Ok(Subject {
            target: lookup(&self.taishou, &code[0..1]),
            format: lookup(&self.keitai, &code[1..2]),
            content: lookup(&self.naiyou, &code[2..4]),
        })
    }
}

fn lookup(table: &HashMap<String, String>, key: &str) -> String {
    table.get(key).cloned().unwrap_or_default()
}
