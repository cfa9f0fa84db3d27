use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Error type for reading a rules file.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Failed to read rules file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse rules file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raw contents of a rules file, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub blocks: Vec<BlockSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BlockSettings {
    #[serde(default)]
    pub conditions: Vec<ConditionSettings>,
}

/// One `{filter_by, type, words}` entry.
///
/// Missing keys default to empty so that a bad entry is rejected by the
/// builder instead of failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConditionSettings {
    #[serde(default)]
    pub filter_by: String,
    #[serde(rename = "type", default)]
    pub filter_type: String,
    #[serde(default)]
    pub words: Vec<String>,
}

pub fn parse_rule_set(text: &str) -> Result<FilterSettings, RulesError> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_rule_set(path: &Path) -> Result<FilterSettings, RulesError> {
    let text = fs::read_to_string(path).map_err(|source| RulesError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_rule_set(&text)
}
