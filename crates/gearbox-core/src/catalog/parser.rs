//! TOML parsing for catalog documents with line-context error messages

use std::path::Path;

use serde::de::DeserializeOwned;

use super::schema::{BundlesDocument, ToolsDocument};
use crate::error::{GearboxError, Result};

/// Parse tools.toml from disk
pub fn parse_tools_file(path: &Path) -> Result<ToolsDocument> {
    parse_file(path)
}

/// Parse bundles.toml from disk
pub fn parse_bundles_file(path: &Path) -> Result<BundlesDocument> {
    parse_file(path)
}

pub fn parse_tools_str(content: &str) -> Result<ToolsDocument> {
    parse_str(content)
}

pub fn parse_bundles_str(content: &str) -> Result<BundlesDocument> {
    parse_str(content)
}

pub(crate) fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GearboxError::config(format!(
            "Failed to read {}: {e}",
            path.display()
        ))
    })?;
    parse_str(&content).map_err(|e| match e {
        GearboxError::Config { message } => {
            GearboxError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

pub(crate) fn parse_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| enhance_toml_error(&e, content))
}

/// Attach the offending source lines to a TOML error
fn enhance_toml_error(error: &toml::de::Error, content: &str) -> GearboxError {
    let message = error.message().to_string();
    let Some(span) = error.span() else {
        return GearboxError::config(format!("TOML parsing error: {message}"));
    };

    let line_num = content[..span.start.min(content.len())]
        .chars()
        .filter(|c| *c == '\n')
        .count()
        + 1;
    GearboxError::config(format!(
        "TOML parsing error at line {line_num}:\n{}\n\nError: {message}",
        line_context(content, line_num)
    ))
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{marker} {num:4} | {line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
