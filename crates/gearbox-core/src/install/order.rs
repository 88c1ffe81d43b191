//! Install ordering by language.
//!
//! Tools are grouped by language into a fixed priority sequence so that
//! toolchains other builds lean on come first. Each group is sorted by name.
//! Languages outside the priority list follow in the order they were first
//! seen.

use crate::catalog::ToolSpec;

/// Language groups installed first, in this order.
pub const LANGUAGE_PRIORITY: &[&str] = &["go", "rust", "c", "python", "nodejs"];

/// Canonical language name, folding common aliases.
pub fn normalize_language(language: &str) -> String {
    let lower = language.trim().to_lowercase();
    match lower.as_str() {
        "golang" => "go".to_string(),
        "rs" => "rust".to_string(),
        "cpp" | "c++" => "c".to_string(),
        "py" | "python3" => "python".to_string(),
        "node" | "javascript" | "typescript" | "js" | "ts" => "nodejs".to_string(),
        _ => lower,
    }
}

/// Order tools for submission to the worker pool.
pub fn install_order<'a>(tools: &[&'a ToolSpec]) -> Vec<&'a ToolSpec> {
    let mut groups: Vec<(String, Vec<&'a ToolSpec>)> = LANGUAGE_PRIORITY
        .iter()
        .map(|lang| (lang.to_string(), Vec::new()))
        .collect();

    for &tool in tools {
        let language = normalize_language(&tool.language);
        match groups.iter_mut().find(|(lang, _)| *lang == language) {
            Some((_, members)) => members.push(tool),
            None => groups.push((language, vec![tool])),
        }
    }

    groups
        .into_iter()
        .flat_map(|(_, mut members)| {
            members.sort_by(|a, b| a.name.cmp(&b.name));
            members
        })
        .collect()
}
