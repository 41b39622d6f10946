// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment extraction failures become [`ConfigError`] values that miette can
//! render with the offending line highlighted and, for misspelled keys, a
//! Jaro-Winkler "did you mean" hint.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Candidates scoring at or below this are not offered as corrections.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// The text of one configuration layer, kept so diagnostics can point into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    /// File path, or `<inline>` for configuration passed as a string.
    pub name: String,
    pub text: String,
}

impl ConfigSource {
    pub fn inline(text: &str) -> Self {
        Self {
            name: "<inline>".to_string(),
            text: text.to_string(),
        }
    }

    /// Reads `path`; `None` when the file is absent or unreadable.
    pub fn from_file(path: &Path) -> Option<Self> {
        std::fs::read_to_string(path).ok().map(|text| Self {
            name: path.display().to_string(),
            text,
        })
    }
}

/// A problem found while loading or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", section_label(.section))]
    #[diagnostic(
        code(memohome::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted table path, empty for the top level.
        section: String,
        key: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not a recognized key here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(memohome::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(memohome::config::missing_key),
        help("set `{key}` in memohome.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but breaks a semantic rule.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(memohome::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(memohome::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let valid = valid_keys.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? expected one of: {valid}"),
        None => format!("expected one of: {valid}"),
    }
}

/// Turn every error carried by `err` into a diagnostic.
pub fn from_figment(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section = error.path.join(".");
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let valid_keys: Vec<String> =
                        expected.iter().map(|k| k.to_string()).collect();
                    let source = source_of(&error, sources);
                    let span = source
                        .and_then(|s| locate_key(&s.text, &error.path, key))
                        .map(|offset| SourceSpan::new(offset.into(), key.len()));
                    let src = source
                        .filter(|_| span.is_some())
                        .map(|s| NamedSource::new(&s.name, s.text.clone()));

                    ConfigError::UnknownKey {
                        suggestion: suggest_key(key, expected),
                        key: key.clone(),
                        section,
                        valid_keys,
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: if section.is_empty() {
                        key.to_string()
                    } else {
                        format!("{section}.{key}")
                    },
                },
                Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                    key: section,
                    found: found.to_string(),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// The layer an error came from. Errors without file metadata map to the
/// only source when exactly one was given.
fn source_of<'a>(
    error: &figment::error::Error,
    sources: &'a [ConfigSource],
) -> Option<&'a ConfigSource> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    match (file, sources) {
        (Some(name), _) => sources.iter().find(|s| s.name == name),
        (None, [only]) => Some(only),
        (None, _) => None,
    }
}

/// Byte offset of `key` inside the table `section` of a TOML document.
///
/// Walks the document line by line, tracking the current `[table]` header, so
/// a key of the same name in another table is never matched.
pub fn locate_key(text: &str, section: &[String], key: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let body = line.trim();

        if let Some(header) = body.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            current = header.trim().to_string();
        } else if current == wanted
            && let Some(rest) = body.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + indent);
        }

        offset += line.len();
    }

    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical report handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        let before = out.len();
        if handler.render_report(&mut out, error as &dyn Diagnostic).is_err() {
            out.truncate(before);
            out.push_str(&format!("error: {error}\n"));
        }
    }
    eprint!("{out}");
}
