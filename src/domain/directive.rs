//! In-source traceability directives.
//!
//! A directive is a line of the form `HODOR-<NAME>: <value>`, optionally
//! preceded by whitespace and a single-line comment marker (`#`, `//`, `--`,
//! `;`, `/*` or `*`). Consecutive directive lines form a [`DirectiveBlock`];
//! any other line, blank lines included, closes the open block.
//!
//! ```text
//! // HODOR-ID: TST-LOGIN-01
//! // HODOR-REQS: REQ-001, REQ-002
//! // HODOR-REF: RFC 6749 §4.1
//! // HODOR-TEXT: Rejects expired authorisation codes.
//! fn rejects_expired_codes() { .. }
//! ```
//!
//! This module only knows about text. Walking directories and turning blocks
//! into [`Test`] records with file context is done in
//! [`crate::storage::annotations`].

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::domain::Test;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#|//|--|;|/\*+|\*+)?\s*(HODOR-[A-Z-]+)\s*:\s*(.*)$")
        .expect("directive pattern is valid")
});

/// A single recognised directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `HODOR-ID`: sets the block id, replacing any earlier value.
    Id(String),
    /// `HODOR-REQS`: requirement ids covered by the block.
    Reqs(Vec<String>),
    /// `HODOR-REF` / `HODOR-REFS`: free-text references.
    Refs(Vec<String>),
    /// `HODOR-TEXT`: one line of description.
    Text(String),
}

impl Directive {
    /// Parses one line of source text.
    ///
    /// Returns `Ok(None)` for lines that are not directives.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::UnknownDirective`] for a `HODOR-*` token that
    /// is not recognised. The reported line is `0`; callers that know the
    /// position use [`DirectiveError::at_line`].
    pub fn parse(line: &str) -> Result<Option<Self>, DirectiveError> {
        let Some(captures) = DIRECTIVE.captures(line) else {
            return Ok(None);
        };
        let name = captures[1].trim();
        let value = captures[2].trim();

        let directive = match name {
            "HODOR-ID" => Self::Id(value.to_string()),
            "HODOR-REQS" => Self::Reqs(split_list(value)),
            "HODOR-REF" | "HODOR-REFS" => Self::Refs(split_list(value)),
            "HODOR-TEXT" => Self::Text(value.to_string()),
            other => {
                return Err(DirectiveError::UnknownDirective {
                    directive: other.to_string(),
                    line: 0,
                });
            }
        };
        Ok(Some(directive))
    }
}

/// Splits a comma- or semicolon-delimited list, trimming entries and dropping
/// empty ones.
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Errors raised while reading directive blocks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectiveError {
    /// A `HODOR-*` token that is not a known directive.
    #[error("unknown directive '{directive}' on line {line}")]
    UnknownDirective {
        /// The offending token.
        directive: String,
        /// 1-based line number.
        line: usize,
    },

    /// A block closed without any `HODOR-REQS` entries.
    #[error("block starting on line {line} has no HODOR-REQS")]
    MissingRequiredReference {
        /// 1-based line the block started on.
        line: usize,
    },
}

impl DirectiveError {
    /// Returns the error with its line number set.
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::UnknownDirective { directive, .. } => Self::UnknownDirective { directive, line },
            Self::MissingRequiredReference { .. } => Self::MissingRequiredReference { line },
        }
    }
}

/// A contiguous run of directive lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveBlock {
    /// Explicit id from the last `HODOR-ID` line, if it was non-empty.
    pub id: Option<String>,
    /// Requirement ids, in declaration order.
    pub requirement_refs: Vec<String>,
    /// Free-text references, in declaration order.
    pub reference_lines: Vec<String>,
    /// Non-empty description lines, in declaration order.
    pub text_lines: Vec<String>,
    /// 1-based line of the first directive in the block.
    pub start_line: usize,
}

impl DirectiveBlock {
    fn open(start_line: usize) -> Self {
        Self {
            start_line,
            ..Self::default()
        }
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Id(id) => self.id = Some(id).filter(|id| !id.is_empty()),
            Directive::Reqs(reqs) => self.requirement_refs.extend(reqs),
            Directive::Refs(refs) => self.reference_lines.extend(refs),
            Directive::Text(text) => {
                if !text.is_empty() {
                    self.text_lines.push(text);
                }
            }
        }
    }

    /// The id the block's test will carry: the explicit `HODOR-ID`, or
    /// `<label>#L<start_line>`.
    #[must_use]
    pub fn effective_id(&self, label: &str) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{label}#L{}", self.start_line))
    }

    /// Converts the block into a test record declared in the file `label`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::MissingRequiredReference`] if the block names
    /// no requirements.
    pub fn into_test(self, label: &str) -> Result<Test, DirectiveError> {
        if self.requirement_refs.is_empty() {
            return Err(DirectiveError::MissingRequiredReference {
                line: self.start_line,
            });
        }

        let id = self.effective_id(label);
        let text = self.text_lines.join("\n").trim().to_string();
        let text = if text.is_empty() {
            format!("Traceability marker in {label}")
        } else {
            text
        };

        Ok(Test {
            id,
            text,
            declared_links: self.requirement_refs,
            source_path: label.to_string(),
            references: self.reference_lines,
        })
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Collecting(DirectiveBlock),
}

/// Lazily yields the closed directive blocks of a text.
///
/// Created by [`blocks`]. After the first error the iterator is exhausted.
#[derive(Debug)]
pub struct Blocks<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    state: State,
    failed: bool,
}

/// Segments `text` into directive blocks.
#[must_use]
pub fn blocks(text: &str) -> Blocks<'_> {
    Blocks {
        lines: text.lines().enumerate(),
        state: State::Idle,
        failed: false,
    }
}

impl Iterator for Blocks<'_> {
    type Item = Result<DirectiveBlock, DirectiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        for (index, line) in self.lines.by_ref() {
            let line_no = index + 1;
            match Directive::parse(line) {
                Ok(Some(directive)) => {
                    if matches!(self.state, State::Idle) {
                        self.state = State::Collecting(DirectiveBlock::open(line_no));
                    }
                    if let State::Collecting(block) = &mut self.state {
                        block.apply(directive);
                    }
                }
                Ok(None) => {
                    if let State::Collecting(block) = std::mem::replace(&mut self.state, State::Idle) {
                        return Some(Ok(block));
                    }
                }
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error.at_line(line_no)));
                }
            }
        }

        match std::mem::replace(&mut self.state, State::Idle) {
            State::Collecting(block) => Some(Ok(block)),
            State::Idle => None,
        }
    }
}
