// Best-effort recovery of a JSON value from raw model output.
//
// Generative models are asked to reply with a bare JSON object but
// routinely wrap it in prose, markdown code fences, or partial
// formatting. Strategies are tried from most specific (explicit fence)
// to least specific (line reconstruction) and the first candidate that
// survives a parse check wins.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Failure to recover any JSON value from a blob of model output.
///
/// Both variants carry the original raw text for diagnostics; handlers
/// log it and substitute a fallback, so it never reaches the client.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON-like structure found in model output")]
    NoStructure { raw: String },
    #[error("JSON-like structure found but syntactically invalid: {reason}")]
    InvalidSyntax { raw: String, reason: String },
}

impl ParseError {
    /// The raw model output that failed to parse.
    pub fn raw(&self) -> &str {
        match self {
            ParseError::NoStructure { raw } => raw,
            ParseError::InvalidSyntax { raw, .. } => raw,
        }
    }

    /// Stable label for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::NoStructure { .. } => "no_structure",
            ParseError::InvalidSyntax { .. } => "invalid_syntax",
        }
    }
}

/// Parse text that is expected to contain a JSON value somewhere,
/// never panicking and never propagating a serde error.
///
/// On failure the error distinguishes "nothing JSON-shaped in there"
/// from "found a structure but it does not parse".
pub fn parse_safely<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let candidate = extract_candidate(text);
    match serde_json::from_str::<T>(&candidate) {
        Ok(v) => Ok(v),
        Err(e) => {
            let trimmed = text.trim();
            if trimmed.contains('{') || trimmed.contains('[') || trimmed.contains("```") {
                Err(ParseError::InvalidSyntax {
                    raw: text.to_string(),
                    reason: e.to_string(),
                })
            } else {
                Err(ParseError::NoStructure {
                    raw: text.to_string(),
                })
            }
        }
    }
}

/// Locate the most plausible JSON substring inside arbitrary text.
///
/// Returns the first candidate that passes a parse check, or the
/// trimmed original text when every strategy comes up empty (the caller
/// must still treat the result as possibly invalid).
pub fn extract_candidate(text: &str) -> String {
    let trimmed = text.trim();

    // 1) Fenced code block, with or without a `json` tag.
    if let Some(cand) = fenced_block(trimmed) {
        if parses(cand) {
            return cand.to_string();
        }
    }

    // 2) First `{` .. last `}` span.
    if let Some(cand) = delimited_span(trimmed, '{', '}') {
        if parses(cand) {
            return cand.to_string();
        }
    }

    // 3) Same for arrays.
    if let Some(cand) = delimited_span(trimmed, '[', ']') {
        if parses(cand) {
            return cand.to_string();
        }
    }

    // 4) First balanced span, tracking string/escape state so braces
    //    inside string literals do not corrupt the balance.
    if let Some(cand) = first_balanced_span(trimmed) {
        if parses(&cand) {
            return cand;
        }
    }

    // 5) Line reconstruction from each line that opens a structure.
    if let Some(cand) = line_reconstruction(trimmed) {
        return cand;
    }

    trimmed.to_string()
}

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok()
}

/// Content between the first pair of triple-backtick fences.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let rest = &text[open + 3..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let close = rest.find("```")?;
    Some(rest[..close].trim())
}

/// Inclusive span from the first `open` to the last `close`.
fn delimited_span(text: &str, open: char, close: char) -> Option<&str> {
    let i = text.find(open)?;
    let j = text.rfind(close)?;
    if j <= i {
        return None;
    }
    Some(text[i..=j].trim())
}

/// Incremental delimiter balancer that is aware of JSON string
/// literals, so a `}` inside `"..."` does not close anything.
#[derive(Default)]
struct BalanceScanner {
    depth: i64,
    in_string: bool,
    escaped: bool,
    opened: bool,
    corrupt: bool,
}

impl BalanceScanner {
    fn feed(&mut self, chunk: &str) {
        for ch in chunk.chars() {
            self.step(ch);
        }
    }

    fn step(&mut self, ch: char) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            return;
        }
        match ch {
            '"' => self.in_string = true,
            '{' | '[' => {
                self.depth += 1;
                self.opened = true;
            }
            '}' | ']' => {
                self.depth -= 1;
                if self.depth < 0 {
                    self.corrupt = true;
                }
            }
            _ => {}
        }
    }

    fn balanced(&self) -> bool {
        self.opened && self.depth == 0 && !self.in_string
    }
}

/// Substring from the first opening delimiter to the point where the
/// balance returns to zero. Catches objects embedded in prose that
/// itself contains stray braces after the JSON.
fn first_balanced_span(text: &str) -> Option<String> {
    let start = text.find(['{', '['])?;
    let mut scanner = BalanceScanner::default();
    for (i, ch) in text[start..].char_indices() {
        scanner.step(ch);
        if scanner.corrupt {
            return None;
        }
        if scanner.balanced() {
            return Some(text[start..start + i + ch.len_utf8()].to_string());
        }
    }
    None
}

/// Scan lines for one whose trimmed content opens a structure, then
/// accumulate following lines until the delimiter balance closes. On a
/// failed parse the start line is abandoned and scanning resumes at the
/// next opening line.
fn line_reconstruction(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    for start in 0..lines.len() {
        let head = lines[start].trim_start();
        if !head.starts_with('{') && !head.starts_with('[') {
            continue;
        }
        let mut candidate = String::new();
        let mut scanner = BalanceScanner::default();
        for line in &lines[start..] {
            if !candidate.is_empty() {
                candidate.push('\n');
            }
            candidate.push_str(line);
            scanner.feed(line);
            if scanner.corrupt {
                break;
            }
            if scanner.balanced() {
                let cand = candidate.trim();
                if parses(cand) {
                    return Some(cand.to_string());
                }
                break;
            }
        }
    }
    None
}
