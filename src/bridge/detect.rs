//! Delimited-text format detection.
//!
//! Every candidate separator is scored on three signals:
//!
//! - numeric ratio: share of data tokens in the dominant value class (weight 0.4)
//! - column consistency: share of data rows with the modal column count (weight 0.4)
//! - separator signal: share of data rows containing the separator (weight 0.2);
//!   a single-column layout scores a neutral 0.5 here
//!
//! Consistency and separator signal are discounted by the numeric ratio, so
//! regular but non-numeric text scores zero. A first row made only of non-value
//! tokens is taken as a header.

use std::collections::HashMap;

use super::codec::{fraction_digits, TokenClass};
use super::{Candidate, Detection, FormatKind, FormatSpec};
use crate::error::{MapError, Result};
use crate::settings::BridgeSettings;

pub const SEPARATORS: [char; 2] = ['\t', ','];

const CONSISTENCY_WEIGHT: f64 = 0.4;
const NUMERIC_WEIGHT: f64 = 0.4;
const SEPARATOR_WEIGHT: f64 = 0.2;

/// Reject input that is too large to scan
pub fn guard(text: &str, settings: &BridgeSettings) -> Result<()> {
    if text.len() > settings.max_input_bytes {
        return Err(MapError::InputTooLarge {
            what: "input bytes",
            actual: text.len(),
            limit: settings.max_input_bytes,
        });
    }
    let lines = text.lines().count();
    if lines > settings.max_lines {
        return Err(MapError::InputTooLarge {
            what: "line count",
            actual: lines,
            limit: settings.max_lines,
        });
    }
    Ok(())
}

/// Non-blank lines with trailing whitespace and carriage returns removed
pub fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(|l| l.trim_end_matches(['\r', ' ']))
        .filter(|l| !l.trim().is_empty())
        .collect()
}

pub fn split_row(line: &str, separator: char) -> Vec<&str> {
    line.split(separator).map(str::trim).collect()
}

fn is_header_row(tokens: &[&str]) -> bool {
    tokens
        .iter()
        .all(|t| !t.is_empty() && TokenClass::of(t).is_none())
}

fn kind_for(class: TokenClass, separator: char) -> FormatKind {
    match (class, separator) {
        (TokenClass::Hexadecimal, _) => FormatKind::Hexadecimal,
        (TokenClass::Binary, _) => FormatKind::BinaryText,
        (TokenClass::Decimal, ',') => FormatKind::CommaSeparated,
        (TokenClass::Decimal, _) => FormatKind::TabSeparated,
    }
}

/// Score one separator
fn score(lines: &[&str], separator: char, settings: &BridgeSettings) -> Option<Candidate> {
    let rows: Vec<Vec<&str>> = lines.iter().map(|l| split_row(l, separator)).collect();
    let has_headers = rows.len() > 1 && is_header_row(&rows[0]);
    let data = if has_headers { &rows[1..] } else { &rows[..] };
    if data.is_empty() {
        return None;
    }

    // Modal column count; ties go to the wider layout
    let mut widths: HashMap<usize, usize> = HashMap::new();
    for row in data {
        *widths.entry(row.len()).or_default() += 1;
    }
    let (cols, modal_rows) = widths
        .into_iter()
        .max_by_key(|&(width, count)| (count, width))?;
    let consistency = modal_rows as f64 / data.len() as f64;

    let tokens: Vec<&str> = data.iter().flatten().copied().collect();
    let (class, matching) = TokenClass::ALL
        .into_iter()
        .map(|class| (class, tokens.iter().filter(|t| class.matches(t)).count()))
        .fold(None, |best: Option<(TokenClass, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })?;
    let numeric = matching as f64 / tokens.len().max(1) as f64;

    let signal = if cols == 1 {
        0.5
    } else {
        data.iter().filter(|r| r.len() > 1).count() as f64 / data.len() as f64
    };

    let decimal_places = match class {
        TokenClass::Decimal => tokens
            .iter()
            .filter(|t| class.matches(t))
            .map(|t| fraction_digits(t))
            .max()
            .unwrap_or(0)
            .min(u8::MAX as usize) as u8,
        _ => settings.default_decimal_places,
    };

    let layout = CONSISTENCY_WEIGHT * consistency + SEPARATOR_WEIGHT * signal;
    let confidence = (NUMERIC_WEIGHT * numeric + numeric * layout).clamp(0.0, 1.0);

    Some(Candidate {
        spec: FormatSpec {
            kind: kind_for(class, separator),
            dimensions: (data.len(), cols),
            separator,
            has_headers,
            decimal_places,
        },
        confidence,
    })
}

/// Rank every candidate layout of `text`
pub fn detect(text: &str, settings: &BridgeSettings) -> Result<Detection> {
    guard(text, settings)?;
    let lines = content_lines(text);

    let mut candidates: Vec<Candidate> = SEPARATORS
        .iter()
        .filter_map(|&sep| score(&lines, sep, settings))
        .collect();
    // Stable sort keeps separator order on ties
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let best_confidence = candidates.first().map_or(0.0, |c| c.confidence);
    if best_confidence < settings.min_confidence || candidates.is_empty() {
        tracing::debug!(
            confidence = best_confidence,
            threshold = settings.min_confidence,
            "format detection is ambiguous"
        );
        return Err(MapError::AmbiguousFormat {
            confidence: best_confidence,
            threshold: settings.min_confidence,
        });
    }

    let best = candidates.remove(0);
    tracing::debug!(
        kind = %best.spec.kind,
        rows = best.spec.dimensions.0,
        cols = best.spec.dimensions.1,
        confidence = best.confidence,
        "detected format"
    );
    Ok(Detection {
        best,
        alternates: candidates,
    })
}
