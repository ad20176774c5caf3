//! Extraction of tender candidates from a listing page's HTML table.
//!
//! The first `<table>` is read, `<div class="small">` fragments are removed
//! (they break the row layout), rows whose cells are all empty are dropped
//! and the configured text column becomes the candidate text.

use regex::Regex;
use std::sync::OnceLock;

use super::{Result, RetrievalError};
use crate::domain::Candidate;

/// Header of the listing column holding the tender description.
pub const DEFAULT_TEXT_COLUMN: &str = "VerfahrenLeistung";

struct Patterns {
    table: Regex,
    small_div: Regex,
    row: Regex,
    cell: Regex,
    tag: Regex,
    entity: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("listing pattern should compile");
        Patterns {
            table: compile(r"(?is)<table\b[^>]*>(.*?)</table>"),
            small_div: compile(r#"(?is)<div class="small">.*?</div>"#),
            row: compile(r"(?is)<tr\b[^>]*>(.*?)</tr>"),
            cell: compile(r"(?is)<t[hd]\b[^>]*>(.*?)</t[hd]>"),
            tag: compile(r"(?s)<[^>]*>"),
            entity: compile(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);"),
            whitespace: compile(r"\s+"),
        }
    })
}

fn decode_entity(name: &str) -> Option<String> {
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "ndash" => '–',
        "euro" => '€',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}

/// Visible text of a cell: tags removed, entities decoded, whitespace collapsed.
fn cell_text(html: &str) -> String {
    let p = patterns();
    let stripped = p.tag.replace_all(html, "");
    let decoded = p.entity.replace_all(&stripped, |caps: &regex::Captures<'_>| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    p.whitespace.replace_all(&decoded, " ").trim().to_string()
}

fn header_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parses the listing page into candidates taken from `text_column`.
pub fn parse_listing_table(html: &str, text_column: &str) -> Result<Vec<Candidate>> {
    let p = patterns();
    let table = p
        .table
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or(RetrievalError::TableNotFound)?
        .as_str();
    let table = p.small_div.replace_all(table, "");

    let mut rows = p.row.captures_iter(&table).map(|row| {
        p.cell
            .captures_iter(&row[1])
            .map(|cell| cell_text(&cell[1]))
            .collect::<Vec<String>>()
    });

    let header = rows.next().ok_or(RetrievalError::TableNotFound)?;
    let wanted = header_key(text_column);
    let column = header
        .iter()
        .position(|h| header_key(h) == wanted)
        .ok_or_else(|| RetrievalError::MissingColumn(text_column.to_string()))?;

    let texts = rows
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .filter_map(|mut cells| {
            if column < cells.len() {
                Some(cells.swap_remove(column))
            } else {
                None
            }
        })
        .filter(|text| !text.is_empty());

    let candidates = Candidate::enumerate(texts);
    tracing::debug!(
        columns = header.len(),
        candidates = candidates.len(),
        "Parsed listing table"
    );
    Ok(candidates)
}
