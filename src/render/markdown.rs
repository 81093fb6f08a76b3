use std::fmt::Write;

use serde_json::Value;

use crate::core::record::Record;
use crate::core::row::AlignmentRow;

/// Keys that name an outline node, checked case-insensitively
const TITLE_KEYS: [&str; 5] = ["title", "name", "module", "header", "topic"];

/// Placeholder for the absent side of a row
const EMPTY_CELL: &str = "∅";

/// Render aligned rows as a four-column markdown table
pub fn rows_to_markdown(rows: &[AlignmentRow]) -> String {
    let mut out = String::from("| TOC 1 (Master) | TOC 2 | Status | Rationale |\n");
    out.push_str("|---|---|---|---|\n");
    for row in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            cell(row.master_item.as_ref()),
            cell(row.candidate_item.as_ref()),
            row.classification,
            escape(&row.rationale),
        );
    }
    out
}

fn cell(record: Option<&Record>) -> String {
    match record {
        Some(r) if r.label().is_empty() => format!("`{}`", escape(r.identity())),
        Some(r) => format!("`{}` {}", escape(r.identity()), escape(r.label())),
        None => EMPTY_CELL.to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Render arbitrary TOC-like JSON as a nested markdown bullet list.
///
/// Objects with a title-like key become one bullet with their array children nested
/// below; other objects list their keys. Keys are visited in document order, so the first
/// title-like key wins.
pub fn json_to_markdown(value: &Value) -> String {
    let mut out = String::new();
    write_outline(&mut out, value, 0);
    out
}

fn write_outline(out: &mut String, value: &Value, level: usize) {
    let indent = "  ".repeat(level);
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_outline(out, item, level);
            }
        }
        Value::Object(map) => {
            let title = map
                .iter()
                .find(|(k, _)| TITLE_KEYS.contains(&k.to_lowercase().as_str()));

            if let Some((_, title)) = title {
                let _ = writeln!(out, "{indent}- **{}**", scalar(title));
                for child in map.values().filter(|v| v.is_array()) {
                    write_outline(out, child, level + 1);
                }
                return;
            }

            for (key, child) in map {
                if child.is_object() || child.is_array() {
                    let _ = writeln!(out, "{indent}- **{key}**:");
                    write_outline(out, child, level + 1);
                } else {
                    let _ = writeln!(out, "{indent}- **{key}**: {}", scalar(child));
                }
            }
        }
        scalar_value => {
            let _ = writeln!(out, "{indent}- {}", scalar(scalar_value));
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
