//! Flattening of tabular report documents.
//!
//! Report data comes back as nested JSON:
//!
//! ```text
//! document.pages[].page.body.item[].lst
//!     colTitle[]            -> header row
//!     group.row[].cell[]    -> data rows
//! cell.item[0].txt.val      -> cell text
//! ```
//!
//! Pages, items, rows and cells are visited in document order. Arrays and
//! objects are both walked (objects by their values, in key insertion
//! order), anything else counts as empty. Items without a `lst` member are
//! not lists and are skipped.

use serde_json::Value;

/// One output row of cell texts.
pub type Row = Vec<String>;

/// Flatten a tabular report document into rows.
///
/// For each list, the header row comes first followed by its data rows.
/// A document without `document.pages` yields no rows.
///
/// # Examples
///
/// ```
/// use cms_mashup_core::parse_rows;
/// use serde_json::json;
///
/// assert!(parse_rows(&json!({})).is_empty());
/// ```
#[must_use]
pub fn parse_rows(document: &Value) -> Vec<Row> {
    let Some(pages) = document.get("document").and_then(|d| d.get("pages")) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for page in elements(Some(pages)) {
        for item in elements(page.pointer("/page/body/item")) {
            let Some(list) = item.get("lst") else {
                continue;
            };
            rows.push(line(list.get("colTitle")));
            for row in elements(list.pointer("/group/row")) {
                rows.push(line(row.get("cell")));
            }
        }
    }
    rows
}

fn line(cells: Option<&Value>) -> Row {
    elements(cells).into_iter().map(cell_text).collect()
}

/// `item[0].txt.val` of a cell; `fmtVal`, `valTyp` and friends are ignored.
fn cell_text(cell: &Value) -> String {
    match cell.pointer("/item/0/txt/val") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn elements(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    }
}
