//! Request/response parameter table extraction
//!
//! The documentation site renders its parameter tables with Element UI
//! (`tr.el-table__row` rows, `div.cell` cells), but older snapshots carry the
//! same logical table with a different DOM. Extraction therefore runs a
//! structural parse first and falls back to a regex scan of the raw markup.

use crate::normalizer::text::{clean_html, clean_text};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Marker in the option cell flagging a mandatory request parameter
pub const REQUIRED_MARKER: &str = "必选";

/// Rows with fewer cells are header or malformed rows
const MIN_ROW_CELLS: usize = 3;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.el-table__row").unwrap());

static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.cell").unwrap());

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<tr class="el-table__row[^>]*>(.*?)</tr>"#).unwrap());

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="cell">(.*?)</div>"#).unwrap());

/// One row of a request parameter table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParam {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub option: String,
    pub description: String,
}

/// One row of a response parameter table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParam {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// A parameter record built from the cleaned cells of one table row
pub trait ParamRow: Sized {
    /// Builds the record, or `None` when the row has too few cells
    fn from_cells(cells: &[String]) -> Option<Self>;
}

impl ParamRow for RequestParam {
    fn from_cells(cells: &[String]) -> Option<Self> {
        match cells {
            [name, kind, option, description, ..] => Some(Self {
                name: name.clone(),
                kind: kind.clone(),
                required: option.contains(REQUIRED_MARKER),
                option: option.clone(),
                description: description.clone(),
            }),
            _ => None,
        }
    }
}

impl ParamRow for ResponseParam {
    fn from_cells(cells: &[String]) -> Option<Self> {
        match cells {
            [name, kind, description, ..] => Some(Self {
                name: name.clone(),
                kind: kind.clone(),
                description: description.clone(),
            }),
            _ => None,
        }
    }
}

/// Extracts parameter records from a table fragment
///
/// The record kind is chosen by the type parameter. The regex scanner only
/// runs when the structural parse yields no rows at all.
///
/// # Example
///
/// ```
/// use fin_doc_crawler::normalizer::{extract_params, ResponseParam};
///
/// let html = r#"<table><tbody><tr class="el-table__row">
///     <td><div class="cell">close</div></td>
///     <td><div class="cell">float</div></td>
///     <td><div class="cell">收盘价</div></td>
/// </tr></tbody></table>"#;
///
/// let params: Vec<ResponseParam> = extract_params(html);
/// assert_eq!(params[0].name, "close");
/// ```
pub fn extract_params<P: ParamRow>(table_html: &str) -> Vec<P> {
    let params = extract_params_structural(table_html);
    if !params.is_empty() {
        return params;
    }

    tracing::debug!("Structural table parse found no rows, scanning markup");
    extract_params_regex(table_html)
}

/// Parses rows and cells by their structural classes
pub fn extract_params_structural<P: ParamRow>(table_html: &str) -> Vec<P> {
    let fragment = Html::parse_fragment(table_html);

    fragment
        .select(&ROW_SELECTOR)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&CELL_SELECTOR)
                .map(|cell| clean_text(&cell.text().collect::<String>()))
                .collect();
            row_to_param(&cells)
        })
        .collect()
}

/// Scans the raw markup for rows and cells with regular expressions
pub fn extract_params_regex<P: ParamRow>(table_html: &str) -> Vec<P> {
    ROW_RE
        .captures_iter(table_html)
        .filter_map(|row| {
            let cells: Vec<String> = CELL_RE
                .captures_iter(&row[1])
                .map(|cell| clean_html(&cell[1]))
                .collect();
            row_to_param(&cells)
        })
        .collect()
}

fn row_to_param<P: ParamRow>(cells: &[String]) -> Option<P> {
    if cells.len() < MIN_ROW_CELLS {
        return None;
    }
    P::from_cells(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn cell(text: &str) -> String {
        format!(r#"<td><div class="cell">{}</div></td>"#, text)
    }

    fn row(cells: &[&str]) -> String {
        format!(
            r#"<tr class="el-table__row">{}</tr>"#,
            cells.iter().map(|c| cell(c)).collect::<String>()
        )
    }

    fn table(rows: &[String]) -> String {
        format!(
            r#"<div class="el-table"><table class="el-table__body"><tbody>{}</tbody></table></div>"#,
            rows.concat()
        )
    }

    fn request_table() -> String {
        table(&[
            row(&["token", "string", "必选", "API令牌"]),
            row(&["ticker", "string", "<span>可选</span>", "股票代码，如 600000"]),
        ])
    }

    #[test]
    fn test_request_rows() {
        let params: Vec<RequestParam> = extract_params(&request_table());

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "token");
        assert_eq!(params[0].kind, "string");
        assert!(params[0].required);
        assert_eq!(params[0].option, "必选");
        assert_eq!(params[0].description, "API令牌");

        assert!(!params[1].required);
        assert_eq!(params[1].option, "可选");
        assert_eq!(params[1].description, "股票代码，如 600000");
    }

    #[test]
    fn test_required_marker_substring() {
        let html = table(&[row(&["date", "string", "必选（默认当日）", "交易日期"])]);
        let params: Vec<RequestParam> = extract_params(&html);
        assert!(params[0].required);
    }

    #[test]
    fn test_response_rows() {
        let html = table(&[
            row(&["ticker", "string", "代码"]),
            row(&["close", "float", "收盘价"]),
        ]);
        let params: Vec<ResponseParam> = extract_params(&html);

        assert_eq!(params.len(), 2);
        assert_eq!(params[1].name, "close");
        assert_eq!(params[1].kind, "float");
        assert_eq!(params[1].description, "收盘价");
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let html = table(&[
            row(&["参数名", "类型"]),
            row(&["ticker", "string", "必选", "代码"]),
        ]);
        let params: Vec<RequestParam> = extract_params(&html);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "ticker");
    }

    #[test]
    fn test_request_needs_four_cells() {
        let html = table(&[row(&["ticker", "string", "必选"])]);
        let params: Vec<RequestParam> = extract_params(&html);
        assert!(params.is_empty());
    }

    #[test]
    fn test_regex_fallback_on_bare_rows() {
        // Stray <tr> outside a table is dropped by the HTML parser, the scanner still sees it
        let html = row(&["exchange_code", "string", "必选", "交易所代码"]);
        assert!(extract_params_structural::<RequestParam>(&html).is_empty());

        let params: Vec<RequestParam> = extract_params(&html);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "exchange_code");
        assert!(params[0].required);
    }

    #[test]
    fn test_both_paths_agree() {
        let html = request_table();
        let structural: Vec<RequestParam> = extract_params_structural(&html);
        let scanned: Vec<RequestParam> = extract_params_regex(&html);
        assert_eq!(structural, scanned);

        let keys = |p: &RequestParam| -> Vec<String> {
            match serde_json::to_value(p).unwrap() {
                Value::Object(map) => map.keys().cloned().collect(),
                _ => vec![],
            }
        };
        assert_eq!(keys(&structural[0]), keys(&scanned[0]));
        assert_eq!(
            keys(&structural[0]),
            vec!["description", "name", "option", "required", "type"]
        );
    }

    #[test]
    fn test_unrelated_markup_yields_nothing() {
        let params: Vec<ResponseParam> = extract_params("<p>no table here</p>");
        assert!(params.is_empty());
        let params: Vec<ResponseParam> = extract_params("");
        assert!(params.is_empty());
    }
}
