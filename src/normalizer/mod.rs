//! Content normalizer
//!
//! Turns the raw fields returned by the renderer into a canonical
//! [`DocRecord`]. Every field is recovered through an ordered list of
//! strategies; a field that cannot be recovered degrades to an empty value
//! instead of failing the whole record.

mod params;
mod text;
mod title;

pub use params::{
    extract_params, extract_params_regex, extract_params_structural, ParamRow, RequestParam,
    ResponseParam, REQUIRED_MARKER,
};
pub use text::{clean_html, clean_python_example, clean_text, collapse_whitespace, decode_entities};
pub use title::{compose_title, reconstruct_title, split_breadcrumb, Breadcrumb, TITLE_SEPARATOR};

use crate::renderer::RawExtraction;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An extraction strategy over the raw fields of one page
pub type Strategy<T> = fn(&RawExtraction) -> Option<T>;

/// Applies `strategies` in order and returns the first value produced
pub fn first_success<T>(strategies: &[Strategy<T>], raw: &RawExtraction) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(raw))
}

/// Normalized, persisted representation of one documentation page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    /// Hierarchical title, levels joined by `" > "`
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub request_params: Vec<RequestParam>,
    #[serde(default)]
    pub response_params: Vec<ResponseParam>,
    #[serde(default)]
    pub python_example: String,
}

impl DocRecord {
    /// A page without request parameters and without a title documents nothing
    ///
    /// Response-only pages that do carry a title are not empty.
    pub fn is_empty(&self) -> bool {
        self.request_params.is_empty() && self.title.trim().is_empty()
    }

    /// The record as plain structured data, field name to value
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Map::new(),
        }
    }
}

fn request_params_from_table(raw: &RawExtraction) -> Option<Vec<RequestParam>> {
    let params = extract_params(raw.text("request_params_table")?);
    (!params.is_empty()).then_some(params)
}

fn request_params_from_pane(raw: &RawExtraction) -> Option<Vec<RequestParam>> {
    let params = extract_params(raw.text("request")?);
    (!params.is_empty()).then_some(params)
}

fn response_params_from_table(raw: &RawExtraction) -> Option<Vec<ResponseParam>> {
    let params = extract_params(raw.text("response_params_table")?);
    (!params.is_empty()).then_some(params)
}

fn response_params_from_pane(raw: &RawExtraction) -> Option<Vec<ResponseParam>> {
    let params = extract_params(raw.text("response")?);
    (!params.is_empty()).then_some(params)
}

const REQUEST_PARAM_STRATEGIES: &[Strategy<Vec<RequestParam>>] =
    &[request_params_from_table, request_params_from_pane];

const RESPONSE_PARAM_STRATEGIES: &[Strategy<Vec<ResponseParam>>] =
    &[response_params_from_table, response_params_from_pane];

/// Normalizes the raw fields of one page into a [`DocRecord`]
///
/// # Example
///
/// ```
/// use fin_doc_crawler::normalizer::normalize;
/// use fin_doc_crawler::renderer::RawExtraction;
///
/// let mut raw = RawExtraction::default();
/// raw.insert("level1_2_title", "股票 > 行情");
/// raw.insert("raw_title", "日线");
///
/// let record = normalize(&raw);
/// assert_eq!(record.title, "股票 > 行情 > 日线");
/// assert!(record.request_params.is_empty());
/// ```
pub fn normalize(raw: &RawExtraction) -> DocRecord {
    let title = reconstruct_title(raw);
    let request_params = first_success(REQUEST_PARAM_STRATEGIES, raw).unwrap_or_default();
    let response_params = first_success(RESPONSE_PARAM_STRATEGIES, raw).unwrap_or_default();
    let python_example = raw
        .text("python_example")
        .map(clean_python_example)
        .unwrap_or_default();

    tracing::debug!(
        "Normalized '{}': {} request / {} response params",
        title,
        request_params.len(),
        response_params.len()
    );

    DocRecord {
        title,
        request_params,
        response_params,
        python_example,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST_TABLE: &str = r#"<div class="el-table"><table><tbody>
        <tr class="el-table__row">
            <td><div class="cell">token</div></td><td><div class="cell">string</div></td>
            <td><div class="cell">必选</div></td><td><div class="cell">API令牌</div></td>
        </tr>
    </tbody></table></div>"#;

    const RESPONSE_TABLE: &str = r#"<table><tbody>
        <tr class="el-table__row">
            <td><div class="cell">open</div></td><td><div class="cell">float</div></td>
            <td><div class="cell">开盘价</div></td>
        </tr>
    </tbody></table>"#;

    #[test]
    fn test_normalize_full_page() {
        let mut raw = RawExtraction::default();
        raw.insert("level1_2_title", "股票 &gt; 行情数据");
        raw.insert("raw_title", "日线行情");
        raw.insert("request_params_table", REQUEST_TABLE);
        raw.insert("response_params_table", RESPONSE_TABLE);
        raw.insert("python_example", "  importrequests\nprint(1)  ");

        let record = normalize(&raw);
        assert_eq!(record.title, "股票 > 行情数据 > 日线行情");
        assert_eq!(record.request_params.len(), 1);
        assert!(record.request_params[0].required);
        assert_eq!(record.response_params[0].name, "open");
        assert_eq!(record.python_example, "import requests\nprint(1)");
        assert!(!record.is_empty());
    }

    #[test]
    fn test_normalize_falls_back_to_panes() {
        let mut raw = RawExtraction::default();
        raw.insert("raw_title", "分钟行情");
        raw.insert("request", REQUEST_TABLE);
        raw.insert("response", RESPONSE_TABLE);

        let record = normalize(&raw);
        assert_eq!(record.request_params[0].name, "token");
        assert_eq!(record.response_params[0].name, "open");
    }

    #[test]
    fn test_broken_table_degrades_to_empty() {
        let mut raw = RawExtraction::default();
        raw.insert("raw_title", "实时行情");
        raw.insert("request_params_table", "<table><tr><td>garbage");

        let record = normalize(&raw);
        assert_eq!(record.title, "实时行情");
        assert!(record.request_params.is_empty());
        assert!(!record.is_empty());
    }

    #[test]
    fn test_emptiness_rule() {
        assert!(DocRecord::default().is_empty());

        let titled = DocRecord {
            title: "指数 > 列表".to_string(),
            ..Default::default()
        };
        assert!(!titled.is_empty());

        let response_only = DocRecord {
            response_params: vec![ResponseParam {
                name: "close".to_string(),
                kind: "float".to_string(),
                description: "收盘价".to_string(),
            }],
            ..Default::default()
        };
        assert!(response_only.is_empty());
    }

    #[test]
    fn test_to_fields() {
        let record = DocRecord {
            title: "A > B > C".to_string(),
            ..Default::default()
        };
        let fields = record.to_fields();

        assert_eq!(fields["title"], Value::String("A > B > C".to_string()));
        assert_eq!(fields["request_params"], Value::Array(vec![]));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn test_first_success_order() {
        fn none(_: &RawExtraction) -> Option<u8> {
            None
        }
        fn one(_: &RawExtraction) -> Option<u8> {
            Some(1)
        }
        fn two(_: &RawExtraction) -> Option<u8> {
            Some(2)
        }

        let raw = RawExtraction::default();
        let ordered: [Strategy<u8>; 3] = [none, one, two];
        let failing: [Strategy<u8>; 2] = [none, none];
        assert_eq!(first_success(&ordered, &raw), Some(1));
        assert_eq!(first_success(&failing, &raw), None);
        assert_eq!(first_success::<u8>(&[], &raw), None);
    }
}
