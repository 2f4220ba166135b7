use crate::index::PageIndex;
use crate::renderer::RawExtraction;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;

/// How a field's matches are turned into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text content of the first match
    Text,
    /// Outer HTML of the first match
    Html,
    /// Outer HTML of every match
    HtmlList,
}

/// One declared field: name, CSS selector group and extraction kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
}

impl FieldSpec {
    fn new(name: &str, selector: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.into(),
            kind,
        }
    }
}

/// Declared extraction schema applied to a rendered documentation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "baseSelector")]
    pub base_selector: String,
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// The documentation page schema
    ///
    /// The breadcrumb selector is parameterized with the page index because
    /// the site addresses each section by an id derived from it.
    pub fn for_page(index: &PageIndex) -> Self {
        use FieldKind::{Html, HtmlList, Text};

        let fields = vec![
            FieldSpec::new(
                "title",
                "h1, .doc-title, .api-title, .page-title, header h1, .main-title",
                Text,
            ),
            FieldSpec::new(
                "raw_title",
                ".containerFlex .flex-item p, div.containerFlex h3, h3.api-section-title, .main-content h3",
                Text,
            ),
            FieldSpec::new(
                "level1_2_title",
                format!(r#"[id="div{0}_1"] > p, .div{0}_1 > p"#, index),
                Text,
            ),
            FieldSpec::new(
                "description",
                ".description, .doc-description, p.intro, .api-description, .summary, .overview",
                Text,
            ),
            FieldSpec::new(
                "api_endpoint",
                ".api-endpoint, .endpoint, code.endpoint, .url, .api-url, pre.endpoint",
                Text,
            ),
            FieldSpec::new(
                "request_params_table",
                "#pane-request0 .el-table, .request-params table, .params-table, table.request, table.parameters",
                Html,
            ),
            FieldSpec::new(
                "response_params_table",
                "#pane-response0 .el-table, .response-params table, .response-table, table.response",
                Html,
            ),
            FieldSpec::new(
                "restful_api",
                ".api-section, .api, .endpoint-section, #api-details",
                Text,
            ),
            FieldSpec::new(
                "request",
                "#pane-request0, .request-section, .request, #request-details",
                Html,
            ),
            FieldSpec::new(
                "response",
                "#pane-response0, .response-section, .response, #response-details",
                Html,
            ),
            FieldSpec::new(
                "python_example",
                "pre.python-code, pre, code.python, .code-example, .example-code",
                Text,
            ),
            FieldSpec::new("page_content", "body", Html),
            FieldSpec::new("all_tables", ".el-table, table", HtmlList),
        ];

        Self {
            name: "API文档".to_string(),
            base_selector: "body".to_string(),
            fields,
        }
    }

    /// Applies the schema to rendered HTML
    ///
    /// A field whose selector does not parse, or matches nothing, is left out;
    /// the remaining fields are still extracted.
    pub fn extract(&self, html: &str) -> RawExtraction {
        let document = Html::parse_document(html);
        let mut raw = RawExtraction::default();

        for field in &self.fields {
            let selector = match Selector::parse(&field.selector) {
                Ok(selector) => selector,
                Err(e) => {
                    tracing::warn!(
                        "Field '{}' has an unparsable selector: {:?}",
                        field.name,
                        e
                    );
                    continue;
                }
            };

            let mut matches = document.select(&selector);
            let value = match field.kind {
                FieldKind::Text => matches
                    .next()
                    .map(|element| Value::String(element.text().collect::<String>().trim().to_string())),
                FieldKind::Html => matches.next().map(|element| Value::String(element.html())),
                FieldKind::HtmlList => {
                    let items: Vec<Value> = matches
                        .map(|element| Value::String(element.html()))
                        .collect();
                    (!items.is_empty()).then_some(Value::Array(items))
                }
            };

            if let Some(value) = value {
                raw.insert(field.name.as_str(), value);
            }
        }

        raw
    }
}
