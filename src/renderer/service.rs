//! HTTP client for the headless-browser render service
//!
//! # Request Flow
//!
//! 1. Build the page URL `{base-url}?index={i-j-k}`
//! 2. POST the URL, browser identity, interaction script, wait condition,
//!    timeouts and field schema to the service
//! 3. Classify the answer:
//!
//! | Answer | Outcome |
//! |--------|---------|
//! | `success: false`, message names a missing/empty page | Empty |
//! | `success: false`, any other message | `RenderError::Service` |
//! | `extracted_content` blank, `null` or `[]` | Empty |
//! | `extracted_content` present | Rendered |
//! | `html` with `<body data-page-empty="true">` | Empty |
//! | `html` | schema applied locally, Rendered |
//! | transport timeout | `RenderError::Timeout` |

use crate::config::RendererConfig;
use crate::index::PageIndex;
use crate::renderer::script::{interaction_script, EMPTY_TAG, WAIT_CONDITION};
use crate::renderer::{
    is_empty_signal, FieldSchema, PageRenderer, RawExtraction, RenderError, RenderOutcome,
};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Browser viewport used for every render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Body of one render call
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest<'a> {
    pub url: String,
    pub js_code: String,
    pub wait_for: &'static str,
    /// Whole-page budget in milliseconds
    pub page_timeout: u64,
    /// Per-element wait budget in milliseconds
    pub wait_timeout: u64,
    pub user_agent: &'a str,
    pub locale: &'a str,
    pub headers: BTreeMap<&'static str, &'a str>,
    pub viewport: Viewport,
    pub headless: bool,
    pub bypass_cache: bool,
    pub schema: &'a FieldSchema,
}

/// Answer of the render service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderResponse {
    pub success: bool,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub extracted_content: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Builds the HTTP client used to reach the render service
///
/// The client timeout is the page budget plus a grace period, so a render
/// that hangs inside the browser surfaces as a timeout here.
pub fn build_http_client(config: &RendererConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Documentation page URL for a page index
///
/// # Example
///
/// ```
/// use fin_doc_crawler::index::PageIndex;
/// use fin_doc_crawler::renderer::page_url;
///
/// let url = page_url("https://tsanghi.com/fin/doc", &PageIndex::new(2, 1, 3)).unwrap();
/// assert_eq!(url.as_str(), "https://tsanghi.com/fin/doc?index=2-1-3");
/// ```
pub fn page_url(base_url: &str, index: &PageIndex) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut().append_pair("index", &index.key());
    Ok(url)
}

/// Render service client implementing [`PageRenderer`]
pub struct HttpRenderService {
    client: Client,
    config: RendererConfig,
}

impl HttpRenderService {
    pub fn new(config: RendererConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Builds the request body for one page
    pub fn build_request<'a>(&'a self, url: &Url, schema: &'a FieldSchema) -> RenderRequest<'a> {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent", self.config.user_agent.as_str());
        headers.insert("Accept-Language", self.config.accept_language.as_str());
        headers.insert("Referer", self.config.referer.as_str());
        headers.insert(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
        );

        RenderRequest {
            url: url.to_string(),
            js_code: interaction_script(
                &self.config.user_agent,
                &self.config.locale,
                self.config.wait_timeout_ms,
            ),
            wait_for: WAIT_CONDITION,
            page_timeout: self.config.page_timeout_ms,
            wait_timeout: self.config.wait_timeout_ms,
            user_agent: &self.config.user_agent,
            locale: &self.config.locale,
            headers,
            viewport: Viewport::default(),
            headless: true,
            bypass_cache: true,
            schema,
        }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderService {
    async fn render(&self, index: &PageIndex) -> Result<RenderOutcome, RenderError> {
        let url = page_url(&self.config.base_url, index)?;
        let schema = FieldSchema::for_page(index);
        let request = self.build_request(&url, &schema);

        tracing::debug!("Rendering {}", url);

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: RenderResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout {
                    url: url.to_string(),
                }
            } else {
                RenderError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        classify_response(body, &schema, url.as_str())
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
        }
    } else {
        RenderError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Classifies a render service answer
pub fn classify_response(
    response: RenderResponse,
    schema: &FieldSchema,
    url: &str,
) -> Result<RenderOutcome, RenderError> {
    if !response.success {
        let message = response.error_message.unwrap_or_default();
        if is_empty_signal(&message) {
            return Ok(RenderOutcome::Empty { reason: message });
        }
        return Err(RenderError::Service {
            url: url.to_string(),
            message: if message.is_empty() {
                "render service reported failure without a message".to_string()
            } else {
                message
            },
        });
    }

    if let Some(content) = response.extracted_content {
        return classify_extracted(content, url);
    }

    match response.html {
        Some(html) if !html.trim().is_empty() => {
            if is_tagged_empty(&html) {
                return Ok(empty("page tagged empty by the interaction script"));
            }
            let raw = schema.extract(&html);
            if raw.is_blank() {
                Ok(empty("no field matched the rendered page"))
            } else {
                Ok(RenderOutcome::Rendered(raw))
            }
        }
        _ => Ok(empty("render returned no content")),
    }
}

fn classify_extracted(content: Value, url: &str) -> Result<RenderOutcome, RenderError> {
    let content = match content {
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() || text == "[]" {
                return Ok(empty("extracted content is empty"));
            }
            serde_json::from_str(text).map_err(|e| RenderError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?
        }
        other => other,
    };

    match RawExtraction::from_json(content) {
        Some(raw) if !raw.is_blank() => Ok(RenderOutcome::Rendered(raw)),
        _ => Ok(empty("extracted content is empty")),
    }
}

fn is_tagged_empty(html: &str) -> bool {
    let document = Html::parse_document(html);
    match Selector::parse(&format!(r#"body[{}="true"]"#, EMPTY_TAG)) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

fn empty(reason: &str) -> RenderOutcome {
    RenderOutcome::Empty {
        reason: reason.to_string(),
    }
}
