//! Three-level title reconstruction
//!
//! Documentation pages carry their position as a breadcrumb ("category >
//! subcategory") plus an operation name. Both parts are recovered through
//! ordered strategy lists; the first strategy producing a value wins.

use crate::normalizer::text::clean_text;
use crate::normalizer::{first_success, Strategy};
use crate::renderer::RawExtraction;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Separator between title levels in the composed title
pub const TITLE_SEPARATOR: &str = " > ";

static SECTION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"div(\d+-\d+-\d+)_\d+").unwrap());

/// Structural selectors tried for the operation name, in priority order
const OPERATION_SELECTORS: &[&str] = &[
    "div.containerFlex .flex-item p",
    "div.containerFlex h3",
    "h3.api-section-title",
    ".api-title",
    ".page-title h3",
    ".main-content h3",
];

const GREY_MARKERS: &[&str] = &["#7f7f7f", "rgb(127", "gray", "grey"];

/// Level 1 and level 2 of the title hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Breadcrumb {
    pub category: String,
    pub subcategory: String,
}

/// Splits breadcrumb text on `>` into category and subcategory
///
/// Text without a separator is taken as the category alone.
pub fn split_breadcrumb(text: &str) -> Option<Breadcrumb> {
    let text = clean_text(text);
    if text.is_empty() {
        return None;
    }

    let breadcrumb = match text.split_once('>') {
        Some((category, rest)) => {
            let subcategory = rest.split('>').next().unwrap_or_default();
            Breadcrumb {
                category: clean_text(category),
                subcategory: clean_text(subcategory),
            }
        }
        None => Breadcrumb {
            category: text,
            subcategory: String::new(),
        },
    };

    if breadcrumb.category.is_empty() && breadcrumb.subcategory.is_empty() {
        None
    } else {
        Some(breadcrumb)
    }
}

/// Breadcrumb field extracted by the renderer schema
pub fn breadcrumb_from_field(raw: &RawExtraction) -> Option<Breadcrumb> {
    raw.text("level1_2_title").and_then(split_breadcrumb)
}

/// Breadcrumb paragraph inside the page's own documentation section
///
/// The section id is embedded in element ids of the form `div{i-j-k}_1`.
pub fn breadcrumb_from_section(raw: &RawExtraction) -> Option<Breadcrumb> {
    let page = raw.page_html()?;
    let section = SECTION_ID_RE.captures(&page)?.get(1)?.as_str().to_string();
    tracing::trace!("Found documentation section id {}", section);

    let document = Html::parse_document(&page);
    let selectors = [
        format!(r#"[id="div{}_1"] > p"#, section),
        format!(".div{}_1 > p", section),
        format!(r#"[id^="div{}"] > p"#, section),
    ];

    selectors.iter().find_map(|selector| {
        let selector = parse_selector(selector)?;
        let element = document.select(&selector).next()?;
        split_breadcrumb(&element.text().collect::<String>())
    })
}

/// Grey navigation paragraph, or any paragraph shaped like a breadcrumb
pub fn breadcrumb_from_navigation(raw: &RawExtraction) -> Option<Breadcrumb> {
    let page = raw.page_html()?;
    let document = Html::parse_document(&page);
    let paragraphs = parse_selector("p")?;

    let mut fallback = None;
    for p in document.select(&paragraphs) {
        let text = p.text().collect::<String>();
        if !text.contains('>') {
            continue;
        }

        let style = p.value().attr("style").unwrap_or_default().to_lowercase();
        let grey = style.contains("color") && GREY_MARKERS.iter().any(|m| style.contains(m));
        if grey {
            return split_breadcrumb(&text);
        }
        if fallback.is_none() {
            fallback = split_breadcrumb(&text);
        }
    }
    fallback
}

/// Operation name extracted by the renderer schema
pub fn operation_from_field(raw: &RawExtraction) -> Option<String> {
    raw.text("raw_title")
        .map(clean_text)
        .filter(|title| !title.is_empty())
}

/// First plausible operation name found by the structural selectors
///
/// Candidates must be longer than 3 and shorter than 100 characters, which
/// rejects both stray fragments and whole captured paragraphs.
pub fn operation_from_structure(raw: &RawExtraction) -> Option<String> {
    let page = raw.page_html()?;
    let document = Html::parse_document(&page);

    OPERATION_SELECTORS.iter().find_map(|selector| {
        let selector = parse_selector(selector)?;
        let found = document
            .select(&selector)
            .map(|element| clean_text(&element.text().collect::<String>()))
            .find(|candidate| is_plausible_operation(candidate));
        found
    })
}

fn is_plausible_operation(candidate: &str) -> bool {
    let len = candidate.chars().count();
    len > 3 && len < 100
}

const BREADCRUMB_STRATEGIES: &[Strategy<Breadcrumb>] = &[
    breadcrumb_from_field,
    breadcrumb_from_section,
    breadcrumb_from_navigation,
];

const OPERATION_STRATEGIES: &[Strategy<String>] =
    &[operation_from_field, operation_from_structure];

/// Joins the non-empty levels with `" > "`
///
/// ```
/// use fin_doc_crawler::normalizer::compose_title;
///
/// assert_eq!(compose_title("股票", "行情", "日线"), "股票 > 行情 > 日线");
/// assert_eq!(compose_title("", "", "日线"), "日线");
/// assert_eq!(compose_title("", "", ""), "");
/// ```
pub fn compose_title(category: &str, subcategory: &str, operation: &str) -> String {
    [category, subcategory, operation]
        .iter()
        .map(|level| level.trim())
        .filter(|level| !level.is_empty())
        .collect::<Vec<_>>()
        .join(TITLE_SEPARATOR)
}

/// Rebuilds the hierarchical title of a page
///
/// When no level can be recovered the generic `title` field is used, and an
/// empty string when that is missing too.
pub fn reconstruct_title(raw: &RawExtraction) -> String {
    let breadcrumb = first_success(BREADCRUMB_STRATEGIES, raw).unwrap_or_default();
    let operation = first_success(OPERATION_STRATEGIES, raw).unwrap_or_default();

    let title = compose_title(&breadcrumb.category, &breadcrumb.subcategory, &operation);
    if !title.is_empty() {
        return title;
    }

    raw.text("title").map(clean_text).unwrap_or_default()
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Skipping unparsable selector {:?}: {:?}", selector, e);
            None
        }
    }
}
