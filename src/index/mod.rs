//! Page index generation
//!
//! Every documentation page is addressed by a three-part key `"i-j-k"`. This
//! module enumerates the full key universe and computes the work left over
//! when an interrupted crawl is resumed.

mod resume;

pub use resume::{load_completed_keys, remaining_indices};

use crate::config::IndexConfig;
use crate::CrawlError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Key of one documentation page, rendered as `"i-j-k"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageIndex {
    pub section: u32,
    pub group: u32,
    pub item: u32,
}

impl PageIndex {
    pub fn new(section: u32, group: u32, item: u32) -> Self {
        Self {
            section,
            group,
            item,
        }
    }

    /// The key as written in URLs and artifact names
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.section, self.group, self.item)
    }
}

impl FromStr for PageIndex {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(CrawlError::InvalidIndex(s.to_string()));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // u32::from_str accepts a leading '+', keys never carry one
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CrawlError::InvalidIndex(s.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| CrawlError::InvalidIndex(s.to_string()))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl Serialize for PageIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PageIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Enumerates every page index in the configured ranges
///
/// The order is the nested loop order, outer to inner: first range, second
/// range, third range. The result is the same on every call, which lets a
/// resumed run subtract the keys it already has.
///
/// # Example
///
/// ```
/// use fin_doc_crawler::config::IndexConfig;
/// use fin_doc_crawler::index::generate_indices;
///
/// let indices = generate_indices(&IndexConfig::default());
/// assert_eq!(indices.len(), 100);
/// assert_eq!(indices[0].to_string(), "2-1-1");
/// assert_eq!(indices[99].to_string(), "5-5-5");
/// ```
pub fn generate_indices(config: &IndexConfig) -> Vec<PageIndex> {
    let [first, second, third] = config.ranges();

    let mut indices = Vec::new();
    for section in first {
        for group in second.clone() {
            for item in third.clone() {
                indices.push(PageIndex::new(section, group, item));
            }
        }
    }
    indices
}
