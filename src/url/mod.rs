//! URL handling module for Channel-Links
//!
//! This module provides redirect unwrapping, external-link validation, host
//! extraction and the fixed social category taxonomy.

mod domain;
mod normalize;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// Re-export main functions
pub use domain::{extract_domain, strip_www};
pub use normalize::{
    extract_clean_url, is_redirect, is_valid_external_url, normalize_link, EXCLUDED_DOMAINS,
};

/// Link categories, in output column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    /// The channel's own website (back-filled from the first uncategorized link)
    Website,
    Facebook,
    Instagram,
    Twitter,
    LinkedIn,
    TikTok,
    /// Anything no keyword matched
    Other,
}

impl Category {
    /// All categories in output column order
    pub const ALL: [Category; 7] = [
        Category::Website,
        Category::Facebook,
        Category::Instagram,
        Category::Twitter,
        Category::LinkedIn,
        Category::TikTok,
        Category::Other,
    ];

    /// Returns the output table column header for this category
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Website => "Website",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Twitter => "Twitter",
            Self::LinkedIn => "LinkedIn",
            Self::TikTok => "TikTok",
            Self::Other => "Other Links",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// Keyword table checked in order; first matching category wins
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Facebook, &["facebook.com"]),
    (Category::Instagram, &["instagram.com"]),
    (Category::Twitter, &["twitter.com", "x.com"]),
    (Category::LinkedIn, &["linkedin.com"]),
    (Category::TikTok, &["tiktok.com"]),
];

/// Classifies an external URL into a social category
///
/// The whole URL is lower-cased and checked for keyword containment, so the
/// match is deliberately loose: any URL mentioning `x.com` is a Twitter link.
///
/// # Examples
///
/// ```
/// use channel_links::url::{classify, Category};
///
/// assert_eq!(classify("https://www.facebook.com/x"), Category::Facebook);
/// assert_eq!(classify("https://x.com/y"), Category::Twitter);
/// assert_eq!(classify("https://example.org"), Category::Other);
/// ```
pub fn classify(url: &str) -> Category {
    let lowered = url.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// A validated external link recovered from a channel page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedLink {
    pub title: String,
    pub url: String,
}

/// Extracted links grouped by category
///
/// Every input URL lands in exactly one list. Website holds at most one URL:
/// the first link that matched no social keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorizedLinks {
    groups: BTreeMap<Category, Vec<String>>,
}

impl CategorizedLinks {
    /// Classifies links in order and back-fills Website
    pub fn from_links(links: &[ExtractedLink]) -> Self {
        let mut groups: BTreeMap<Category, Vec<String>> = BTreeMap::new();

        for link in links {
            groups
                .entry(classify(&link.url))
                .or_default()
                .push(link.url.clone());
        }

        let mut categorized = Self { groups };
        categorized.promote_website();
        categorized
    }

    /// Moves the first uncategorized URL into Website if Website is empty
    fn promote_website(&mut self) {
        if !self.get(Category::Website).is_empty() {
            return;
        }

        let promoted = match self.groups.get_mut(&Category::Other) {
            Some(others) if !others.is_empty() => others.remove(0),
            _ => return,
        };

        self.groups.insert(Category::Website, vec![promoted]);
    }

    /// Returns the URLs in a category (empty if none)
    pub fn get(&self, category: Category) -> &[String] {
        self.groups
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the URLs of a category joined for a table cell
    pub fn joined(&self, category: Category) -> String {
        self.get(category).join(", ")
    }

    /// Total number of URLs across all categories
    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
