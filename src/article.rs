// src/article.rs
//! The durable content unit and its supporting types.
//!
//! An `Article` is written once by the synthesis stage and never mutated
//! afterward; corrections are published as new articles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance triple. Every published article carries at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
    pub feed: String,
}

/// Closed category set. Unknown strings in generated output are a
/// validation failure, not a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Markets,
    Macro,
    Crypto,
    PersonalFinance,
    RealEstate,
    Tech,
    Commodities,
    International,
    Deals,
    General,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Markets,
        Category::Macro,
        Category::Crypto,
        Category::PersonalFinance,
        Category::RealEstate,
        Category::Tech,
        Category::Commodities,
        Category::International,
        Category::Deals,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Markets => "markets",
            Category::Macro => "macro",
            Category::Crypto => "crypto",
            Category::PersonalFinance => "personal-finance",
            Category::RealEstate => "real-estate",
            Category::Tech => "tech",
            Category::Commodities => "commodities",
            Category::International => "international",
            Category::Deals => "deals",
            Category::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique, URL-safe, immutable once assigned.
    pub slug: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub category: Category,
    pub reporter: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub sources: Vec<Source>,
    /// Markdown prose. Stored verbatim; rendered to HTML only at build time.
    #[serde(skip)]
    pub body: String,
}

impl Article {
    /// Relative output path stem shared by the HTML and markdown exports,
    /// e.g. `articles/2026/08/27/fed-holds-rates`.
    pub fn path_stem(&self) -> String {
        format!(
            "articles/{}/{}",
            self.date.format("%Y/%m/%d"),
            self.slug
        )
    }
}

const MAX_SLUG_LEN: usize = 80;

/// Derive a URL-safe slug from a title: lowercase, alphanumeric runs joined
/// by single hyphens, capped in length. Empty titles produce "untitled".
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_hyphen = true; // suppress leading hyphen
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            out.push('-');
            prev_hyphen = true;
        }
        if out.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("untitled");
    }
    out
}
