// src/synth/prompt.rs
//! Prompt construction for article synthesis: fixed reporter persona plus a
//! strict output contract (front matter + markdown body) the orchestrator
//! can validate against.

use crate::article::Category;
use crate::ingest::types::FeedItem;

pub const DEFAULT_REPORTER: &str = "AI Desk";

pub const SYSTEM_PROMPT: &str = "You are an AI financial reporter for the Molt Street Journal. \
Write one original news article from the source item you are given.\n\
Rules:\n\
- Neutral, factual tone; no speculation or investment advice\n\
- 150 to 400 words of body text\n\
- Do not copy sentences from the source verbatim\n\
- Output exactly the document format requested, nothing else";

/// Build the user prompt for one feed item. The format block mirrors the
/// article file format so the response parses with the same code path as
/// stored articles.
pub fn build_prompt(item: &FeedItem) -> String {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    let published = item
        .published
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());

    let mut lines = vec![
        "Source item:".to_string(),
        format!("  feed: {}", item.feed),
        format!("  title: {}", item.title),
        format!("  link: {}", item.link),
        format!("  published: {published}"),
        format!("  suggested category: {}", item.category),
        format!("  summary: {}", item.summary),
        String::new(),
        "Respond with a markdown document in exactly this format:".to_string(),
        String::new(),
        "---".to_string(),
        "title: <headline, plain text>".to_string(),
        "date: <ISO-8601 UTC timestamp, e.g. 2026-08-27T14:00:00Z>".to_string(),
        format!("category: <one of: {}>", categories.join(", ")),
        format!("reporter: {DEFAULT_REPORTER}"),
        "summary: <one or two sentences>".to_string(),
        "tags: [<2-5 lowercase tags>]".to_string(),
        "sources:".to_string(),
        format!("  - url: {}", item.link),
        format!("    title: {}", item.title),
        format!("    feed: {}", item.feed),
        "---".to_string(),
        String::new(),
        "<article body in markdown>".to_string(),
    ];
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::item_id;

    #[test]
    fn prompt_carries_item_metadata_and_contract() {
        let item = FeedItem {
            id: item_id("Fed", "k"),
            feed: "Fed".into(),
            category: Category::Macro,
            title: "Rates unchanged".into(),
            link: "https://example.com/fed/1".into(),
            summary: "The committee held.".into(),
            published: None,
        };
        let p = build_prompt(&item);
        assert!(p.contains("title: Rates unchanged"));
        assert!(p.contains("url: https://example.com/fed/1"));
        assert!(p.contains("category: <one of: markets,"));
        assert!(p.contains(DEFAULT_REPORTER));
    }
}
