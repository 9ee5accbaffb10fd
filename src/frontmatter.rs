// src/frontmatter.rs
//! Article file format: YAML front matter between `---` fences, markdown
//! body after. Parsing is strict: any missing required field rejects the
//! whole document rather than partially trusting input.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::{Article, Category, Source};

/// Typed view of the front-matter block for stored articles.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    title: String,
    slug: String,
    date: DateTime<Utc>,
    category: Category,
    reporter: String,
    summary: String,
    tags: Vec<String>,
    sources: Vec<Source>,
}

/// Split a document into (front matter, body). The document must start with
/// a `---` fence line and contain a closing fence.
pub fn split(text: &str) -> Result<(&str, &str)> {
    let rest = text
        .strip_prefix("---")
        .context("document does not start with front matter fence")?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end = rest
        .find("\n---")
        .context("front matter fence is not closed")?;
    let fm = &rest[..end];
    let body = rest[end + 4..].trim_start_matches('\n');
    Ok((fm, body))
}

/// Parse a stored article document. Fails closed on any missing or
/// ill-typed required field.
pub fn parse_article(text: &str) -> Result<Article> {
    let (fm_raw, body) = split(text)?;
    let h: Header = serde_yaml::from_str(fm_raw).context("parsing article front matter")?;
    validate(&h)?;
    Ok(Article {
        slug: h.slug,
        title: h.title,
        date: h.date,
        category: h.category,
        reporter: h.reporter,
        summary: h.summary,
        tags: h.tags,
        sources: h.sources,
        body: body.trim_end().to_string(),
    })
}

/// Render an article back to its on-disk form. `parse_article` of the
/// result yields a field-for-field equal record.
pub fn render_article(a: &Article) -> String {
    let header = Header {
        title: a.title.clone(),
        slug: a.slug.clone(),
        date: a.date,
        category: a.category,
        reporter: a.reporter.clone(),
        summary: a.summary.clone(),
        tags: a.tags.clone(),
        sources: a.sources.clone(),
    };
    // Header is a plain struct; YAML serialization cannot fail here.
    let yaml = serde_yaml::to_string(&header).unwrap_or_default();
    format!("---\n{yaml}---\n\n{}\n", a.body.trim_end())
}

fn validate(h: &Header) -> Result<()> {
    if h.title.trim().is_empty() {
        bail!("empty title");
    }
    if h.slug.trim().is_empty() {
        bail!("empty slug");
    }
    if !h
        .slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!("slug '{}' is not URL-safe", h.slug);
    }
    if h.sources.is_empty() {
        bail!("article has no sources; provenance is mandatory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Article {
        Article {
            slug: "fed-holds-rates".into(),
            title: "Fed Holds Rates".into(),
            date: Utc.with_ymd_and_hms(2026, 8, 27, 12, 30, 0).unwrap(),
            category: Category::Macro,
            reporter: "AI Desk".into(),
            summary: "The Fed left rates unchanged.\nMarkets were calm.".into(),
            tags: vec!["fed".into(), "rates".into()],
            sources: vec![Source {
                url: "https://example.com/a".into(),
                title: "Fed statement".into(),
                feed: "Fed".into(),
            }],
            body: "The Federal Reserve held rates steady.\n\nMore detail here.".into(),
        }
    }

    #[test]
    fn round_trip_is_field_for_field_equal() {
        let a = sample();
        let text = render_article(&a);
        let b = parse_article(&text).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_required_field_fails_closed() {
        let doc = "---\ntitle: X\nslug: x\n---\n\nbody\n";
        assert!(parse_article(doc).is_err());
    }

    #[test]
    fn empty_sources_rejected() {
        let mut a = sample();
        a.sources.clear();
        let text = render_article(&a);
        assert!(parse_article(&text).is_err());
    }

    #[test]
    fn unknown_category_rejected() {
        let a = sample();
        let text = render_article(&a).replace("category: macro", "category: satire");
        assert!(parse_article(&text).is_err());
    }

    #[test]
    fn hostile_title_survives_round_trip() {
        let mut a = sample();
        a.title = "<script>alert(1)</script>".into();
        let b = parse_article(&render_article(&a)).unwrap();
        assert_eq!(b.title, a.title);
    }
}
