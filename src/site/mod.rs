// src/site/mod.rs
//! Deterministic site builder: the full article corpus in, a static output
//! tree out. Building the same corpus twice yields byte-identical output
//! except for the `updated` timestamp shared by `index.json` and its
//! `v1/articles.json` alias. `api/today.json` depends on the current UTC
//! date but on nothing finer.

pub mod html;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::article::{Article, Category};
use crate::config::SiteInfo;
use crate::error::PipelineError;
use crate::frontmatter;
use crate::fsutil::write_atomic;

const APP_JS: &str = include_str!("../../assets/app.js");
const STYLE_CSS: &str = include_str!("../../assets/style.css");

/// One article's entry in the agent JSON index. Field names are a
/// compatibility surface for agent consumers; do not rename without
/// versioning.
#[derive(Debug, Serialize)]
pub struct IndexEntry {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub category: String,
    pub tags: Vec<String>,
    pub reporter: String,
    pub summary: String,
    pub sources: Vec<crate::article::Source>,
    pub url_html: String,
    pub url_md: String,
    #[serde(skip)]
    path_stem: String,
}

#[derive(Debug, Serialize)]
struct IndexStats {
    total_articles: usize,
    categories: Vec<String>,
    date_range: DateRange,
}

#[derive(Debug, Serialize)]
struct DateRange {
    earliest: Option<String>,
    latest: Option<String>,
}

#[derive(Debug, Serialize)]
struct IndexDoc<'a> {
    name: &'a str,
    url: &'a str,
    description: &'a str,
    /// The one wall-clock value in the output tree.
    updated: String,
    stats: IndexStats,
    articles: &'a [IndexEntry],
}

/// Per-category API document under `api/category/<cat>.json`.
#[derive(Debug, Serialize)]
struct CategoryDoc<'a> {
    category: &'a str,
    count: usize,
    articles: Vec<&'a IndexEntry>,
}

/// `api/today.json`: the current UTC day's articles only.
#[derive(Debug, Serialize)]
struct TodayDoc<'a> {
    date: &'a str,
    count: usize,
    articles: Vec<&'a IndexEntry>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub articles: usize,
    pub files: usize,
}

/// Newest-date-first; ties broken by slug ascending for determinism.
pub fn sort_for_listing(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}

fn index_entry(article: &Article, site_url: &str) -> IndexEntry {
    let stem = article.path_stem();
    let base = site_url.trim_end_matches('/');
    IndexEntry {
        title: article.title.clone(),
        slug: article.slug.clone(),
        date: article.date.to_rfc3339(),
        category: article.category.as_str().to_string(),
        tags: article.tags.clone(),
        reporter: article.reporter.clone(),
        summary: article.summary.clone(),
        sources: article.sources.clone(),
        url_html: format!("{base}/{stem}.html"),
        url_md: format!("{base}/{stem}.md"),
        path_stem: stem,
    }
}

/// Escape a JSON payload for inline embedding inside a `<script>` tag.
/// `<` keeps the payload valid JSON while making `</script>` inert.
fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c")
}

pub fn build(mut articles: Vec<Article>, site: &SiteInfo, out_dir: &Path) -> Result<BuildReport> {
    sort_for_listing(&mut articles);

    // Structural check before any file is written: two articles must never
    // map to the same output path.
    let mut stems = BTreeSet::new();
    for a in &articles {
        let stem = a.path_stem();
        if !stems.insert(stem.clone()) {
            return Err(PipelineError::BuildStructuralConflict(out_dir.join(stem)).into());
        }
    }

    let entries: Vec<IndexEntry> = articles.iter().map(|a| index_entry(a, &site.url)).collect();
    let mut report = BuildReport {
        articles: articles.len(),
        ..Default::default()
    };
    let mut emit = |rel: &str, content: &str| -> Result<()> {
        write_atomic(&out_dir.join(rel), content)
            .with_context(|| format!("emitting {rel}"))?;
        report.files += 1;
        Ok(())
    };

    // Per-article pages: human HTML next to the raw markdown export.
    for (article, entry) in articles.iter().zip(&entries) {
        // articles/YYYY/MM/DD/ is four levels below the root.
        let page = html::article_page(site, article, "../../../../");
        emit(&format!("{}.html", entry.path_stem), &page)?;
        emit(&format!("{}.md", entry.path_stem), &frontmatter::render_article(article))?;
    }

    // Front page with the embedded agent index.
    let embedded =
        script_safe_json(&serde_json::to_string(&entries).context("serializing agent index")?);
    emit("index.html", &html::index_page(site, &entries, &embedded))?;

    // Category listing pages and their JSON endpoints (every category,
    // including empty ones, so links never 404).
    for cat in Category::ALL {
        let filtered: Vec<&IndexEntry> = entries
            .iter()
            .filter(|e| e.category == cat.as_str())
            .collect();
        let page = html::category_page(site, cat, &filtered, "../");
        emit(&format!("category/{cat}.html"), &page)?;

        let doc = CategoryDoc {
            category: cat.as_str(),
            count: filtered.len(),
            articles: filtered,
        };
        emit(
            &format!("api/category/{cat}.json"),
            &serde_json::to_string_pretty(&doc)
                .with_context(|| format!("serializing category api for {cat}"))?,
        )?;
    }

    // Today's articles, UTC day granularity.
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let todays: Vec<&IndexEntry> = entries.iter().filter(|e| e.date[..10] == today).collect();
    let today_doc = TodayDoc {
        date: &today,
        count: todays.len(),
        articles: todays,
    };
    emit(
        "api/today.json",
        &serde_json::to_string_pretty(&today_doc).context("serializing today api")?,
    )?;

    // Agent JSON index.
    let dates: Vec<&str> = entries.iter().map(|e| &e.date[..10]).collect();
    let doc = IndexDoc {
        name: &site.name,
        url: &site.url,
        description: &site.description,
        updated: Utc::now().to_rfc3339(),
        stats: IndexStats {
            total_articles: entries.len(),
            categories: entries
                .iter()
                .map(|e| e.category.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            date_range: DateRange {
                earliest: dates.iter().min().map(|s| s.to_string()),
                latest: dates.iter().max().map(|s| s.to_string()),
            },
        },
        articles: &entries,
    };
    let index_json = serde_json::to_string_pretty(&doc).context("serializing index.json")?;
    emit("index.json", &index_json)?;
    // Stable versioned alias for agent consumers; identical bytes.
    emit("v1/articles.json", &index_json)?;

    // Discovery + syndication extras.
    emit("llms.txt", &llms_txt(site, &entries))?;
    emit("llms-full.txt", &llms_full_txt(site, &articles))?;
    emit(".well-known/ai-plugin.json", &ai_plugin_json(site)?)?;
    emit("feed.xml", &feed_xml(site, &articles))?;
    emit("sitemap.xml", &sitemap_xml(site, &entries))?;
    emit(
        "robots.txt",
        &format!(
            "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
            site.url.trim_end_matches('/')
        ),
    )?;

    // Static assets for the dual-view client.
    emit("app.js", APP_JS)?;
    emit("style.css", STYLE_CSS)?;

    Ok(report)
}

/// Agent discovery file: where the machine-readable surfaces live.
fn llms_txt(site: &SiteInfo, entries: &[IndexEntry]) -> String {
    let base = site.url.trim_end_matches('/');
    let mut lines = vec![
        format!("# {}", site.name),
        String::new(),
        format!("> {}", site.description),
        String::new(),
        "## API".to_string(),
        String::new(),
        format!("- [Article Index (JSON)]({base}/index.json): structured index of all articles"),
        format!("- [Today's Articles (JSON)]({base}/api/today.json): articles published today (UTC)"),
        format!("- [Category API]({base}/api/category/): per-category JSON endpoints"),
        format!("- [Versioned API]({base}/v1/articles.json): stable v1 endpoint for all articles"),
        format!("- [RSS Feed]({base}/feed.xml): standard RSS 2.0 feed"),
        format!("- [Full Content]({base}/llms-full.txt): complete article text for LLM consumption"),
        "- Raw markdown: every article is also served as `.md` next to its `.html`".to_string(),
        String::new(),
        "## Recent Articles".to_string(),
        String::new(),
    ];
    for e in entries.iter().take(20) {
        let summary: String = e.summary.chars().take(120).collect();
        lines.push(format!("- [{}]({}): {}", e.title, e.url_md, summary));
    }
    lines.join("\n") + "\n"
}

/// Full article text in one flat file, newest first, for LLM consumption.
fn llms_full_txt(site: &SiteInfo, articles: &[Article]) -> String {
    let mut lines = vec![
        format!("# {} - Full Content", site.name),
        String::new(),
        format!("> {}", site.description),
        String::new(),
    ];
    for a in articles {
        lines.push(format!("## {}", a.title));
        lines.push(String::new());
        lines.push(format!("Date: {}", a.date.format("%Y-%m-%d")));
        lines.push(format!("Category: {}", a.category));
        lines.push(format!("Tags: {}", a.tags.join(", ")));
        lines.push(format!("Reporter: {}", a.reporter));
        lines.push(String::new());
        lines.push(a.body.clone());
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Plugin manifest pointing agents at every machine-readable endpoint.
fn ai_plugin_json(site: &SiteInfo) -> Result<String> {
    let base = site.url.trim_end_matches('/');
    let name_for_model = site
        .name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let manifest = serde_json::json!({
        "schema_version": "v1",
        "name_for_human": site.name,
        "name_for_model": name_for_model,
        "description_for_human": site.description,
        "description_for_model": format!(
            "{} Articles carry structured metadata (category, tags, sources) \
             and are available in HTML, JSON, and Markdown formats.",
            site.description
        ),
        "api": { "type": "openapi", "url": format!("{base}/index.json") },
        "endpoints": {
            "articles_json": format!("{base}/index.json"),
            "articles_v1": format!("{base}/v1/articles.json"),
            "today": format!("{base}/api/today.json"),
            "category": format!("{base}/api/category/{{category}}.json"),
            "articles_rss": format!("{base}/feed.xml"),
            "llms_txt": format!("{base}/llms.txt"),
            "llms_full_txt": format!("{base}/llms-full.txt"),
            "sitemap": format!("{base}/sitemap.xml"),
        },
    });
    serde_json::to_string_pretty(&manifest).context("serializing ai-plugin manifest")
}

fn xml_esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// RSS 2.0 re-export of the newest articles.
fn feed_xml(site: &SiteInfo, articles: &[Article]) -> String {
    let base = site.url.trim_end_matches('/');
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<rss version=\"2.0\">\n<channel>\n");
    out.push_str(&format!("  <title>{}</title>\n", xml_esc(&site.name)));
    out.push_str(&format!("  <link>{}</link>\n", xml_esc(&site.url)));
    out.push_str(&format!(
        "  <description>{}</description>\n",
        xml_esc(&site.description)
    ));
    for a in articles.iter().take(50) {
        out.push_str("  <item>\n");
        out.push_str(&format!("    <title>{}</title>\n", xml_esc(&a.title)));
        out.push_str(&format!(
            "    <link>{base}/{}.html</link>\n",
            a.path_stem()
        ));
        out.push_str(&format!(
            "    <guid isPermaLink=\"false\">{}</guid>\n",
            xml_esc(&a.slug)
        ));
        out.push_str(&format!("    <pubDate>{}</pubDate>\n", a.date.to_rfc2822()));
        out.push_str(&format!(
            "    <description>{}</description>\n",
            xml_esc(&a.summary)
        ));
        out.push_str("  </item>\n");
    }
    out.push_str("</channel>\n</rss>\n");
    out
}

fn sitemap_xml(site: &SiteInfo, entries: &[IndexEntry]) -> String {
    let base = site.url.trim_end_matches('/');
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    out.push_str(&format!(
        "  <url><loc>{base}/</loc><changefreq>hourly</changefreq></url>\n"
    ));
    for e in entries {
        out.push_str(&format!(
            "  <url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
            xml_esc(&e.url_html),
            &e.date[..10]
        ));
    }
    out.push_str("</urlset>\n");
    out
}
