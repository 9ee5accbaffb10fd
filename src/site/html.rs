// src/site/html.rs
//! HTML page rendering. No templating engine: pages are small and assembled
//! from string builders, with every interpolated value passing through
//! `esc`/`esc_attr`. Article bodies are the only markdown-rendered content;
//! everything else is treated as untrusted text.

use pulldown_cmark::{html::push_html, Event, Options, Parser};

use crate::article::{Article, Category};
use crate::config::SiteInfo;
use crate::site::IndexEntry;

pub fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

pub fn esc_attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}

/// Render a markdown body. Raw HTML embedded in the markdown is demoted to
/// text so generated bodies can never inject live markup.
pub fn markdown_to_html(md: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(md, opts).map(|ev| match ev {
        Event::Html(raw) => Event::Text(raw),
        Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(md.len() * 2);
    push_html(&mut out, parser);
    out
}

/// Shared page shell. `base` is the relative prefix back to the site root
/// ("" at the root, "../" one level down, and so on).
fn page(site: &SiteInfo, title: &str, base: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{base}style.css">
</head>
<body>
<header>
<a class="site-name" href="{base}index.html">{site_name}</a>
<p class="site-tagline">{tagline}</p>
</header>
<main>
{main}
</main>
<footer>
<p>{site_name} &middot; <a href="{base}index.json">index.json</a> &middot; <a href="{base}llms.txt">llms.txt</a> &middot; <a href="{base}feed.xml">rss</a></p>
</footer>
</body>
</html>
"#,
        lang = esc_attr(&site.language),
        title = esc(title),
        base = base,
        site_name = esc(&site.name),
        tagline = esc(&site.description),
    )
}

fn listing(entries: &[&IndexEntry], base: &str) -> String {
    let mut out = String::from("<ul class=\"article-list\">\n");
    for e in entries {
        out.push_str(&format!(
            "<li><time>{date}</time> <span class=\"category\">{cat}</span> <a href=\"{base}{href}\">{title}</a><p class=\"summary\">{summary}</p></li>\n",
            date = esc(&e.date[..10.min(e.date.len())]),
            cat = esc(&e.category),
            base = base,
            href = esc_attr(&format!("{}.html", e.path_stem)),
            title = esc(&e.title),
            summary = esc(&e.summary),
        ));
    }
    out.push_str("</ul>\n");
    out
}

/// Front page: human listing plus the hidden agent container and the
/// embedded JSON index. `agent_json` must already be script-safe (`<`
/// escaped); it is interpolated verbatim.
pub fn index_page(site: &SiteInfo, entries: &[IndexEntry], agent_json: &str) -> String {
    let refs: Vec<&IndexEntry> = entries.iter().collect();
    let mut main = String::new();
    main.push_str("<div class=\"view-bar\"><button id=\"view-toggle\" type=\"button\">Agent view</button></div>\n");
    main.push_str("<section id=\"human-view\">\n");
    main.push_str(&listing(&refs, ""));
    main.push_str("</section>\n");
    main.push_str("<section id=\"agent-view\" hidden></section>\n");
    main.push_str(&format!(
        "<script id=\"agent-index\" type=\"application/json\">{agent_json}</script>\n"
    ));
    main.push_str("<script src=\"app.js\"></script>\n");
    page(site, &site.name, "", &main)
}

pub fn article_page(site: &SiteInfo, article: &Article, base: &str) -> String {
    let mut main = String::new();
    main.push_str(&format!("<article>\n<h1>{}</h1>\n", esc(&article.title)));
    main.push_str(&format!(
        "<p class=\"meta\"><time>{date}</time> &middot; <span class=\"category\">{cat}</span> &middot; <span class=\"reporter\">{rep}</span></p>\n",
        date = esc(&article.date.format("%Y-%m-%d %H:%M UTC").to_string()),
        cat = esc(article.category.as_str()),
        rep = esc(&article.reporter),
    ));
    if !article.tags.is_empty() {
        main.push_str("<p class=\"tags\">");
        for tag in &article.tags {
            main.push_str(&format!("<span class=\"tag\">{}</span> ", esc(tag)));
        }
        main.push_str("</p>\n");
    }
    if !article.summary.is_empty() {
        main.push_str(&format!("<p class=\"summary\">{}</p>\n", esc(&article.summary)));
    }
    main.push_str("<div class=\"body\">\n");
    main.push_str(&markdown_to_html(&article.body));
    main.push_str("</div>\n");
    main.push_str("<section class=\"sources\">\n<h2>Sources</h2>\n<ul>\n");
    for s in &article.sources {
        main.push_str(&format!(
            "<li><a href=\"{url}\" rel=\"nofollow\">{title}</a> ({feed})</li>\n",
            url = esc_attr(&s.url),
            title = esc(&s.title),
            feed = esc(&s.feed),
        ));
    }
    main.push_str("</ul>\n</section>\n");
    main.push_str(&format!(
        "<p class=\"raw-link\"><a href=\"{}.md\">Raw markdown</a></p>\n",
        esc_attr(&article.slug)
    ));
    main.push_str("</article>\n");
    page(site, &article.title, base, &main)
}

pub fn category_page(
    site: &SiteInfo,
    category: Category,
    entries: &[&IndexEntry],
    base: &str,
) -> String {
    let mut main = String::new();
    main.push_str(&format!("<h1>{}</h1>\n", esc(category.as_str())));
    if entries.is_empty() {
        main.push_str("<p>No articles yet.</p>\n");
    } else {
        main.push_str(&listing(entries, base));
    }
    page(site, category.as_str(), base, &main)
}
