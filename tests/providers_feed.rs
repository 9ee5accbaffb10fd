// tests/providers_feed.rs
use moltstreet_pipeline::article::Category;
use moltstreet_pipeline::ingest::types::FeedProvider;
use moltstreet_pipeline::ingest::rss::RssFeedProvider;

const FED_RSS: &str = include_str!("fixtures/fed_rss.xml");
const WIRE_ATOM: &str = include_str!("fixtures/wire_atom.xml");
const MALFORMED: &str = include_str!("fixtures/malformed.xml");

#[tokio::test]
async fn rss_fixture_parses_into_normalized_items() {
    let provider = RssFeedProvider::from_fixture_str("Fed", Category::Macro, FED_RSS);
    let items = provider.fetch_latest().await.unwrap();
    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(first.feed, "Fed");
    assert_eq!(first.category, Category::Macro);
    assert_eq!(first.title, "FOMC leaves target range unchanged");
    assert_eq!(first.link, "https://example.org/fed/2026/08/fomc.htm");
    assert_eq!(first.id.len(), 16);
    let published = first.published.expect("pubDate should parse");
    assert_eq!(published.to_rfc3339(), "2026-08-26T18:00:00+00:00");

    // Entities decoded, tags stripped, whitespace collapsed.
    let second = &items[1];
    assert_eq!(second.title, "Minutes of the July meeting released");
    assert_eq!(second.summary, "Minutes show \"broad agreement\" among participants.");
}

#[tokio::test]
async fn rss_item_ids_are_stable_across_fetches() {
    let a = RssFeedProvider::from_fixture_str("Fed", Category::Macro, FED_RSS)
        .fetch_latest()
        .await
        .unwrap();
    let b = RssFeedProvider::from_fixture_str("Fed", Category::Macro, FED_RSS)
        .fetch_latest()
        .await
        .unwrap();
    let ids_a: Vec<&str> = a.iter().map(|i| i.id.as_str()).collect();
    let ids_b: Vec<&str> = b.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids_a, ids_b);
}

#[tokio::test]
async fn atom_fixture_parses_with_alternate_links() {
    let provider = RssFeedProvider::from_fixture_str("Wire", Category::Markets, WIRE_ATOM);
    let items = provider.fetch_latest().await.unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].title, "Chipmaker beats earnings expectations");
    // rel="alternate" wins over rel="self".
    assert_eq!(items[0].link, "https://example.net/wire/chipmaker-earnings");
    assert_eq!(
        items[0].published.unwrap().to_rfc3339(),
        "2026-08-26T11:45:00+00:00"
    );

    // Entry without `published` falls back to `updated`.
    assert_eq!(
        items[1].published.unwrap().to_rfc3339(),
        "2026-08-25T22:10:00+00:00"
    );
}

#[tokio::test]
async fn empty_atom_feed_is_a_valid_empty_snapshot() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Quiet Wire</title>
  <updated>2026-08-27T00:00:00Z</updated>
</feed>"#;
    let provider = RssFeedProvider::from_fixture_str("Quiet", Category::Markets, xml);
    let items = provider.fetch_latest().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn malformed_xml_is_an_error_not_a_panic() {
    let provider = RssFeedProvider::from_fixture_str("Broken", Category::General, MALFORMED);
    assert!(provider.fetch_latest().await.is_err());
}

#[tokio::test]
async fn max_items_caps_the_fetch() {
    let provider =
        RssFeedProvider::from_fixture_str("Fed", Category::Macro, FED_RSS).with_max_items(1);
    let items = provider.fetch_latest().await.unwrap();
    assert_eq!(items.len(), 1);
}
