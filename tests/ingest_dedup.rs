// tests/ingest_dedup.rs
// Cross-run and cross-source deduplication: fingerprint, URL, and title
// similarity, in that order of checks.

mod common;

use common::{rig, StubFetchClient};
use news_aggregator::{ArticleStore, Source, SourceStore, SourceType};
use serde_json::json;

fn feed_item(title: &str, link: &str, description: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<rss version=\"2.0\"><channel><title>W</title>\
         <item><title>{title}</title><link>{link}</link>\
         <pubDate>Wed, 19 Aug 2026 09:00:00 GMT</pubDate>\
         <description>{description}</description></item></channel></rss>"
    )
}

fn no_throttle() -> serde_json::Map<String, serde_json::Value> {
    json!({"rate_limit_delay": 0}).as_object().cloned().unwrap()
}

#[tokio::test]
async fn reingesting_the_same_feed_adds_nothing() {
    let feed = feed_item(
        "Rates hold steady",
        "https://wire.example/rates",
        "The bank held.",
    );
    let rig = rig(StubFetchClient::new().with_body("https://wire.example/feed", &feed));
    let source = Source::new("Wire", "https://wire.example/feed", SourceType::Rss, "")
        .with_config(no_throttle());
    rig.sources.save(source.clone()).await.unwrap();

    let first = rig.aggregator.run_source(source.id).await;
    let second = rig.aggregator.run_source(source.id).await;

    assert_eq!(first.articles_found, 1);
    assert_eq!(first.articles_new, 1);
    // Found counts every candidate; only new ones are persisted.
    assert_eq!(second.articles_found, 1);
    assert_eq!(second.articles_new, 0);
    assert!(second.success);
    assert_eq!(rig.articles.count_total().await.unwrap(), 1);

    let runs = rig.aggregator.ledger().snapshot_last_n(10);
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status.is_terminal()));
}

#[tokio::test]
async fn same_story_from_a_second_source_is_skipped_by_fingerprint() {
    // Identical title and body, different URL.
    let rig = rig(
        StubFetchClient::new()
            .with_body(
                "https://alpha.example/feed",
                &feed_item("Port strike ends", "https://alpha.example/port", "Dockers return."),
            )
            .with_body(
                "https://beta.example/feed",
                &feed_item("Port strike ends", "https://beta.example/port", "Dockers return."),
            ),
    );
    let alpha = Source::new("Alpha", "https://alpha.example/feed", SourceType::Rss, "");
    let beta = Source::new("Beta", "https://beta.example/feed", SourceType::Rss, "");
    rig.sources.save(alpha.clone()).await.unwrap();
    rig.sources.save(beta.clone()).await.unwrap();

    let first = rig.aggregator.run_source(alpha.id).await;
    let second = rig.aggregator.run_source(beta.id).await;

    assert_eq!(first.articles_new, 1);
    assert_eq!(second.articles_found, 1);
    assert_eq!(second.articles_new, 0);
    assert_eq!(rig.articles.count_total().await.unwrap(), 1);

    let kept = rig.articles.find_latest(10, 0).await.unwrap();
    assert_eq!(kept[0].source_name, "Alpha");
}

#[tokio::test]
async fn near_identical_title_is_skipped_by_similarity() {
    // Different URL and body; the candidate's title is wholly contained in
    // the stored one, putting the similarity ratio above the threshold.
    let rig = rig(
        StubFetchClient::new()
            .with_body(
                "https://alpha.example/feed",
                &feed_item(
                    "Fed Raises Rates Again Today",
                    "https://alpha.example/fed",
                    "A quarter point.",
                ),
            )
            .with_body(
                "https://beta.example/feed",
                &feed_item(
                    "Fed Raises Rates Again",
                    "https://beta.example/fed-hike",
                    "Another quarter point move.",
                ),
            ),
    );
    let alpha = Source::new("Alpha", "https://alpha.example/feed", SourceType::Rss, "");
    let beta = Source::new("Beta", "https://beta.example/feed", SourceType::Rss, "");
    rig.sources.save(alpha.clone()).await.unwrap();
    rig.sources.save(beta.clone()).await.unwrap();

    rig.aggregator.run_source(alpha.id).await;
    let second = rig.aggregator.run_source(beta.id).await;

    assert_eq!(second.articles_found, 1);
    assert_eq!(second.articles_new, 0);
    assert_eq!(rig.articles.count_total().await.unwrap(), 1);
}

#[tokio::test]
async fn unrelated_titles_from_a_second_source_are_kept() {
    let rig = rig(
        StubFetchClient::new()
            .with_body(
                "https://alpha.example/feed",
                &feed_item("Rates hold steady", "https://alpha.example/rates", "Held."),
            )
            .with_body(
                "https://beta.example/feed",
                &feed_item("Chip fab breaks ground", "https://beta.example/fab", "Shovels in."),
            ),
    );
    let alpha = Source::new("Alpha", "https://alpha.example/feed", SourceType::Rss, "");
    let beta = Source::new("Beta", "https://beta.example/feed", SourceType::Rss, "");
    rig.sources.save(alpha.clone()).await.unwrap();
    rig.sources.save(beta.clone()).await.unwrap();

    rig.aggregator.run_source(alpha.id).await;
    let second = rig.aggregator.run_source(beta.id).await;

    assert_eq!(second.articles_new, 1);
    assert_eq!(rig.articles.count_total().await.unwrap(), 2);
}
