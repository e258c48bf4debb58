// src/ingest/mod.rs
pub mod adapters;
pub mod aggregator;
pub mod ledger;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up for whoever exports).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregator_runs_total", "Ingestion runs started.");
        describe_counter!(
            "aggregator_run_failures_total",
            "Ingestion runs that ended Failed."
        );
        describe_counter!(
            "aggregator_articles_found_total",
            "Candidates returned by adapters, post-cap."
        );
        describe_counter!(
            "aggregator_articles_new_total",
            "Candidates persisted as new articles."
        );
        describe_counter!(
            "aggregator_duplicates_total",
            "Candidates skipped as duplicates of stored articles."
        );
        describe_histogram!("adapter_fetch_ms", "Adapter fetch+parse time in milliseconds.");
    });
}

/// Normalize text from feeds and scraped pages: decode HTML entities, strip
/// tags, fold smart quotes to ASCII, collapse whitespace. No case folding —
/// titles keep their case, and duplicate similarity stays case-sensitive.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}
