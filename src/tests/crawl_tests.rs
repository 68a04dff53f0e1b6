use crate::crawler::{CrawlScheduler, FetchError, RetryPolicy};
use crate::db::crawls::{get_page_failures, get_recent_crawls};
use crate::db::{MemoryPageStore, NoCrawlLog, PageStore, SqliteCrawlLog, SqlitePageStore};
use crate::parser::{ListingProbe, LocatorTable};
use crate::tests::utils::{fast_crawl, init_test_db, page_html, test_city, Card, ScriptedFetcher};

const PAGE_1: &str = "https://xx.58.com/ershoufang/";
const PAGE_2: &str = "https://xx.58.com/ershoufang/p2/";

fn probe() -> ListingProbe {
    ListingProbe::new(&LocatorTable::default()).expect("default locators compile")
}

#[test]
fn page_urls_follow_the_suffix_template() {
    let cfg = fast_crawl(3, RetryPolicy::default());
    let city = test_city();
    assert_eq!(cfg.page_url(&city, 1), PAGE_1);
    assert_eq!(cfg.page_url(&city, 2), PAGE_2);
    assert_eq!(cfg.page_url(&city, 10), "https://xx.58.com/ershoufang/p10/");
}

#[test]
fn fetches_every_page_in_order_and_stores_it() {
    let fetcher = ScriptedFetcher::new()
        .page(PAGE_1, page_html(&[Card::default()]))
        .page(PAGE_2, page_html(&[Card::default()]));
    let store = MemoryPageStore::new();
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &NoCrawlLog,
        fast_crawl(2, RetryPolicy::Limited(3)),
    );

    let report = scheduler.fetch_city_pages(&test_city());

    assert_eq!(report.pages_fetched(), 2);
    assert_eq!(report.pages_failed(), 0);
    let indices: Vec<u32> = report.pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(store.indices("XX").unwrap(), vec![1, 2]);
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn single_attempt_policy_skips_a_page_that_never_validates() {
    // no listing container anywhere: every attempt is Invalid
    let fetcher = ScriptedFetcher::new();
    let store = MemoryPageStore::new();
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &NoCrawlLog,
        fast_crawl(1, RetryPolicy::Limited(1)),
    );

    let report = scheduler.fetch_city_pages(&test_city());

    assert_eq!(fetcher.calls(), 1);
    assert!(report.pages.is_empty());
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.index, 1);
    assert_eq!(failure.attempts, 1);
    assert!(matches!(failure.last_error, FetchError::Invalid));
    assert!(store.indices("XX").unwrap().is_empty());
}

#[test]
fn transport_errors_are_retried_within_budget() {
    let fetcher = ScriptedFetcher::new()
        .page(PAGE_1, page_html(&[Card::default()]))
        .fail_first(PAGE_1, 2);
    let store = MemoryPageStore::new();
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &NoCrawlLog,
        fast_crawl(1, RetryPolicy::Limited(3)),
    );

    let report = scheduler.fetch_city_pages(&test_city());

    assert_eq!(fetcher.calls(), 3);
    assert_eq!(report.pages_fetched(), 1);
    assert_eq!(report.pages_failed(), 0);
}

#[test]
fn exhausted_page_does_not_stop_the_city() {
    let fetcher = ScriptedFetcher::new()
        .page(PAGE_1, page_html(&[Card::default()]))
        .fail_first(PAGE_1, 5)
        .page(PAGE_2, page_html(&[Card::default()]));
    let store = MemoryPageStore::new();
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &NoCrawlLog,
        fast_crawl(2, RetryPolicy::Limited(2)),
    );

    let report = scheduler.fetch_city_pages(&test_city());

    assert_eq!(report.pages_failed(), 1);
    assert!(matches!(report.failures[0].last_error, FetchError::Transport(_)));
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].index, 2);
}

#[test]
fn unbounded_policy_keeps_retrying_until_the_page_validates() {
    let fetcher = ScriptedFetcher::new()
        .page(PAGE_1, page_html(&[Card::default()]))
        .fail_first(PAGE_1, 7);
    let store = MemoryPageStore::new();
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &NoCrawlLog,
        fast_crawl(1, RetryPolicy::Unbounded),
    );

    let report = scheduler.fetch_city_pages(&test_city());

    assert_eq!(fetcher.calls(), 8);
    assert_eq!(report.pages_fetched(), 1);
}

#[test]
fn retry_policy_reads_from_toml() {
    #[derive(serde::Deserialize)]
    struct Wrap {
        retry: RetryPolicy,
    }
    let limited: Wrap = toml::from_str("retry = { limited = 5 }").unwrap();
    assert_eq!(limited.retry, RetryPolicy::Limited(5));
    let unbounded: Wrap = toml::from_str("retry = \"unbounded\"").unwrap();
    assert_eq!(unbounded.retry, RetryPolicy::Unbounded);
}

#[test]
fn sqlite_store_upserts_pages() {
    let (_dir, db) = init_test_db();
    let store = SqlitePageStore::new(db).unwrap();

    store.put("XX", 2, "<old/>").unwrap();
    store.put("XX", 1, "<one/>").unwrap();
    store.put("XX", 2, "<new/>").unwrap();
    store.put("YY", 1, "<other/>").unwrap();

    assert_eq!(store.indices("XX").unwrap(), vec![1, 2]);
    assert_eq!(store.get("XX", 2).unwrap().as_deref(), Some("<new/>"));
    assert_eq!(store.get("XX", 3).unwrap(), None);
}

#[test]
fn crawl_log_records_runs_and_failures() {
    let (_dir, db) = init_test_db();
    let log = SqliteCrawlLog::new(db.clone()).unwrap();
    let store = SqlitePageStore::new(db.clone()).unwrap();
    let fetcher = ScriptedFetcher::new().page(PAGE_1, page_html(&[Card::default()]));
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &log,
        fast_crawl(2, RetryPolicy::Limited(1)),
    );

    let report = scheduler.fetch_city_pages(&test_city());
    assert_eq!(report.pages_fetched(), 1);
    assert_eq!(report.pages_failed(), 1);

    let runs = db.with_conn(|conn| get_recent_crawls(conn)).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].city, "XX");
    assert_eq!(runs[0].pages_fetched, Some(1));
    assert_eq!(runs[0].pages_failed, Some(1));

    let failures = db
        .with_conn(|conn| get_page_failures(conn, runs[0].id))
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].page_index, 2);
    assert_eq!(failures[0].attempts, 1);
}

#[test]
fn cities_crawl_concurrently_with_reports_in_input_order() {
    let mut other = test_city();
    other.code = "YY".to_string();
    other.url = "https://yy.58.com/ershoufang/".to_string();

    let fetcher = ScriptedFetcher::new()
        .page(PAGE_1, page_html(&[Card::default()]))
        .page("https://yy.58.com/ershoufang/", page_html(&[Card::default()]));
    let store = MemoryPageStore::new();
    let scheduler = CrawlScheduler::new(
        &fetcher,
        probe(),
        &store,
        &NoCrawlLog,
        fast_crawl(1, RetryPolicy::Limited(1)),
    );

    let xx = test_city();
    let reports = scheduler.fetch_cities_concurrently(&[&xx, &other]);

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].city, "XX");
    assert_eq!(reports[1].city, "YY");
    assert!(reports.iter().all(|r| r.pages_fetched() == 1));
    assert_eq!(store.indices("YY").unwrap(), vec![1]);
}

#[test]
fn http_fetcher_rejects_a_malformed_cookie() {
    use crate::crawler::{HttpFetcher, RequestProfile};

    assert!(HttpFetcher::new(&RequestProfile::default()).is_ok());

    let profile = RequestProfile {
        cookie: Some("id=1\nx".to_string()),
        ..Default::default()
    };
    assert!(matches!(HttpFetcher::new(&profile), Err(FetchError::Config(_))));
}
