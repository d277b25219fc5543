//! Full cycles against stubbed search and email endpoints.

use mockito::{Matcher, Server};
use tempfile::TempDir;

use jobwatch::config::Credentials;
use jobwatch::models::Config;
use jobwatch::pipeline::{CycleOptions, CycleState, Driver};
use jobwatch::services::{SerpApiFetcher, build_notifier};
use jobwatch::storage::{CacheStore, LocalCacheStore};

const SEARCH_BODY: &str = r#"{
    "jobs_results": [
        {
            "title": "Frontend Engineer",
            "company_name": "Acme",
            "location": "Remote",
            "share_link": "https://www.google.com/search?ibp=htl;jobs&q=a",
            "apply_options": [{"title": "LinkedIn", "link": "https://www.linkedin.com/jobs/view/1"}],
            "detected_extensions": {"posted_at": "1 day ago"}
        },
        {
            "title": "Node.js Developer",
            "company_name": "Beta",
            "share_link": "https://www.google.com/search?ibp=htl;jobs&q=b",
            "apply_options": [{"title": "Naukri", "link": "https://www.naukri.com/job/2"}]
        }
    ]
}"#;

struct Setup {
    driver: Driver,
    store: LocalCacheStore,
    _tmp: TempDir,
}

fn setup(search_url: &str, email_url: &str) -> Setup {
    let tmp = TempDir::new().unwrap();

    let mut config = Config::default();
    config.search.base_url = search_url.to_string();
    config.search.query = "frontend engineer".to_string();
    config.delivery.base_url = email_url.to_string();
    config.cache.path = tmp.path().join("seen_jobs.json");

    let credentials = Credentials {
        search_api_key: "serp-key".to_string(),
        delivery_api_key: "re_key".to_string(),
        recipient: "me@example.com".to_string(),
    };

    let store = LocalCacheStore::new(&config.cache.path);
    let driver = Driver::new(
        CycleOptions::from_config(&config, &credentials),
        Box::new(SerpApiFetcher::new(&config.search, &credentials.search_api_key).unwrap()),
        build_notifier(&config.delivery, &credentials).unwrap(),
        Box::new(store.clone()),
    );

    Setup {
        driver,
        store,
        _tmp: tmp,
    }
}

#[tokio::test]
async fn sends_digest_and_records_postings() {
    let mut search = Server::new_async().await;
    let mut email = Server::new_async().await;

    let search_mock = search
        .mock("GET", "/search.json")
        .match_query(Matcher::UrlEncoded("q".into(), "frontend engineer".into()))
        .with_status(200)
        .with_body(SEARCH_BODY)
        .create_async()
        .await;
    let email_mock = email
        .mock("POST", "/emails")
        .match_header("authorization", "Bearer re_key")
        .match_body(Matcher::Regex("via LinkedIn".into()))
        .with_status(200)
        .with_body(r#"{"id": "1"}"#)
        .expect(1)
        .create_async()
        .await;

    let s = setup(&search.url(), &email.url());
    let report = s.driver.run_cycle().await;

    search_mock.assert_async().await;
    email_mock.assert_async().await;
    assert_eq!(report.state, CycleState::Done);
    assert_eq!(report.fetched, 2);
    assert!(!report.fallback_used);
    assert_eq!(
        s.store.load().await,
        vec![
            "https://www.google.com/search?ibp=htl;jobs&q=a",
            "https://www.google.com/search?ibp=htl;jobs&q=b",
        ]
    );
}

#[tokio::test]
async fn repeat_run_falls_back_to_known_postings() {
    let mut search = Server::new_async().await;
    let mut email = Server::new_async().await;

    let _search_mock = search
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_BODY)
        .expect(2)
        .create_async()
        .await;
    let email_mock = email
        .mock("POST", "/emails")
        .with_status(200)
        .with_body(r#"{"id": "1"}"#)
        .expect(2)
        .create_async()
        .await;

    let s = setup(&search.url(), &email.url());
    let first = s.driver.run_cycle().await;
    let second = s.driver.run_cycle().await;

    email_mock.assert_async().await;
    assert!(first.is_success());
    assert!(second.is_success());
    assert!(second.fallback_used);
    assert_eq!(second.notified.len(), 2);
    assert_eq!(s.store.load().await.len(), 2);
}

#[tokio::test]
async fn delivery_failure_keeps_cache_unchanged() {
    let mut search = Server::new_async().await;
    let mut email = Server::new_async().await;

    let _search_mock = search
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_BODY)
        .create_async()
        .await;
    let _email_mock = email
        .mock("POST", "/emails")
        .with_status(500)
        .with_body(r#"{"message": "internal"}"#)
        .create_async()
        .await;

    let s = setup(&search.url(), &email.url());
    let report = s.driver.run_cycle().await;

    assert_eq!(report.state, CycleState::Failed);
    assert_eq!(report.failed_phase, Some(CycleState::Notifying));
    assert!(s.store.load().await.is_empty());
    assert!(!s.store.path().exists());
}

#[tokio::test]
async fn search_failure_sends_nothing() {
    let mut search = Server::new_async().await;
    let mut email = Server::new_async().await;

    let _search_mock = search
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let email_mock = email
        .mock("POST", "/emails")
        .expect(0)
        .create_async()
        .await;

    let s = setup(&search.url(), &email.url());
    let report = s.driver.run_cycle().await;

    email_mock.assert_async().await;
    assert_eq!(report.failed_phase, Some(CycleState::Fetching));
}
