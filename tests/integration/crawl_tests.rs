//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the registry and run
//! the full harvest cycle end-to-end against a SQLite database.

use cultivar_harvest::config::{Config, DEFAULT_ACCEPT, DEFAULT_USER_AGENT};
use cultivar_harvest::crawler::{Coordinator, HttpFetcher};
use cultivar_harvest::storage::{RunStatus, SqliteStorage};
use cultivar_harvest::{CrawlPhase, HarvestError};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock registry
fn create_test_config(base_url: &str, last_page: u32, db_path: &str) -> Config {
    let mut config = Config::default();
    config.registry.host = format!("{}/", base_url);
    config.registry.listing_url = format!("{}/registry/", base_url);
    config.registry.first_page = 1;
    config.registry.last_page = last_page;
    config.http.timeout_secs = Some(5);
    config.output.database_path = db_path.to_string();
    config
}

fn listing_page(entries: &[(&str, &str, &str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(id, name, patent, year)| {
            format!(
                r#"<li id="bx_{id}" class="results__item">
                    <a href="/registry/sort/{id}/"><span class="results__name">{name}</span></a>
                    <span class="results__patent">{patent}</span>
                    <span class="results__allow">Год включения в Госреестр: {year}</span>
                </li>"#
            )
        })
        .collect();
    format!(
        r#"<html><head><title>Реестр</title></head><body><ul class="results">{}</ul></body></html>"#,
        items
    )
}

fn detail_page(description: &str, characteristics: &[&str]) -> String {
    format!(
        r#"<html><body><ul class="sort-info">
            <li><b>Описание:</b> {}</li>
            <li><b>Характеристики:</b><br>{}</li>
        </ul></body></html>"#,
        description,
        characteristics.join("<br>")
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/registry/"))
        .and(query_param("PAGEN_1", page.to_string().as_str()))
        .and(query_param("set_filter", "Y"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/registry/sort/{}/", id).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_registry(server: &MockServer) {
    mount_listing(
        server,
        1,
        listing_page(&[
            ("101", "Аврора", "9154", "2006"),
            ("102", "Белла Роса", "", "2005"),
        ]),
    )
    .await;
    mount_listing(
        server,
        2,
        listing_page(&[("201", "Гала", "10872", "2008")]),
    )
    .await;

    mount_detail(
        server,
        "101",
        detail_page("Среднеранний столовый сорт.", &["Урожайность 214-396 ц/га"]),
    )
    .await;
    mount_detail(
        server,
        "102",
        detail_page("Ранний сорт.", &["Крахмал 12.6-15.7%", "Масса клубня 115-210 г"]),
    )
    .await;
    mount_detail(
        server,
        "201",
        detail_page("Среднеранний сорт.", &["Устойчив к раку"]),
    )
    .await;
}

fn coordinator(config: Config) -> Coordinator<HttpFetcher, SqliteStorage> {
    let fetcher = HttpFetcher::from_config(&config.http).expect("Failed to build fetcher");
    let storage = SqliteStorage::new(std::path::Path::new(&config.output.database_path))
        .expect("Failed to open storage");
    Coordinator::new(config, "test-hash".to_string(), fetcher, storage)
        .expect("Failed to create coordinator")
}

#[tokio::test]
async fn test_full_harvest_two_pages() {
    let mock_server = MockServer::start().await;
    mount_registry(&mock_server).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("varieties.db");
    let config = create_test_config(&mock_server.uri(), 2, db_path.to_str().unwrap());

    let mut coordinator = coordinator(config);
    let summary = coordinator.run().await.expect("Harvest failed");

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.items_discovered, 3);
    assert_eq!(summary.items_processed, 3);
    assert_eq!(summary.detail_failures, 0);
    assert_eq!(coordinator.phase(), CrawlPhase::Done);

    let storage = coordinator.into_store();
    let varieties = storage.list_varieties().unwrap();
    let names: Vec<&str> = varieties.iter().map(|v| v.record.name.as_str()).collect();
    assert_eq!(names, vec!["Аврора", "Белла Роса", "Гала"]);

    let aurora = &varieties[0].record;
    assert_eq!(aurora.year, 2006);
    assert_eq!(aurora.patent_number.as_deref(), Some("9154"));
    assert_eq!(aurora.description, "Среднеранний столовый сорт.");
    assert_eq!(
        aurora.link,
        format!("{}/registry/sort/101/", mock_server.uri())
    );

    let bella = &varieties[1].record;
    assert_eq!(bella.patent_number, None);
    assert_eq!(
        bella.characteristics,
        "Характеристики:\nКрахмал 12.6-15.7%\nМасса клубня 115-210 г"
    );

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.items_processed, 3);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_detail_server_error_is_isolated() {
    let mock_server = MockServer::start().await;

    mount_listing(
        &mock_server,
        1,
        listing_page(&[
            ("101", "Аврора", "9154", "2006"),
            ("102", "Белла Роса", "", "2005"),
        ]),
    )
    .await;
    mount_detail(
        &mock_server,
        "101",
        detail_page("Среднеранний столовый сорт.", &["Урожайность высокая"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/registry/sort/102/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("varieties.db");
    let config = create_test_config(&mock_server.uri(), 1, db_path.to_str().unwrap());

    let mut coordinator = coordinator(config);
    let summary = coordinator.run().await.expect("Harvest failed");

    assert_eq!(summary.detail_failures, 1);
    assert_eq!(summary.items_processed, 2);

    let varieties = coordinator.store().list_varieties().unwrap();
    assert_eq!(varieties[0].record.description, "Среднеранний столовый сорт.");
    assert_eq!(varieties[1].record.name, "Белла Роса");
    assert_eq!(varieties[1].record.description, "");
    assert_eq!(varieties[1].record.characteristics, "");
}

#[tokio::test]
async fn test_listing_server_error_aborts_run() {
    let mock_server = MockServer::start().await;

    mount_listing(
        &mock_server,
        1,
        listing_page(&[("101", "Аврора", "9154", "2006")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/registry/"))
        .and(query_param("PAGEN_1", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("varieties.db");
    let config = create_test_config(&mock_server.uri(), 2, db_path.to_str().unwrap());

    let mut coordinator = coordinator(config);
    let result = coordinator.run().await;

    match result {
        Err(HarvestError::ListingFetch { page, source }) => {
            assert_eq!(page, 2);
            assert!(source.to_string().contains("500"));
        }
        other => panic!("Expected listing fetch failure, got {:?}", other),
    }
    assert_eq!(coordinator.phase(), CrawlPhase::Aborted);

    let storage = coordinator.into_store();
    assert_eq!(storage.count_varieties().unwrap(), 0);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error_message.is_some());
}

#[tokio::test]
async fn test_header_profile_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/registry/"))
        .and(header("accept", "text/html"))
        .and(header("user-agent", "HarvestTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("varieties.db");
    let mut config = create_test_config(&mock_server.uri(), 1, db_path.to_str().unwrap());
    config.http.accept = "text/html".to_string();
    config.http.user_agent = "HarvestTest/1.0".to_string();

    let mut coordinator = coordinator(config);
    let summary = coordinator.run().await.expect("Harvest failed");

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.items_discovered, 0);
}

#[test]
fn test_default_header_profile() {
    let config = Config::default();
    assert_eq!(config.http.accept, DEFAULT_ACCEPT);
    assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
    assert!(config.http.user_agent.contains("YaBrowser"));
}

#[tokio::test]
async fn test_rerun_refreshes_instead_of_duplicating() {
    let mock_server = MockServer::start().await;
    mount_registry(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("varieties.db");

    for _ in 0..2 {
        let config = create_test_config(&mock_server.uri(), 2, db_path.to_str().unwrap());
        let mut coordinator = coordinator(config);
        coordinator.run().await.expect("Harvest failed");
    }

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_varieties().unwrap(), 3);
    assert_eq!(storage.count_runs().unwrap(), 2);

    let latest = storage.get_latest_run().unwrap().unwrap();
    let varieties = storage.list_varieties().unwrap();
    assert!(varieties.iter().all(|v| v.last_run_id == Some(latest.id)));
}
