//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the headless-browser render
//! service and run the full render → normalize → persist → sweep cycle
//! against temporary output directories.

use fin_doc_crawler::config::{Config, IndexConfig};
use fin_doc_crawler::crawler::CrawlOrchestrator;
use fin_doc_crawler::index::{generate_indices, load_completed_keys, remaining_indices};
use fin_doc_crawler::renderer::HttpRenderService;
use fin_doc_crawler::storage::{sweep, ArtifactStore};
use fin_doc_crawler::PageIndex;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOC_PAGE: &str = r#"<html><head><title>API文档</title></head><body>
<div id="div2-1-1_1"><p>股票 &gt; 行情数据</p></div>
<div class="containerFlex"><div class="flex-item"><p>日线行情</p></div></div>
<div id="pane-request0"><div class="el-table"><table><tbody>
  <tr class="el-table__row">
    <td><div class="cell">token</div></td><td><div class="cell">string</div></td>
    <td><div class="cell">必选</div></td><td><div class="cell">API令牌</div></td>
  </tr>
  <tr class="el-table__row">
    <td><div class="cell">date</div></td><td><div class="cell">string</div></td>
    <td><div class="cell">可选</div></td><td><div class="cell">交易日期</div></td>
  </tr>
</tbody></table></div></div>
<div id="pane-response0"><div class="el-table"><table><tbody>
  <tr class="el-table__row">
    <td><div class="cell">open</div></td><td><div class="cell">float</div></td>
    <td><div class="cell">开盘价</div></td>
  </tr>
</tbody></table></div></div>
<pre class="python-code">importrequests
print(requests.get("https://tsanghi.com/api").json())</pre>
</body></html>"#;

/// Creates a test configuration pointing at the mock render service
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler = config.crawler.without_delays();
    config.renderer.endpoint = format!("{}/render", server.uri());
    config.renderer.page_timeout_ms = 2_000;
    config.renderer.wait_timeout_ms = 500;
    config.renderer.grace_ms = 1_000;
    config.output.directory = dir.path().to_string_lossy().into_owned();
    config
}

fn page_url(key: &str) -> String {
    format!("https://tsanghi.com/fin/doc?index={}", key)
}

fn orchestrator(config: &Config) -> CrawlOrchestrator {
    let renderer =
        HttpRenderService::new(config.renderer.clone()).expect("Failed to build render service");
    let store = ArtifactStore::open(&config.output.directory).expect("Failed to open store");
    CrawlOrchestrator::new(config, Arc::new(renderer), store)
}

async fn mount_render(server: &MockServer, key: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/render"))
        .and(body_partial_json(json!({ "url": page_url(key) })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn read_json(path: &std::path::Path) -> Value {
    let content = std::fs::read_to_string(path).expect("Failed to read artifact");
    serde_json::from_str(&content).expect("Artifact is not JSON")
}

#[tokio::test]
async fn test_full_crawl_of_documentation_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_render(&server, "2-1-1", json!({ "success": true, "html": DOC_PAGE })).await;

    let orchestrator = orchestrator(&config);
    let summary = orchestrator
        .run(&[PageIndex::new(2, 1, 1)])
        .await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.results_indices, Some(1));

    let artifact = read_json(&dir.path().join("doc_2-1-1.json"));
    let record = &artifact[0];
    assert_eq!(record["title"], "股票 > 行情数据 > 日线行情");

    let request_params = record["request_params"].as_array().unwrap();
    assert_eq!(request_params.len(), 2);
    assert_eq!(request_params[0]["name"], "token");
    assert_eq!(request_params[0]["type"], "string");
    assert_eq!(request_params[0]["required"], true);
    assert_eq!(request_params[1]["required"], false);

    assert_eq!(record["response_params"][0]["name"], "open");
    assert_eq!(record["response_params"][0]["description"], "开盘价");
    assert!(record["python_example"]
        .as_str()
        .unwrap()
        .starts_with("import requests"));

    let results = read_json(&dir.path().join("all_results.json"));
    assert_eq!(results["2-1-1"][0]["title"], "股票 > 行情数据 > 日线行情");
}

#[tokio::test]
async fn test_render_request_carries_browser_setup() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_render(&server, "2-1-1", json!({ "success": true, "html": DOC_PAGE })).await;

    orchestrator(&config)
        .run(&[PageIndex::new(2, 1, 1)])
        .await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["url"], page_url("2-1-1"));
    assert_eq!(body["locale"], "zh-CN");
    assert_eq!(body["page_timeout"], 2_000);
    assert_eq!(body["headers"]["Referer"], "https://tsanghi.com/");
    assert!(body["js_code"].as_str().unwrap().contains("#tab-request0"));
    assert!(body["wait_for"]
        .as_str()
        .unwrap()
        .contains("data-page-empty"));
    assert_eq!(body["viewport"]["width"], 1280);
}

#[tokio::test]
async fn test_missing_page_writes_empty_marker() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("POST"))
        .and(path("/render"))
        .and(body_partial_json(json!({ "url": page_url("2-1-2") })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error_message": "Wait condition failed: Timeout 30000ms exceeded"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = orchestrator(&config)
        .run(&[PageIndex::new(2, 1, 2)])
        .await;

    assert_eq!(summary.empty, 1);
    assert!(!dir.path().join("doc_2-1-2.json").exists());

    let marker = read_json(&dir.path().join("empty_2-1-2.json"));
    assert_eq!(marker["index"], "2-1-2");
    assert_eq!(marker["status"], "empty");
    assert!(summary.results_indices.is_none());
}

#[tokio::test]
async fn test_page_tagged_empty_by_script() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_render(
        &server,
        "5-5-5",
        json!({
            "success": true,
            "html": r#"<html><body data-page-empty="true"><div id="app"></div></body></html>"#
        }),
    )
    .await;

    let summary = orchestrator(&config)
        .run(&[PageIndex::new(5, 5, 5)])
        .await;

    assert_eq!(summary.empty, 1);
    assert!(dir.path().join("empty_5-5-5.json").exists());
}

#[tokio::test]
async fn test_service_errors_are_retried_then_abandoned() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("POST"))
        .and(path("/render"))
        .and(body_partial_json(json!({ "url": page_url("2-1-3") })))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let summary = orchestrator(&config)
        .run(&[PageIndex::new(2, 1, 3)])
        .await;

    assert_eq!(summary.abandoned, 1);
    assert!(!dir.path().join("doc_2-1-3.json").exists());
    assert!(!dir.path().join("empty_2-1-3.json").exists());
}

#[tokio::test]
async fn test_extracted_content_is_used_when_present() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let extracted = json!([{
        "level1_2_title": "指数 > 指数行情",
        "raw_title": "指数日线",
    }]);
    mount_render(
        &server,
        "3-2-1",
        json!({ "success": true, "extracted_content": extracted.to_string() }),
    )
    .await;

    let summary = orchestrator(&config)
        .run(&[PageIndex::new(3, 2, 1)])
        .await;

    assert_eq!(summary.succeeded, 1);
    let artifact = read_json(&dir.path().join("doc_3-2-1.json"));
    assert_eq!(artifact[0]["title"], "指数 > 指数行情 > 指数日线");
}

#[tokio::test]
async fn test_resume_skips_completed_indices() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.index = IndexConfig {
        first: (2, 2),
        second: (1, 1),
        third: (1, 2),
    };

    mount_render(&server, "2-1-1", json!({ "success": true, "html": DOC_PAGE })).await;
    mount_render(
        &server,
        "2-1-2",
        json!({ "success": false, "error_message": "404 Not Found" }),
    )
    .await;

    // First run crawls both indices
    let all = generate_indices(&config.index);
    assert_eq!(all.len(), 2);
    orchestrator(&config).run(&all).await;

    // Only the documented page lands in the results file, so the empty
    // page is scheduled again on resume
    let results_file = dir.path().join(&config.output.results_file);
    let completed = load_completed_keys(&results_file);
    assert!(completed.contains("2-1-1"));

    let remaining = remaining_indices(&all, &completed);
    assert_eq!(remaining, vec![PageIndex::new(2, 1, 2)]);

    let summary = orchestrator(&config)
        .run(&remaining)
        .await;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.empty, 1);

    let results = read_json(&results_file);
    assert_eq!(results.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sweep_after_crawl_keeps_valid_artifacts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_render(&server, "2-1-1", json!({ "success": true, "html": DOC_PAGE })).await;
    mount_render(
        &server,
        "2-1-2",
        json!({ "success": false, "error_message": "page is empty" }),
    )
    .await;

    orchestrator(&config)
        .run(&[PageIndex::new(2, 1, 1), PageIndex::new(2, 1, 2)])
        .await;

    // Leftovers of an older run
    std::fs::write(dir.path().join("doc_4-1-1.json"), "[]").unwrap();
    std::fs::write(
        dir.path().join("doc_4-1-2.json"),
        r#"[{"title": "", "request_params": [], "response_params": [], "python_example": ""}]"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("doc_4-1-3.json"), "not json").unwrap();

    let report = sweep(dir.path(), &config.output.results_file).unwrap();
    assert_eq!(report.removed, 3);
    assert_eq!(report.kept, 2);

    assert!(dir.path().join("doc_2-1-1.json").exists());
    assert!(dir.path().join("empty_2-1-2.json").exists());
    assert!(dir.path().join("all_results.json").exists());

    let again = sweep(dir.path(), &config.output.results_file).unwrap();
    assert_eq!(again.removed, 0);
}
