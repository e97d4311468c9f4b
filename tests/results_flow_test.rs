use httpmock::prelude::*;
use tariff_lookup::core::render::render_report;
use tariff_lookup::core::summary::SummaryState;
use tariff_lookup::{
    AppConfig, CountrySelection, ExportForm, HttpTariffApi, ResultsPage, ResultsView, SearchMode,
    Summarizer, SummaryView,
};

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = server.base_url();
    config.summary.base_delay_ms = 1;
    config.summary.max_delay_ms = 4;
    config
}

fn page_for(server: &MockServer) -> ResultsPage<HttpTariffApi, AppConfig> {
    let config = config_for(server);
    let api = HttpTariffApi::from_config(&config).unwrap();
    let summarizer = Summarizer::new(config.summary.clone());
    ResultsPage::new(api, config, summarizer)
}

fn mock_hs_codes(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/api/lookup-hs-codes");
        then.status(200).json_body(serde_json::json!({
            "hs_codes": [{"code": "8471.30"}]
        }));
    })
}

fn mock_lookup_matches(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/api/lookup");
        then.status(200).json_body(serde_json::json!({
            "matches": [{
                "HS_Code": "8471.30",
                "description": "Portable automatic data processing machines",
                "tariff_rate": "0%",
                "duty_rate": "Free",
                "score": 0.92
            }]
        }));
    })
}

fn japan_form() -> ExportForm {
    ExportForm::new(
        "laptop computers",
        CountrySelection::from_labels(["Japan"]).unwrap(),
    )
}

#[tokio::test]
async fn test_country_flow_with_ai_summary() {
    let server = MockServer::start();
    let hs_mock = mock_hs_codes(&server);
    let lookup_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/lookup")
            .body_contains("\"hs_codes\":[\"8471.30\"]")
            .body_contains("\"key\":\"trade-data/normal/JP/Oct15.2025.jsonl\"");
        then.status(200).json_body(serde_json::json!({
            "matches": [{"HS_Code": "8471.30", "tariff_rate": "0%"}]
        }));
    });
    let summary_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/bedrock")
            .body_contains("when exporting to Japan");
        then.status(200)
            .json_body(serde_json::json!({"result": "Laptops enter Japan duty free."}));
    });

    let report = page_for(&server).run(&japan_form()).await;

    hs_mock.assert();
    lookup_mock.assert();
    summary_mock.assert();

    let section = &report.sections[0];
    assert_eq!(section.summary_trace.last(), Some(&SummaryState::Success));
    let text = render_report(&report, 5);
    assert!(text.contains("== Japan (JP) =="));
    assert!(text.contains("Laptops enter Japan duty free."));
}

#[tokio::test]
async fn test_rate_limited_summary_is_called_three_times_then_falls_back() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    mock_lookup_matches(&server);
    let summary_mock = server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(429).body("Too many requests");
    });

    let report = page_for(&server).run(&japan_form()).await;

    summary_mock.assert_hits(3);
    let section = &report.sections[0];
    assert_eq!(section.summary_attempts, 3);
    match &section.view {
        ResultsView::Matches {
            summary: SummaryView::Degraded { fallback, .. },
            ..
        } => {
            assert!(fallback.contains("HS code 8471.30"));
            assert!(fallback.contains("Tariff rate: 0%."));
            assert!(fallback.contains("Duty rate: Free."));
        }
        other => panic!("unexpected view: {:?}", other),
    }
}

#[tokio::test]
async fn test_generic_summary_failure_is_called_once() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    mock_lookup_matches(&server);
    let summary_mock = server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(502)
            .json_body(serde_json::json!({"detail": "Unexpected Bedrock response structure"}));
    });

    let report = page_for(&server).run(&japan_form()).await;

    summary_mock.assert_hits(1);
    let text = render_report(&report, 5);
    assert!(text.contains("⚠️ AI summary unavailable"));
    assert!(text.contains("Summary (from top match):"));
}

#[tokio::test]
async fn test_lookup_404_renders_no_data() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/lookup");
        then.status(404)
            .json_body(serde_json::json!({"detail": "Not Found"}));
    });
    let summary_mock = server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(200).json_body(serde_json::json!({"result": "unused"}));
    });

    let report = page_for(&server).run(&japan_form()).await;

    summary_mock.assert_hits(0);
    assert_eq!(report.sections[0].view, ResultsView::NoData);
    let text = render_report(&report, 5);
    assert!(text.contains("No data found."));
    assert!(!text.contains("⚠️"));
}

#[tokio::test]
async fn test_empty_matches_do_not_call_summary() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/lookup");
        then.status(200).json_body(serde_json::json!({"matches": []}));
    });
    let summary_mock = server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(200).json_body(serde_json::json!({"result": "unused"}));
    });

    let report = page_for(&server).run(&japan_form()).await;

    summary_mock.assert_hits(0);
    let text = render_report(&report, 5);
    assert!(text.contains("No matches found."));
}

#[tokio::test]
async fn test_lookup_server_error_is_shown_inline() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/lookup")
            .body_contains("\"country\":\"Japan\"");
        then.status(500).body("Internal Server Error");
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/lookup")
            .body_contains("\"country\":\"Canada\"");
        then.status(200).json_body(serde_json::json!({
            "matches": [{"hs_code": "8471.30"}]
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(200).json_body(serde_json::json!({"result": "ok"}));
    });

    let form = ExportForm::new(
        "laptop computers",
        CountrySelection::from_labels(["Japan", "Canada"]).unwrap(),
    );
    let report = page_for(&server).run(&form).await;

    // 依目錄順序：Canada 在 Japan 之前
    assert_eq!(report.sections[0].title, "Canada");
    assert_eq!(report.sections[0].records().len(), 1);
    assert!(matches!(
        report.sections[1].view,
        ResultsView::Error { .. }
    ));
}

#[tokio::test]
async fn test_global_search_flow() {
    let server = MockServer::start();
    let search_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/search-all")
            .json_body(serde_json::json!({
                "query": "steel",
                "bucket": "tsinfo",
                "top_k": 5,
                "fast": true
            }));
        then.status(200).json_body(serde_json::json!({
            "matches": [{"hts_number": "7208.10", "general_rate": "Free", "source_country": "Canada"}],
            "sources_searched": 12,
            "sources_by_country": {"Canada": 4, "United States": 8}
        }));
    });
    let summary_mock = server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(200)
            .json_body(serde_json::json!({"result": "Steel is duty free in Canada."}));
    });

    let form = ExportForm::new("steel", CountrySelection::new()).with_mode(SearchMode::Global);
    let report = page_for(&server).run(&form).await;

    search_mock.assert();
    summary_mock.assert();
    let text = render_report(&report, 5);
    assert!(text.contains("Sources searched: 12 (Canada: 4, United States: 8)"));
    assert!(text.contains("Steel is duty free in Canada."));
}

#[tokio::test]
async fn test_dataset_flow_skips_hs_lookup() {
    let server = MockServer::start();
    let hs_mock = mock_hs_codes(&server);
    let lookup_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/lookup")
            .body_contains("\"key\":\"custom/key.jsonl\"");
        then.status(200).json_body(serde_json::json!({"matches": []}));
    });

    let form = ExportForm::new("widgets", CountrySelection::new()).with_mode(SearchMode::Dataset {
        key: "custom/key.jsonl".to_string(),
    });
    let report = page_for(&server).run(&form).await;

    hs_mock.assert_hits(0);
    lookup_mock.assert();
    assert_eq!(report.sections[0].title, "custom/key.jsonl");
}

#[tokio::test]
async fn test_not_found_detail_on_server_error_renders_no_data() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/lookup");
        then.status(500).json_body(serde_json::json!({
            "detail": "Dataset trade-data/normal/JP/Oct15.2025.jsonl not found"
        }));
    });
    let summary_mock = server.mock(|when, then| {
        when.method(POST).path("/api/bedrock");
        then.status(200).json_body(serde_json::json!({"result": "unused"}));
    });

    let report = page_for(&server).run(&japan_form()).await;

    summary_mock.assert_hits(0);
    assert_eq!(report.sections[0].view, ResultsView::NoData);
    assert!(!render_report(&report, 5).contains("⚠️"));
}

#[tokio::test]
async fn test_hs_codes_are_looked_up_once_for_a_bloc() {
    let server = MockServer::start();
    let hs_mock = mock_hs_codes(&server);
    let lookup_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/lookup")
            .body_contains("\"hs_codes\":[\"8471.30\"]");
        then.status(200).json_body(serde_json::json!({"matches": []}));
    });

    let form = ExportForm::new(
        "laptop computers",
        CountrySelection::from_labels(["ASEAN"]).unwrap(),
    );
    let report = page_for(&server).run(&form).await;

    hs_mock.assert_hits(1);
    lookup_mock.assert_hits(10);
    assert_eq!(report.sections.len(), 10);
}

#[tokio::test]
async fn test_throttled_lookup_blames_the_lookup_service() {
    let server = MockServer::start();
    mock_hs_codes(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/lookup");
        then.status(429).body("Too many requests");
    });

    let report = page_for(&server).run(&japan_form()).await;

    assert_eq!(
        report.sections[0].view,
        ResultsView::Error {
            message: "The lookup service is busy right now".to_string()
        }
    );
}
