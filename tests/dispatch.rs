mod common;
use common::{
    anonymous_config, dispatcher, privileged_config, script_login, search_hits, MockTransport,
};

use geonetwork_mcp::errors::ToolError;
use geonetwork_mcp::services::transport::HttpResponse;
use geonetwork_mcp::tools::ToolCallRequest;
use reqwest::Method;
use serde_json::{json, Value};

const OLDER_RECORD: &str = r#"<?xml version="1.0"?>
<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:fileIdentifier><gco:CharacterString>abc</gco:CharacterString></gmd:fileIdentifier>
</gmd:MD_Metadata>"#;

fn payload(text: &str) -> Value {
    serde_json::from_str(text).expect("success payload must be JSON")
}

const PRIVILEGED_CALLS: &[(&str, &str)] = &[
    ("update_record_field", r#"{"uuid":"abc","xpath":"gmd:title","value":"x"}"#),
    ("update_record_title", r#"{"uuid":"abc","title":"x"}"#),
    ("duplicate_record", r#"{"sourceUuid":"abc"}"#),
    ("add_record_tags", r#"{"uuid":"abc","tagIds":[1]}"#),
    ("remove_record_tags", r#"{"uuid":"abc","tagIds":[1]}"#),
];

#[tokio::test]
async fn privileged_tools_without_credentials_make_no_requests() {
    for (tool, args) in PRIVILEGED_CALLS {
        let mock = MockTransport::new();
        let dispatcher = dispatcher(anonymous_config(), mock.clone());

        let result = dispatcher
            .dispatch(ToolCallRequest::new(*tool, serde_json::from_str(args).unwrap()))
            .await;

        assert!(result.is_error, "{} must fail without credentials", tool);
        assert!(result.text().contains("credentials are not configured"));
        assert_eq!(mock.calls(), 0, "{} touched the network", tool);
    }
}

#[tokio::test]
async fn search_is_clamped_and_carries_notice() {
    let mock = MockTransport::new();
    mock.on(Method::POST, "/search/records/_search", search_hits(100, 237));
    let dispatcher = dispatcher(anonymous_config().with_max_search_size(100), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("search_records", json!({ "size": 500 })))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let body = payload(result.text());
    assert_eq!(body["items"].as_array().unwrap().len(), 100);
    assert_eq!(body["total"], 237);
    assert!(body["notice"]
        .as_str()
        .unwrap()
        .contains("limited to 100 of 237"));

    let sent = mock.requests_to(Method::POST, "/search/records/_search");
    assert_eq!(sent[0].json_body().unwrap()["size"], 100);
    assert!(sent[0].cookie.is_none(), "read tools never log in");
}

#[tokio::test]
async fn search_within_limit_has_no_notice() {
    let mock = MockTransport::new();
    mock.on(Method::POST, "/search/records/_search", search_hits(3, 3));
    let dispatcher = dispatcher(anonymous_config(), mock);

    let result = dispatcher
        .dispatch(ToolCallRequest::new("search_records", json!({ "query": "rivers" })))
        .await;
    let body = payload(result.text());
    assert_eq!(body["returned"], 3);
    assert!(body.get("notice").is_none());
}

#[tokio::test]
async fn title_update_uses_older_dialect_when_marker_present() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(
        Method::GET,
        "/records/abc/formatters/xml",
        HttpResponse::new(200, OLDER_RECORD),
    );
    mock.on(Method::PUT, "/records/batchediting", HttpResponse::new(201, "{\"numberOfRecordsProcessed\":1}"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_title",
            json!({ "uuid": "abc", "title": "Rivers of Europe" }),
        ))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let edits = mock.requests_to(Method::PUT, "/records/batchediting");
    assert_eq!(edits.len(), 1);
    let body = edits[0].json_body().unwrap();
    assert_eq!(
        body[0]["xpath"],
        "gmd:identificationInfo/*/gmd:citation/*/gmd:title/gco:CharacterString"
    );
    assert_eq!(body[0]["value"], "<gn_replace>Rivers of Europe</gn_replace>");
    assert_eq!(edits[0].query_value("uuids"), Some("abc"));
    assert_eq!(
        edits[0].cookie.as_deref(),
        Some("JSESSIONID=node0abc; SESSION=app123")
    );
    assert_eq!(payload(result.text())["schema"], "iso19139");
}

#[tokio::test]
async fn title_update_defaults_to_newer_dialect() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(
        Method::GET,
        "/records/abc/formatters/xml",
        HttpResponse::new(200, "<record>plain</record>"),
    );
    mock.on(Method::PUT, "/records/batchediting", HttpResponse::new(201, "{}"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_title",
            json!({ "uuid": "abc", "title": "New" }),
        ))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let edits = mock.requests_to(Method::PUT, "/records/batchediting");
    assert_eq!(
        edits[0].json_body().unwrap()[0]["xpath"],
        "mdb:identificationInfo/*/mri:citation/*/cit:title/gco:CharacterString"
    );
    assert_eq!(payload(result.text())["schemaDetected"], false);
}

#[tokio::test]
async fn title_update_falls_back_when_export_is_refused() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(
        Method::GET,
        "/records/abc/formatters/xml",
        HttpResponse::new(500, OLDER_RECORD),
    );
    mock.on(Method::PUT, "/records/batchediting", HttpResponse::new(201, "{}"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_title",
            json!({ "uuid": "abc", "title": "New" }),
        ))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let edits = mock.requests_to(Method::PUT, "/records/batchediting");
    assert_eq!(
        edits[0].json_body().unwrap()[0]["xpath"],
        "mdb:identificationInfo/*/mri:citation/*/cit:title/gco:CharacterString"
    );
    let body = payload(result.text());
    assert_eq!(body["schema"], "iso19115-3");
    assert_eq!(body["schemaDetected"], false);
}

#[tokio::test]
async fn title_update_falls_back_when_export_fails() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.fail(
        Method::GET,
        "/records/abc/formatters/xml",
        ToolError::retryable("connection reset"),
    );
    mock.on(Method::PUT, "/records/batchediting", HttpResponse::new(201, "{}"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_title",
            json!({ "uuid": "abc", "title": "New" }),
        ))
        .await;

    assert!(!result.is_error, "{}", result.text());
    assert_eq!(mock.requests_to(Method::PUT, "/records/batchediting").len(), 1);
    assert_eq!(payload(result.text())["schemaDetected"], false);
}

#[tokio::test]
async fn duplicate_with_only_id_issues_one_lookup() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::PUT, "/records/duplicate", HttpResponse::new(200, "{\"id\": 42}"));
    mock.on(Method::POST, "/search/records/_search", search_hits(0, 0));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("duplicate_record", json!({ "sourceUuid": "src-1" })))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let lookups = mock.requests_to(Method::POST, "/search/records/_search");
    assert_eq!(lookups.len(), 1);
    let should = &lookups[0].json_body().unwrap()["query"]["bool"]["should"];
    assert_eq!(should[0]["term"]["id"], "42");

    let body = payload(result.text());
    assert!(body["newUuid"].is_null());
    assert_eq!(body["newId"], 42);

    let duplicate = &mock.requests_to(Method::PUT, "/records/duplicate")[0];
    assert_eq!(duplicate.query_value("metadataUuid"), Some("src-1"));
    assert_eq!(duplicate.query_value("isChildOfSource"), None);
    assert_eq!(duplicate.query_value("hasCategoryOfSource"), None);
}

#[tokio::test]
async fn duplicate_lookup_resolves_uuid_when_indexed() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::PUT, "/records/duplicate", HttpResponse::new(200, "42"));
    mock.on(
        Method::POST,
        "/search/records/_search",
        HttpResponse::new(
            200,
            json!({ "hits": { "total": { "value": 1 }, "hits": [{ "_id": "x", "_source": { "uuid": "copy-uuid" } }] } })
                .to_string(),
        ),
    );
    let dispatcher = dispatcher(privileged_config(), mock);

    let result = dispatcher
        .dispatch(ToolCallRequest::new("duplicate_record", json!({ "sourceUuid": "src-1" })))
        .await;
    let body = payload(result.text());
    assert_eq!(body["newUuid"], "copy-uuid");
    assert!(body.get("note").is_none());
}

#[tokio::test]
async fn duplicate_survives_failed_lookup() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::PUT, "/records/duplicate", HttpResponse::new(200, "{\"id\": 42}"));
    mock.on(
        Method::POST,
        "/search/records/_search",
        HttpResponse::new(500, "index unavailable"),
    );
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("duplicate_record", json!({ "sourceUuid": "src-1" })))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let body = payload(result.text());
    assert!(body["newUuid"].is_null());
    assert_eq!(body["newId"], 42);
    assert!(body["note"].as_str().unwrap().contains("search index"));
    assert_eq!(mock.requests_to(Method::POST, "/search/records/_search").len(), 1);
}

#[tokio::test]
async fn duplicate_returning_bare_uuid_skips_lookup() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(
        Method::PUT,
        "/records/duplicate",
        HttpResponse::new(200, "\"abc-uuid-not-numeric\""),
    );
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("duplicate_record", json!({ "sourceUuid": "src-1" })))
        .await;

    let body = payload(result.text());
    assert_eq!(body["newUuid"], "abc-uuid-not-numeric");
    assert!(body["newId"].is_null());
    assert!(mock.requests_to(Method::POST, "/search/records/_search").is_empty());
}

#[tokio::test]
async fn duplicate_with_uuid_skips_lookup() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(
        Method::PUT,
        "/records/duplicate",
        HttpResponse::new(200, "{\"id\": 42, \"uuid\": \"copy-uuid\"}"),
    );
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("duplicate_record", json!({ "sourceUuid": "src-1" })))
        .await;

    assert_eq!(payload(result.text())["newUuid"], "copy-uuid");
    assert!(mock.requests_to(Method::POST, "/search/records/_search").is_empty());
}

#[tokio::test]
async fn sequential_privileged_calls_log_in_each_time() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::PUT, "/records/abc/tags", HttpResponse::new(204, ""));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    for _ in 0..2 {
        let result = dispatcher
            .dispatch(ToolCallRequest::new("add_record_tags", json!({ "uuid": "abc", "tagIds": [3, 4] })))
            .await;
        assert!(!result.is_error, "{}", result.text());
    }

    assert_eq!(mock.requests_to(Method::POST, "/geonetwork/signin").len(), 2);
    let tagged = mock.requests_to(Method::PUT, "/records/abc/tags");
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged[0].json_body().unwrap(), &json!([3, 4]));
}

#[tokio::test]
async fn failed_login_blocks_the_privileged_request() {
    let mock = MockTransport::new();
    mock.on(Method::POST, "/geonetwork/signin", HttpResponse::new(403, "locked"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_field",
            json!({ "uuid": "abc", "xpath": "gmd:title", "operation": "delete" }),
        ))
        .await;

    assert!(result.is_error);
    assert!(result.text().contains("Status: 403"));
    assert!(mock.requests_to(Method::PUT, "/records/batchediting").is_empty());
}

#[tokio::test]
async fn delete_edit_sends_empty_marker() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::PUT, "/records/batchediting", HttpResponse::new(201, "{}"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_field",
            json!({ "uuid": "abc", "xpath": "gmd:abstract", "value": "ignored", "operation": "delete", "updateDateStamp": false }),
        ))
        .await;

    let edit = &mock.requests_to(Method::PUT, "/records/batchediting")[0];
    assert_eq!(edit.json_body().unwrap()[0]["value"], "<gn_delete></gn_delete>");
    assert_eq!(edit.query_value("updateDateStamp"), Some("false"));
}

#[tokio::test]
async fn upstream_errors_are_reported_in_band() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(
        Method::PUT,
        "/records/batchediting",
        HttpResponse::new(400, "{\"message\":\"XPath is not valid\"}"),
    );
    let dispatcher = dispatcher(privileged_config(), mock);

    let result = dispatcher
        .dispatch(ToolCallRequest::new(
            "update_record_field",
            json!({ "uuid": "abc", "xpath": "gmd:[", "value": "v" }),
        ))
        .await;

    assert!(result.is_error);
    let text = result.text();
    assert!(text.contains("Batch edit failed"));
    assert!(text.contains("Status: 400"));
    assert!(text.contains("XPath is not valid"));
}

#[tokio::test]
async fn unknown_tool_is_an_error_result() {
    let mock = MockTransport::new();
    let dispatcher = dispatcher(anonymous_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("serch_records", json!({})))
        .await;

    assert!(result.is_error);
    assert!(result.text().contains("Unknown tool: serch_records"));
    assert!(result.text().contains("search_records"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_the_network() {
    let mock = MockTransport::new();
    let dispatcher = dispatcher(anonymous_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("get_record", json!({ "uuid": 7 })))
        .await;

    assert!(result.is_error);
    assert!(result.text().contains("Invalid arguments for get_record"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn lookup_hit_from_index() {
    let mock = MockTransport::new();
    mock.on(
        Method::POST,
        "/search/records/_search",
        HttpResponse::new(
            200,
            json!({ "hits": { "hits": [{ "_id": "u-1", "_source": { "uuid": "u-1", "resourceTitleObject": { "default": "Lakes" } } }] } })
                .to_string(),
        ),
    );
    let dispatcher = dispatcher(anonymous_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("lookup_record_by_id", json!({ "id": "17" })))
        .await;

    let body = payload(result.text());
    assert_eq!(body["found"], true);
    assert_eq!(body["uuid"], "u-1");
    assert_eq!(body["title"], "Lakes");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn lookup_miss_without_credentials_is_not_found() {
    let mock = MockTransport::new();
    mock.on(Method::POST, "/search/records/_search", search_hits(0, 0));
    let dispatcher = dispatcher(anonymous_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("lookup_record_by_id", json!({ "id": 99 })))
        .await;

    assert!(!result.is_error);
    let body = payload(result.text());
    assert_eq!(body["found"], false);
    assert_eq!(body["id"], "99");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn lookup_miss_with_credentials_falls_back_to_direct_fetch() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::POST, "/search/records/_search", search_hits(0, 0));
    mock.on(
        Method::GET,
        "/records/99",
        HttpResponse::new(200, "{\"uuid\":\"fresh-uuid\"}"),
    );
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("lookup_record_by_id", json!({ "id": 99 })))
        .await;

    let body = payload(result.text());
    assert_eq!(body["found"], true);
    assert_eq!(body["uuid"], "fresh-uuid");
    assert_eq!(body["source"], "record");
    let direct = mock.requests_to(Method::GET, "/records/99");
    assert_eq!(
        direct[0].cookie.as_deref(),
        Some("JSESSIONID=node0abc; SESSION=app123")
    );
}

#[tokio::test]
async fn export_returns_raw_xml() {
    let mock = MockTransport::new();
    mock.on(
        Method::GET,
        "/records/abc/formatters/xml",
        HttpResponse::new(200, OLDER_RECORD),
    );
    let dispatcher = dispatcher(anonymous_config(), mock);

    let result = dispatcher
        .dispatch(ToolCallRequest::new("export_record", json!({ "uuid": "abc" })))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.text(), OLDER_RECORD);
}

#[tokio::test]
async fn direct_fetch_client_error_is_not_found() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::POST, "/search/records/_search", search_hits(0, 0));
    mock.on(Method::GET, "/records/99", HttpResponse::new(403, "forbidden"));
    let dispatcher = dispatcher(privileged_config(), mock.clone());

    let result = dispatcher
        .dispatch(ToolCallRequest::new("lookup_record_by_id", json!({ "id": 99 })))
        .await;

    assert!(!result.is_error, "{}", result.text());
    let body = payload(result.text());
    assert_eq!(body["found"], false);
    assert_eq!(body["id"], "99");
    assert_eq!(mock.requests_to(Method::GET, "/records/99").len(), 1);
}

#[tokio::test]
async fn direct_fetch_server_error_is_reported() {
    let mock = MockTransport::new();
    script_login(&mock);
    mock.on(Method::POST, "/search/records/_search", search_hits(0, 0));
    mock.on(Method::GET, "/records/99", HttpResponse::new(503, "maintenance"));
    let dispatcher = dispatcher(privileged_config(), mock);

    let result = dispatcher
        .dispatch(ToolCallRequest::new("lookup_record_by_id", json!({ "id": 99 })))
        .await;

    assert!(result.is_error);
    let text = result.text();
    assert!(text.contains("Direct record fetch failed"));
    assert!(text.contains("Status: 503"));
    assert!(text.contains("maintenance"));
}
