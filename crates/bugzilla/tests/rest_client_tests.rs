//! REST client tests against a mock Bugzilla server.

use bugzilla::{
    AdvancedQuery, BugComment, BugUpdate, BugzillaClient, FlagChange, Priority, Query,
    RestClient, TrackerError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> RestClient {
    RestClient::new(&server.uri(), "secret").unwrap()
}

#[tokio::test]
async fn search_sends_query_params_and_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/bug"))
        .and(header("X-BUGZILLA-API-KEY", "secret"))
        .and(query_param("bug_status", "NEW"))
        .and(query_param("f1", "status_whiteboard"))
        .and(query_param("o1", "notsubstring"))
        .and(query_param("v1", "LifecycleStale"))
        .and(query_param("include_fields", "id,priority"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bugs": [
                { "id": 1, "priority": "high" },
                { "id": 2, "priority": "P3" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query {
        status: vec!["NEW".to_string()],
        advanced: vec![AdvancedQuery::new(
            "status_whiteboard",
            "notsubstring",
            "LifecycleStale",
        )],
        include_fields: vec!["id".to_string(), "priority".to_string()],
        ..Query::default()
    };

    let bugs = client_for(&server).await.search(&query).await.unwrap();

    assert_eq!(bugs.len(), 2);
    assert_eq!(bugs[0].priority, Priority::High);
    assert_eq!(bugs[1].priority, Priority::Other("P3".to_string()));
}

#[tokio::test]
async fn get_bug_maps_missing_bug_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/bug/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": true,
            "message": "Bug #9 does not exist."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/bug/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bugs": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    assert!(matches!(client.get_bug(9).await, Err(TrackerError::NotFound(9))));
    assert!(matches!(client.get_bug(10).await, Err(TrackerError::NotFound(10))));
}

#[tokio::test]
async fn update_bug_puts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rest/bug/5"))
        .and(body_json(json!({
            "whiteboard": "LifecycleStale",
            "priority": "medium",
            "flags": [{ "name": "needinfo", "status": "?", "requestee": "qa@example.com" }],
            "comment": { "body": "stale" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bugs": [{ "id": 5 }] })))
        .expect(1)
        .mount(&server)
        .await;

    let update = BugUpdate {
        whiteboard: Some("LifecycleStale".to_string()),
        priority: Some(Priority::Medium),
        flags: vec![FlagChange {
            name: "needinfo".to_string(),
            status: "?".to_string(),
            requestee: Some("qa@example.com".to_string()),
        }],
        comment: Some(BugComment {
            body: "stale".to_string(),
        }),
        ..BugUpdate::default()
    };

    client_for(&server)
        .await
        .update_bug(5, &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_bug_surfaces_error_body_on_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rest/bug/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "message": "You are not authorized to edit bug 5."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .update_bug(5, &BugUpdate::default())
        .await
        .unwrap_err();

    match err {
        TrackerError::Api { status, message } => {
            assert_eq!(status, 200);
            assert_eq!(message, "You are not authorized to edit bug 5.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn comments_and_history_are_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/bug/3/comment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bugs": { "3": { "comments": [
                { "count": 0, "text": "description", "time": "2024-01-01T00:00:00Z", "creator": "a@example.com" },
                { "count": 1, "text": "PM Score: 10", "time": "2024-01-02T00:00:00Z", "creator": "bot@example.com" }
            ] } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/bug/3/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bugs": [{ "id": 3, "history": [
                { "when": "2024-01-03T00:00:00Z", "who": "dev@example.com", "changes": [
                    { "field_name": "whiteboard", "removed": "LifecycleStale", "added": "" }
                ] }
            ] }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let comments = client.get_cached_comments(3, "hint").await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1].count, 1);
    assert_eq!(comments[1].text, "PM Score: 10");

    let history = client.get_cached_history(3, "hint").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].changes[0].field_name, "whiteboard");
    assert_eq!(history[0].changes[0].removed, "LifecycleStale");
}
