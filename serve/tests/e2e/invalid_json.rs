use super::common;

#[tokio::test]
async fn malformed_body_returns_json_error() {
    let state = common::test_state().await;
    let (url, _server) = common::spawn_server(state).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{url}/v1/turns"))
        .header("authorization", format!("Bearer {}", common::TEST_TOKEN))
        .header("content-type", "application/json")
        .body("not valid json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "internal");
}

#[tokio::test]
async fn missing_bearer_token_returns_auth_required() {
    let state = common::test_state().await;
    let (url, _server) = common::spawn_server(state).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{url}/v1/turns"))
        .header("content-type", "application/json")
        .body(r#"{"message":"hi","thread_id":null}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "auth-required");
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let state = common::test_state().await;
    let (url, _server) = common::spawn_server(state).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{url}/v1/turns"))
        .header("authorization", format!("Bearer {}", common::TEST_TOKEN))
        .header("content-type", "application/json")
        .body(r#"{"message":"   ","thread_id":null}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
