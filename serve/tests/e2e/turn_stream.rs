//! Drives a full turn through a real LLM backend. Skipped unless
//! `OPENAI_API_KEY` or `AGENT_E2E_RUN_AGENT` is set.

use futures_util::StreamExt;

use super::common;

/// Reads an SSE body to completion, returning every `data:` frame's raw
/// text (including the terminal `[DONE]` sentinel).
async fn read_frames(response: reqwest::Response) -> Vec<String> {
    let mut stream = response.bytes_stream();
    let mut buf = String::new();
    let mut frames = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        buf.push_str(&String::from_utf8_lossy(&chunk));
        while let Some(pos) = buf.find("\n\n") {
            let event = buf[..pos].to_string();
            buf.drain(..pos + 2);
            for line in event.lines() {
                if let Some(data) = line.strip_prefix("data: ") {
                    frames.push(data.to_string());
                }
            }
        }
        if frames.last().map(String::as_str) == Some("[DONE]") {
            break;
        }
    }
    frames
}

#[tokio::test]
async fn turn_streams_events_then_done() {
    let run_e2e = std::env::var("OPENAI_API_KEY").is_ok() || std::env::var("AGENT_E2E_RUN_AGENT").is_ok();
    if !run_e2e {
        eprintln!("skipping turn_streams_events_then_done (set OPENAI_API_KEY or AGENT_E2E_RUN_AGENT to run)");
        return;
    }

    let state = common::test_state().await;
    let (url, _server) = common::spawn_server(state).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{url}/v1/turns"))
        .header("authorization", format!("Bearer {}", common::TEST_TOKEN))
        .header("content-type", "application/json")
        .body(r#"{"message":"Reply with exactly the word: OK","thread_id":null}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let frames = read_frames(response).await;
    assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));

    let first: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
    assert!(first["thread_id"].is_string(), "first frame should carry the assigned thread_id");

    let has_terminal = frames[..frames.len() - 1].iter().any(|f| {
        let v: serde_json::Value = serde_json::from_str(f).unwrap();
        matches!(v["type"].as_str(), Some("done") | Some("error") | Some("stopped"))
    });
    assert!(has_terminal, "expected exactly one terminal event before [DONE], frames: {frames:?}");
}
