/// Integration tests for the chat completion fetcher
///
/// Tests cover:
/// - Request shape sent to the endpoint
/// - Response parsing
/// - HTTP status mapping to fetch errors
use mockito::Matcher;
use quill_autocomplete::{
    ChatCompletionFetcher, FetchError, ProviderConfig, SuggestionFetcher, SuggestionRequest,
};

fn request() -> SuggestionRequest {
    SuggestionRequest {
        title: "Animals".to_string(),
        previous_paragraph: None,
        current_paragraph_prefix: Some("The quick brown".to_string()),
        next_paragraph: None,
    }
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 20, "completion_tokens": 3, "total_tokens": 23 }
    })
    .to_string()
}

#[tokio::test]
async fn test_fetch_returns_completion_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "stream": false
            })),
            Matcher::Regex("The quick brown".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(" fox jumps"))
        .create_async()
        .await;

    let fetcher =
        ChatCompletionFetcher::new(server.url(), "gpt-4o-mini", Some("test-key".to_string()))
            .unwrap();
    let text = fetcher.fetch(request()).await.unwrap();

    assert_eq!(text, " fox jumps");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_key_sends_no_authorization() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(completion_body(" local"))
        .create_async()
        .await;

    let fetcher = ChatCompletionFetcher::new(server.url(), "llama3", None).unwrap();
    assert_eq!(fetcher.fetch(request()).await.unwrap(), " local");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let mut server = mockito::Server::new_async().await;
    let fetcher = ChatCompletionFetcher::new(server.url(), "gpt-4o-mini", None).unwrap();

    let cases = [
        (401, FetchError::AuthError),
        (429, FetchError::RateLimited(60)),
    ];
    for (status, expected) in cases {
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(status)
            .with_body("{}")
            .create_async()
            .await;
        assert_eq!(fetcher.fetch(request()).await, Err(expected));
        mock.remove_async().await;
    }

    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    assert!(matches!(
        fetcher.fetch(request()).await,
        Err(FetchError::ProviderError(_))
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_content_is_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant"}}]}"#)
        .create_async()
        .await;

    let fetcher = ChatCompletionFetcher::new(server.url(), "gpt-4o-mini", None).unwrap();
    assert_eq!(fetcher.fetch(request()).await, Err(FetchError::EmptyResponse));
}

#[tokio::test]
async fn test_from_config_uses_configured_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "mistral",
            "max_tokens": 12
        })))
        .with_status(200)
        .with_body(completion_body(" configured"))
        .create_async()
        .await;

    let config = ProviderConfig {
        base_url: format!("{}/v1", server.url()),
        model: "mistral".to_string(),
        api_key_env: "QUILL_TEST_UNSET_API_KEY".to_string(),
        max_tokens: 12,
        ..ProviderConfig::default()
    };
    let fetcher = ChatCompletionFetcher::from_config(&config).unwrap();
    assert_eq!(fetcher.fetch(request()).await.unwrap(), " configured");
    mock.assert_async().await;
}
