#![cfg(feature = "openai")]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use tweetify::config::{Backend, TweetifyConfig};
use tweetify::error::TweetifyError;
use tweetify::form::FormEvent;
use tweetify::pipeline::Session;
use tweetify::provider::openai::{OpenAiCompletionProvider, OpenAiImageProvider};
use tweetify::provider::{CompletionProvider, CompletionRequest, ImageProvider, ImageRequest};
use tweetify::types::{Character, FinishReason, ImageStyle};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_provider(server: &MockServer) -> OpenAiCompletionProvider {
    OpenAiCompletionProvider::new("test-key".to_string(), "gpt-4o-mini").with_base_url(server.uri())
}

fn image_provider(server: &MockServer) -> OpenAiImageProvider {
    OpenAiImageProvider::new("test-key".to_string(), "dall-e-3").with_base_url(server.uri())
}

fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        let event = json!({
            "choices": [{ "delta": { "content": chunk }, "finish_reason": null }]
        });
        body.push_str(&format!("data: {event}\n\n"));
    }
    let done = json!({ "choices": [{ "delta": {}, "finish_reason": "stop" }] });
    body.push_str(&format!("data: {done}\n\n"));
    let usage = json!({
        "choices": [],
        "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
    });
    body.push_str(&format!("data: {usage}\n\n"));
    body.push_str("data: [DONE]\n\n");
    body
}

#[tokio::test]
async fn chat_completion_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "stream": false,
            "messages": [{ "role": "user", "content": "Generate a funny post" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Monday again #mood" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 4, "total_tokens": 9 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = completion_provider(&server)
        .complete(&CompletionRequest::new("Generate a funny post"))
        .await
        .expect("completion should succeed");

    assert_eq!(response.text, "Monday again #mood");
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage.map(|u| u.total_tokens), Some(9));
}

#[tokio::test]
async fn chat_completion_streams_sse() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["Cats ", "are ", "#great"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut stream = completion_provider(&server)
        .stream(&CompletionRequest::new("cats"))
        .await
        .expect("stream should open");

    let mut text = String::new();
    let mut finish = None;
    let mut usage = None;
    while let Some(delta) = stream.next().await {
        let delta = delta.expect("delta");
        text.push_str(&delta.text);
        finish = finish.or(delta.finish_reason);
        usage = usage.or(delta.usage);
    }

    assert_eq!(text, "Cats are #great");
    assert_eq!(finish, Some(FinishReason::Stop));
    assert_eq!(usage.map(|u| u.total_tokens), Some(16));
}

#[tokio::test]
async fn chat_completion_maps_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = completion_provider(&server)
        .complete(&CompletionRequest::new("hi"))
        .await
        .expect_err("401 should fail");

    assert!(matches!(err, TweetifyError::Authentication(msg) if msg == "invalid api key"));
}

#[tokio::test]
async fn chat_completion_without_choices_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = completion_provider(&server)
        .complete(&CompletionRequest::new("hi"))
        .await
        .expect_err("empty choices should fail");

    assert!(matches!(err, TweetifyError::Api { status: 200, .. }));
}

#[tokio::test]
async fn chat_completion_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = completion_provider(&server)
        .with_timeout(Duration::from_millis(50))
        .complete(&CompletionRequest::new("hi"))
        .await
        .expect_err("slow response should time out");

    assert!(matches!(err, TweetifyError::Timeout(50)));
}

#[tokio::test]
async fn image_generation_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "dall-e-3",
            "prompt": "A cat in watercolor style",
            "n": 1,
            "size": "512x512"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1,
            "data": [{ "url": "https://img.test/cat.png", "revised_prompt": "A watercolor cat" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = image_provider(&server)
        .with_size("512x512")
        .generate_image(&ImageRequest {
            prompt: "A cat in watercolor style".to_string(),
        })
        .await
        .expect("image should succeed");

    assert_eq!(response.image_url, "https://img.test/cat.png");
    assert_eq!(response.revised_prompt.as_deref(), Some("A watercolor cat"));
}

#[tokio::test]
async fn image_generation_without_url_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "b64_json": "AAAA" }]
        })))
        .mount(&server)
        .await;

    let err = image_provider(&server)
        .generate_image(&ImageRequest {
            prompt: "x".to_string(),
        })
        .await
        .expect_err("missing url should fail");

    assert!(matches!(err, TweetifyError::Api { status: 200, .. }));
}

#[tokio::test]
async fn image_generation_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "error": { "retry_after": 2 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = image_provider(&server)
        .generate_image(&ImageRequest {
            prompt: "x".to_string(),
        })
        .await
        .expect_err("429 should fail");

    assert!(matches!(
        err,
        TweetifyError::RateLimited {
            retry_after_ms: Some(2000)
        }
    ));
}

#[tokio::test]
async fn session_from_config_runs_full_cycle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": "Generate a funny post in the style of DarthVader about cats."
            }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["Cats are ", "#hilarious", " today"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({ "prompt": "Cats are  today in cartoon style" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url": "https://img.test/vader-cat.png" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = TweetifyConfig::builder()
        .backend(Backend::OpenAi)
        .api_key("test-key")
        .openai_base_url(server.uri())
        .build();

    let mut session = Session::from_config(&config).expect("session");
    session.apply(FormEvent::TopicChanged("cats".into()));
    session.apply(FormEvent::CharacterChanged(Character::DarthVader));
    session.apply(FormEvent::ImageToggled(true));
    session.apply(FormEvent::ImageStyleChanged(ImageStyle::Cartoon));

    let outcome = session.submit().await.expect("submit");
    assert!(outcome.is_success(), "{:?}", outcome.failure);
    assert_eq!(session.content().tweet_text, "Cats are  today");
    assert_eq!(session.content().image_url, "https://img.test/vader-cat.png");
}

#[tokio::test]
async fn providers_are_shareable_trait_objects() {
    let server = MockServer::start().await;
    let completion: Arc<dyn CompletionProvider> = Arc::new(completion_provider(&server));
    let image: Arc<dyn ImageProvider> = Arc::new(image_provider(&server));
    assert_eq!(completion.provider_name(), "openai");
    assert_eq!(image.provider_name(), "openai");
}
