//! HTTP adapter tests against a local mock server.

use serde_json::json;
use std::time::Duration;
use storyloom_core::{
    ImageRequest, ProviderRequest, RawAsset, SpeechRequest, TextRequest,
};
use storyloom_error::ProviderErrorKind;
use storyloom_interface::ProviderAdapter;
use storyloom_providers::{
    ElevenLabsSpeechAdapter, FalImageAdapter, HttpSettings, OpenAiChatAdapter,
    OpenAiImageAdapter, OpenAiSpeechAdapter,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, name: &str) -> HttpSettings {
    let mut settings = HttpSettings::new(name, server.uri());
    settings.api_key = Some("test-key".to_string());
    settings
}

fn text_request() -> ProviderRequest {
    ProviderRequest::from(TextRequest {
        system: "You write picture books.".to_string(),
        user: "Write about an otter.".to_string(),
        ..Default::default()
    })
}

fn image_request() -> ProviderRequest {
    ProviderRequest::from(ImageRequest {
        prompt: "an otter holding a lantern".to_string(),
        size: None,
    })
}

#[tokio::test]
async fn test_chat_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Title: Otter Night"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::new(settings(&server, "openai")).unwrap();
    let asset = adapter.invoke(&text_request()).await.unwrap();

    assert_eq!(asset, RawAsset::Text("Title: Otter Night".to_string()));
}

#[tokio::test]
async fn test_chat_empty_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let adapter = OpenAiChatAdapter::new(settings(&server, "openai")).unwrap();
    let err = adapter.invoke(&text_request()).await.unwrap_err();

    assert!(matches!(err.kind, ProviderErrorKind::InvalidResponse(_)));
    assert_eq!(err.provider, "openai");
}

#[tokio::test]
async fn test_status_codes_are_normalized() {
    let server = MockServer::start().await;
    let adapter = OpenAiChatAdapter::new(settings(&server, "groq")).unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let err = adapter.invoke(&text_request()).await.unwrap_err();
    assert!(matches!(err.kind, ProviderErrorKind::Unauthorized(ref body) if body.contains("invalid")));

    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let err = adapter.invoke(&text_request()).await.unwrap_err();
    assert_eq!(
        err.kind,
        ProviderErrorKind::RateLimited {
            retry_after_secs: Some(17)
        }
    );

    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let err = adapter.invoke(&text_request()).await.unwrap_err();
    assert!(matches!(
        err.kind,
        ProviderErrorKind::ServerError {
            status: Some(503),
            ..
        }
    ));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({"choices": []})),
        )
        .mount(&server)
        .await;

    let mut settings = settings(&server, "slow");
    settings.timeout = Duration::from_millis(50);
    let adapter = OpenAiChatAdapter::new(settings).unwrap();

    let err = adapter.invoke(&text_request()).await.unwrap_err();
    assert!(matches!(err.kind, ProviderErrorKind::Timeout { .. }));
}

#[tokio::test]
async fn test_wrong_request_variant_is_rejected() {
    let server = MockServer::start().await;
    let adapter = OpenAiChatAdapter::new(settings(&server, "openai")).unwrap();

    let err = adapter.invoke(&image_request()).await.unwrap_err();
    assert!(matches!(err.kind, ProviderErrorKind::InvalidResponse(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_image_url_and_inline_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://oaidalleapiprodscus.blob.core.windows.net/p/img.png?se=2030"}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let adapter = OpenAiImageAdapter::new(settings(&server, "openai-images")).unwrap();
    let asset = adapter.invoke(&image_request()).await.unwrap();
    assert!(matches!(asset, RawAsset::Url(ref url) if url.contains("se=2030")));

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"b64_json": "iVBORw0KGgo="}]
        })))
        .mount(&server)
        .await;

    let asset = adapter.invoke(&image_request()).await.unwrap();
    assert_eq!(
        asset,
        RawAsset::Url("data:image/png;base64,iVBORw0KGgo=".to_string())
    );
}

#[tokio::test]
async fn test_fal_posts_to_model_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux/schnell"))
        .and(header("authorization", "Key test-key"))
        .and(body_partial_json(json!({"num_images": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [{"url": "https://v3.fal.media/files/otter.png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = FalImageAdapter::new(settings(&server, "fal")).unwrap();
    let asset = adapter.invoke(&image_request()).await.unwrap();

    assert_eq!(
        asset,
        RawAsset::Url("https://v3.fal.media/files/otter.png".to_string())
    );
}

#[tokio::test]
async fn test_elevenlabs_returns_audio_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text-to-speech/voice-7"))
        .and(header("xi-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(vec![0x49, 0x44, 0x33, 0x04]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapter = ElevenLabsSpeechAdapter::new(settings(&server, "elevenlabs")).unwrap();
    let request = ProviderRequest::from(SpeechRequest {
        text: "Once upon a time.".to_string(),
        voice_id: Some("voice-7".to_string()),
    });
    let asset = adapter.invoke(&request).await.unwrap();

    assert_eq!(
        asset,
        RawAsset::Bytes {
            data: vec![0x49, 0x44, 0x33, 0x04],
            mime_type: "audio/mpeg".to_string(),
        }
    );
}

#[tokio::test]
async fn test_elevenlabs_empty_body_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let adapter = ElevenLabsSpeechAdapter::new(settings(&server, "elevenlabs")).unwrap();
    let request = ProviderRequest::from(SpeechRequest {
        text: "Hello.".to_string(),
        voice_id: None,
    });
    let err = adapter.invoke(&request).await.unwrap_err();

    assert!(matches!(err.kind, ProviderErrorKind::InvalidResponse(_)));
}

#[tokio::test]
async fn test_openai_speech_uses_configured_voice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_partial_json(json!({"voice": "nova", "input": "The end."})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(&server, "openai-speech");
    settings.voice = Some("nova".to_string());
    let adapter = OpenAiSpeechAdapter::new(settings).unwrap();
    let request = ProviderRequest::from(SpeechRequest {
        text: "The end.".to_string(),
        voice_id: None,
    });

    let asset = adapter.invoke(&request).await.unwrap();
    assert!(matches!(asset, RawAsset::Bytes { ref mime_type, .. } if mime_type == "audio/mpeg"));
}
