mod common;

use common::{json_body, multipart_body, upload_request, FormPart, ScriptedGateway};
use secrecy::Secret;
use std::sync::Arc;
use tower::ServiceExt;
use voicepaint::configuration::MAX_UPLOAD_BYTES;
use voicepaint::server::services::stand_in::STAND_IN_TRANSCRIPT;
use voicepaint::server::services::{DoubaoGateway, GatewayError, GeneratedImage, StandInGateway};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn working_gateway() -> Arc<ScriptedGateway> {
    ScriptedGateway::new(
        Ok("a red fox".to_string()),
        Ok(GeneratedImage::inline("iVBORw0KGgo=", "image/png")),
    )
}

#[tokio::test]
async fn stand_in_round_trip() {
    let app = common::router(Arc::new(StandInGateway::instant()), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[FormPart::audio(b"RIFF....WAVEfmt ", "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], STAND_IN_TRANSCRIPT);
    assert_eq!(body["imageUrl"], "");
    let image_data = body["imageData"].as_str().unwrap();
    assert!(image_data.starts_with("data:image/"));
    assert!(image_data.len() > "data:image/svg+xml;base64,".len());
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn transcript_and_inline_image_are_returned() {
    let gateway = working_gateway();
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[
        FormPart::text("note", "ignored"),
        FormPart::audio(b"opus-bytes", "audio/webm;codecs=opus"),
    ]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["text"], "a red fox");
    assert_eq!(body["imageData"], "data:image/png;base64,iVBORw0KGgo=");
    assert_eq!(gateway.transcribe_calls(), 1);
    assert_eq!(gateway.image_calls(), 1);
    assert_eq!(gateway.last_format().as_deref(), Some("webm"));
}

#[tokio::test]
async fn missing_file_is_rejected_before_any_ai_call() {
    let gateway = working_gateway();
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[FormPart::text("note", "no audio here")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 400);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "no audio file received");
    assert_eq!(gateway.transcribe_calls(), 0);
    assert_eq!(gateway.image_calls(), 0);
}

#[tokio::test]
async fn missing_file_never_reaches_the_live_service() {
    let ai = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ai)
        .await;

    let gateway = DoubaoGateway::with_base_url(Secret::new("sk-test".to_string()), ai.uri()).unwrap();
    let app = common::router(Arc::new(gateway), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn non_multipart_body_is_a_missing_file() {
    let gateway = working_gateway();
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/audio-to-image")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"audio":"nope"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "no audio file received");
    assert_eq!(gateway.transcribe_calls(), 0);
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let gateway = working_gateway();
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[FormPart::audio(b"", "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "audio file is empty");
    assert_eq!(gateway.transcribe_calls(), 0);
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let gateway = working_gateway();
    let app = common::router(gateway.clone(), 1024);
    let audio = vec![7u8; 2048];
    let body = multipart_body(&[FormPart::audio(&audio, "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 413);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "audio file exceeds the 1024 byte limit");
    assert_eq!(gateway.transcribe_calls(), 0);
}

#[tokio::test]
async fn body_beyond_the_request_limit_is_rejected() {
    let gateway = working_gateway();
    let app = common::router(gateway.clone(), 16);
    let audio = vec![1u8; 200 * 1024];
    let body = multipart_body(&[FormPart::audio(&audio, "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 413);
    assert_eq!(json_body(response).await["success"], false);
    assert_eq!(gateway.transcribe_calls(), 0);
}

#[tokio::test]
async fn transcription_failure_skips_image_generation() {
    let gateway = ScriptedGateway::new(
        Err(GatewayError::Upstream("invalid audio".to_string())),
        Ok(GeneratedImage::inline("AAAA", "image/png")),
    );
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[FormPart::audio(b"noise", "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 500);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("invalid audio"));
    assert_eq!(gateway.image_calls(), 0);
}

#[tokio::test]
async fn image_failure_reports_the_stage() {
    let gateway = ScriptedGateway::new(
        Ok("a boat".to_string()),
        Err(GatewayError::Timeout),
    );
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[FormPart::audio(b"noise", "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 500);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("image generation failed"), "{error}");
    assert!(error.contains("did not answer in time"));
}

#[tokio::test]
async fn response_without_image_is_a_failure() {
    let gateway = ScriptedGateway::new(
        Ok("nothing".to_string()),
        Ok(GeneratedImage::default()),
    );
    let app = common::router(gateway.clone(), MAX_UPLOAD_BYTES);
    let body = multipart_body(&[FormPart::audio(b"noise", "audio/wav")]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(json_body(response).await["success"], false);
}
