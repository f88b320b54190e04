// Integration tests for the generation request/response cycle.

mod test_server;

use axum::http::header;
use nai::{Action, Error, ErrorKind, GenerationParams, Host, Resolution, SessionOptions, UcPreset};
use test_server::TestServer;

#[tokio::test]
async fn assets_follow_archive_order_and_naming() {
    let server = TestServer::start().await;
    let client = server.client();
    let params = GenerationParams::builder("two cats")
        .resolution(Resolution::SmallSquare)
        .n_samples(3)
        .seed(500)
        .build()
        .unwrap();

    let assets = client.generate(&params, Host::Api, true, false).await.unwrap();

    assert_eq!(assets.len(), 3);
    for (index, asset) in assets.iter().enumerate() {
        let name = asset.filename();
        // YYYYmmdd_HHMMSS_api_pN.png
        let (stamp, rest) = name.split_at(15);
        assert!(stamp[..8].chars().all(|c| c.is_ascii_digit()), "{name}");
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp[9..].chars().all(|c| c.is_ascii_digit()), "{name}");
        assert_eq!(rest, format!("_api_p{index}.png"));

        assert_eq!(asset.data(), format!("png-bytes-{index}").as_bytes());
        assert_eq!(asset.params(), &params);
        assert_eq!(asset.index() as usize, index);
        assert_eq!(asset.source_name(), format!("image_{index}.png"));
        assert_eq!(asset.seed(), 500 + index as u64);
    }
}

#[tokio::test]
async fn request_carries_headers_and_nested_parameters() {
    let server = TestServer::start().await;
    let client = server.client();
    let params = GenerationParams::builder("a lighthouse")
        .negative_prompt("fog")
        .uc_preset(UcPreset::Disabled)
        .build()
        .unwrap();

    client.generate(&params, Host::Api, false, true).await.unwrap();

    let service = server.service();
    assert_eq!(service.last_header(header::AUTHORIZATION).as_deref(), Some("Bearer token-1"));
    assert_eq!(service.last_header(header::ACCEPT).as_deref(), Some("application/x-zip-compressed"));
    assert_eq!(service.last_header(header::ORIGIN).as_deref(), Some("https://novelai.net"));
    assert_eq!(service.last_header(header::REFERER).as_deref(), Some("https://novelai.net"));
    assert!(service.last_header(header::USER_AGENT).unwrap().starts_with("Mozilla/5.0"));

    let body = service.last_request().unwrap();
    assert_eq!(body["input"], "a lighthouse, best quality, amazing quality, very aesthetic, absurdres");
    assert_eq!(body["model"], "nai-diffusion-3");
    assert_eq!(body["action"], "generate");
    assert_eq!(body["parameters"]["negative_prompt"], "fog");
    assert_eq!(body["parameters"]["ucPreset"], 3);
    assert!(body["parameters"].get("input").is_none());
    assert!(body["parameters"].get("mask").is_none());
}

#[tokio::test]
async fn web_host_uses_its_content_type() {
    let server = TestServer::start().await;
    server.service().set_content_type("binary/octet-stream");
    let client = server.client();
    let params = GenerationParams::builder("dunes").build().unwrap();

    let assets = client.generate(&params, Host::Web, false, false).await.unwrap();

    assert_eq!(server.service().last_header(header::ACCEPT).as_deref(), Some("binary/octet-stream"));
    assert!(assets[0].filename().ends_with("_web_p0.png"));
}

#[tokio::test]
async fn content_type_parameters_are_ignored() {
    let server = TestServer::start().await;
    server.service().set_content_type("application/x-zip-compressed; charset=binary");
    let client = server.client();
    let params = GenerationParams::builder("dunes").build().unwrap();

    let assets = client.generate(&params, Host::Api, false, false).await.unwrap();
    assert_eq!(assets.len(), 1);
}

#[tokio::test]
async fn mismatched_content_type_is_rejected() {
    let server = TestServer::start().await;
    server.service().set_content_type("text/html");
    let client = server.client();
    client.init(SessionOptions::default()).await.unwrap();
    let params = GenerationParams::builder("dunes").build().unwrap();

    let err = client.generate(&params, Host::Api, false, false).await.unwrap_err();

    match &err {
        Error::UnexpectedContentType { expected, actual } => {
            assert_eq!(*expected, "application/x-zip-compressed");
            assert_eq!(actual, "text/html");
        }
        other => panic!("expected UnexpectedContentType, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Service);
    assert!(client.is_running());
}

#[tokio::test]
async fn validation_error_carries_server_message() {
    let server = TestServer::start().await;
    let client = server.client();
    server.service().fail_next_generate(400, "steps must be at most 50");
    let params = GenerationParams::builder("dunes").build().unwrap();

    let err = client.generate(&params, Host::Api, false, false).await.unwrap_err();

    assert!(matches!(err, Error::Validation(ref msg) if msg == "steps must be at most 50"), "{err:?}");
}

#[tokio::test]
async fn conflict_and_unknown_statuses_are_classified() {
    let server = TestServer::start().await;
    let client = server.client();
    let params = GenerationParams::builder("dunes").build().unwrap();

    server.service().fail_next_generate(409, "busy");
    let err = client.generate(&params, Host::Api, false, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    server.service().fail_next_generate(503, "maintenance");
    let err = client.generate(&params, Host::Api, false, false).await.unwrap_err();
    assert!(matches!(err, Error::UnknownService { status: 503, .. }), "{err:?}");
}

#[tokio::test]
async fn img2img_request_omits_smea_and_keeps_image() {
    let server = TestServer::start().await;
    let client = server.client();
    let params = GenerationParams::builder("repaint")
        .action(Action::Img2Img)
        .image("aW1hZ2U=")
        .strength(0.5)
        .sm(true)
        .build()
        .unwrap();

    client.generate(&params, Host::Api, false, false).await.unwrap();

    let body = server.service().last_request().unwrap();
    assert_eq!(body["action"], "img2img");
    assert_eq!(body["parameters"]["image"], "aW1hZ2U=");
    assert_eq!(body["parameters"]["strength"], 0.5);
    assert_eq!(body["parameters"]["sm"], false);
    assert_eq!(body["parameters"]["sm_dyn"], false);
}
