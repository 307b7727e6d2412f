use std::time::{Duration, Instant};

use mockito::{Matcher, mock};
use orden_pdf::{Error, ImageFormat, LogoSource, Session, load_logo, upload_pdf};

const PDF: &[u8] = b"%PDF-1.7\n%test\n";

/// Each test mounts the backend under its own prefix of the shared mock server.
fn session(prefix: &str) -> Session {
    Session::new(format!("{}/{prefix}", mockito::server_url()), "secreto")
}

fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(6, 3, image::Rgb([0, 90, 160]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");
    png
}

#[test]
fn upload_returns_the_stored_url() {
    let m = mock("POST", "/ok/orden-compra/upload-pdf")
        .match_header("authorization", "Bearer secreto")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="OC-0042.pdf""#.into()),
            Matcher::Regex("(?i)content-type: application/pdf".into()),
            Matcher::Regex("%PDF-1.7".into()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"url": "https://cdn.example.com/oc/OC-0042.pdf", "message": "ok"}"#)
        .create();

    let url = upload_pdf(&session("ok"), "OC-0042.pdf", PDF.to_vec()).expect("upload");
    assert_eq!(url, "https://cdn.example.com/oc/OC-0042.pdf");
    m.assert();
}

#[test]
fn upload_error_carries_the_backend_message() {
    let m = mock("POST", "/rejected/orden-compra/upload-pdf")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "La orden ya fue cerrada"}"#)
        .create();

    let err = upload_pdf(&session("rejected"), "OC-0042.pdf", PDF.to_vec());
    match err {
        Err(Error::Upload(msg)) => assert_eq!(msg, "La orden ya fue cerrada"),
        other => panic!("expected an upload error, got {other:?}"),
    }
    m.assert();
}

#[test]
fn upload_error_without_body_reports_the_status() {
    let _m = mock("POST", "/down/orden-compra/upload-pdf")
        .with_status(503)
        .with_body("Service Unavailable")
        .create();

    match upload_pdf(&session("down"), "OC-0042.pdf", PDF.to_vec()) {
        Err(Error::Upload(msg)) => assert!(msg.contains("503"), "{msg}"),
        other => panic!("expected an upload error, got {other:?}"),
    }
}

#[test]
fn upload_response_without_url_is_an_error() {
    let _m = mock("POST", "/nourl/orden-compra/upload-pdf")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "recibido"}"#)
        .create();

    match upload_pdf(&session("nourl"), "OC-0042.pdf", PDF.to_vec()) {
        Err(Error::Upload(msg)) => assert_eq!(msg, "response has no url"),
        other => panic!("expected an upload error, got {other:?}"),
    }
}

#[test]
fn logo_is_fetched_from_a_url() {
    let m = mock("GET", "/static/logo.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(tiny_png())
        .create();

    let source = LogoSource::Url(format!("{}/static/logo.png", mockito::server_url()));
    let logo = load_logo(&source, Duration::from_secs(5)).expect("logo");
    assert_eq!(logo.format, ImageFormat::Png);
    assert_eq!((logo.pixel_width, logo.pixel_height), (6, 3));
    m.assert();
}

#[test]
fn logo_url_with_error_status_is_skipped() {
    let _m = mock("GET", "/static/missing.png")
        .with_status(404)
        .with_body(tiny_png())
        .create();

    let source = LogoSource::Url(format!("{}/static/missing.png", mockito::server_url()));
    assert!(load_logo(&source, Duration::from_secs(5)).is_none());
}

#[test]
fn slow_logo_server_hits_the_timeout() {
    // Accepts connections through the backlog but never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let source = LogoSource::Url(format!("http://{addr}/logo.png"));

    let t0 = Instant::now();
    assert!(load_logo(&source, Duration::from_millis(500)).is_none());
    assert!(t0.elapsed() < Duration::from_secs(10));
    drop(listener);
}
