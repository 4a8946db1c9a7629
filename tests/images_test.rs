//! Integration tests for upload ingestion, original delivery and derivatives.

mod common;

use common::{gif_fixture, jpeg_fixture, png_fixture, TestHarness};

fn stored_files(h: &TestHarness) -> usize {
    std::fs::read_dir(h.ctx.images.store().root())
        .map(|entries| entries.count())
        .unwrap_or(0)
}

async fn get(h: &TestHarness, path: &str) -> reqwest::Response {
    h.client.get(h.url(path)).send().await.unwrap()
}

#[tokio::test]
async fn upload_returns_links_and_records_attachment() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Poster");

    let resp = h
        .upload(&token, &item.to_string(), jpeg_fixture(64, 48), "poster.jpeg", "image/jpeg")
        .await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();

    let name = body["fileName"].as_str().unwrap();
    assert!(name.ends_with(".jpeg"), "{name}");
    assert_ne!(name, "poster.jpeg");
    assert_eq!(body["originalPath"], format!("item/image/{name}"));
    assert_eq!(
        body["derivativePathTemplate"],
        format!("item/image/{{dimensions}}/{{quality}}/{name}")
    );
    assert_eq!(body["defaultDerivativePath"], format!("item/image/500X500/50/{name}"));
    assert_eq!(body["media_type"], "image/jpeg");

    let resp = h
        .client
        .get(h.url(&format!("/item/get/{item}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let detail: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(detail["attachments"][0]["fileName"], name);
}

#[tokio::test]
async fn original_is_served_verbatim() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Logo");

    for (bytes, file, mime) in [
        (jpeg_fixture(32, 32), "a.jpg", "image/jpeg"),
        (png_fixture(32, 32), "b.png", "image/png"),
        (gif_fixture(32, 32), "c.gif", "image/gif"),
    ] {
        let resp = h.upload(&token, &item.to_string(), bytes.clone(), file, mime).await;
        assert_eq!(resp.status(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        let name = body["fileName"].as_str().unwrap();

        let resp = get(&h, &format!("/item/image/{name}")).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], mime);
        assert_eq!(resp.bytes().await.unwrap().as_ref(), bytes.as_slice());
    }
}

#[tokio::test]
async fn derivative_has_exact_size_and_fixed_format() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let name = h.upload_fixture(&token, h.create_item("Photo")).await;

    for (dims, w, h_px) in [("500x500", 500, 500), ("120", 120, 120), ("200X100", 200, 100)] {
        let resp = get(&h, &format!("/item/image/{dims}/50/{name}")).await;
        assert_eq!(resp.status(), 200, "{dims}");
        assert_eq!(resp.headers()["content-type"], "image/jpeg");
        let bytes = resp.bytes().await.unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (w, h_px), "{dims}");
    }
}

#[tokio::test]
async fn png_and_gif_originals_render_as_jpeg() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Mixed");

    for (bytes, file, mime) in [
        (png_fixture(40, 20), "p.png", "image/png"),
        (gif_fixture(40, 20), "g.gif", "image/gif"),
    ] {
        let resp = h.upload(&token, &item.to_string(), bytes, file, mime).await;
        let body: serde_json::Value = resp.json().await.unwrap();
        let name = body["fileName"].as_str().unwrap();

        let resp = get(&h, &format!("/item/image/80x40/90/{name}")).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "image/jpeg");
        let bytes = resp.bytes().await.unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }
}

#[tokio::test]
async fn derivative_is_deterministic() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let name = h.upload_fixture(&token, h.create_item("Repeat")).await;

    let path = format!("/item/image/300x200/75/{name}");
    let first = get(&h, &path).await.bytes().await.unwrap();
    let second = get(&h, &path).await.bytes().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn malformed_dimensions_and_quality_are_400() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let name = h.upload_fixture(&token, h.create_item("Strict")).await;

    for dims in ["0", "5xY", "x10", "10x", "10x10x10", "-5", "99999999999"] {
        let resp = get(&h, &format!("/item/image/{dims}/50/{name}")).await;
        assert_eq!(resp.status(), 400, "{dims}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "invalid_dimensions", "{dims}");
    }

    for quality in ["0", "101", "abc", "50.5"] {
        let resp = get(&h, &format!("/item/image/100/{quality}/{name}")).await;
        assert_eq!(resp.status(), 400, "{quality}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "invalid_quality", "{quality}");
    }
}

#[tokio::test]
async fn missing_original_is_404() {
    let h = TestHarness::start().await;

    let resp = get(&h, "/item/image/never-uploaded.jpg").await;
    assert_eq!(resp.status(), 404);

    let resp = get(&h, "/item/image/100/50/never-uploaded.jpg").await;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "original_not_found");

    let resp = get(&h, "/item/image/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn undecodable_original_is_500_without_body_bytes() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Broken");

    let resp = h
        .upload(&token, &item.to_string(), b"definitely not a jpeg".to_vec(), "x.jpg", "image/jpeg")
        .await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    let name = body["fileName"].as_str().unwrap();

    let resp = get(&h, &format!("/item/image/100/50/{name}")).await;
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.headers()["content-type"], "application/json");
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "decode_error");
}

#[tokio::test]
async fn oversized_derivative_is_rejected() {
    let h = TestHarness::start_with(|c| c.images.max_output_pixels = 10_000).await;
    let token = h.login().await;
    let name = h.upload_fixture(&token, h.create_item("Huge")).await;

    let resp = get(&h, &format!("/item/image/1000x1000/50/{name}")).await;
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "transform_failed");
}

#[tokio::test]
async fn upload_over_limit_is_413_and_writes_nothing() {
    let h = TestHarness::start_with(|c| c.images.max_upload_bytes = 1024).await;
    let token = h.login().await;
    let item = h.create_item("Big");

    let resp = h
        .upload(&token, &item.to_string(), vec![0xFF; 4096], "big.jpg", "image/jpeg")
        .await;
    assert_eq!(resp.status(), 413);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "payload_too_large");
    assert_eq!(stored_files(&h), 0);
}

#[tokio::test]
async fn storage_failure_is_500_and_records_no_attachment() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Unwritable");

    // A regular file where the storage directory should be.
    let root = h.ctx.images.store().root().to_path_buf();
    std::fs::remove_dir(&root).unwrap();
    std::fs::write(&root, b"").unwrap();

    let resp = h
        .upload(&token, &item.to_string(), jpeg_fixture(32, 32), "photo.jpg", "image/jpeg")
        .await;
    assert_eq!(resp.status(), 500);
    let text = resp.text().await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["code"], "storage_write_error");
    assert!(!text.contains(root.to_str().unwrap()), "{text}");
    assert!(!body["error"].as_str().unwrap().contains('/'), "{text}");

    let resp = h
        .client
        .get(h.url(&format!("/item/get/{item}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let detail: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(detail["attachments"], serde_json::json!([]));
}

#[tokio::test]
async fn unsupported_media_type_is_400() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Doc");

    let resp = h
        .upload(&token, &item.to_string(), b"hello".to_vec(), "notes.txt", "text/plain")
        .await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "unsupported_media_type");
    assert_eq!(stored_files(&h), 0);
}

#[tokio::test]
async fn upload_without_image_field_is_400() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let item = h.create_item("Empty");

    let form = reqwest::multipart::Form::new().text("caption", "no file here");
    let resp = h
        .client
        .post(h.url(&format!("/item/image/upload/{item}")))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn upload_to_unknown_item_is_404() {
    let h = TestHarness::start().await;
    let token = h.login().await;

    let resp = h
        .upload(
            &token,
            &vt_core::ItemId::new().to_string(),
            jpeg_fixture(8, 8),
            "a.jpg",
            "image/jpeg",
        )
        .await;
    assert_eq!(resp.status(), 404);
    assert_eq!(stored_files(&h), 0);
}

#[tokio::test]
async fn upload_requires_auth() {
    let h = TestHarness::start().await;
    let item = h.create_item("Locked");

    let part = reqwest::multipart::Part::bytes(jpeg_fixture(8, 8))
        .file_name("a.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let resp = h
        .client
        .post(h.url(&format!("/item/image/upload/{item}")))
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(stored_files(&h), 0);
}
