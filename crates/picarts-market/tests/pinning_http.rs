//! HTTP tests for the pinning publisher and the metadata fetcher, each
//! against a throwaway axum server.

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use picarts_market::{
    AssetPublisher, ContentId, HttpMetadataFetcher, MarketError, MetadataDefaults,
    MetadataFetcher, PinataPublisher, PinningCredentials, Price, Secret, SelectedFile,
};
use serde_json::{Value, json};

/// What the fake pinning service saw.
#[derive(Debug, Default, Clone)]
struct Seen {
    headers: Vec<(String, String)>,
    parts: Vec<(String, Option<String>, Vec<u8>)>,
    json: Option<Value>,
}

type Shared = Arc<Mutex<Seen>>;

fn record_headers(seen: &Shared, headers: &HeaderMap) {
    let mut seen = seen.lock().unwrap();
    for name in ["pinata_api_key", "pinata_secret_api_key", "authorization"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            seen.headers.push((name.to_string(), value.to_string()));
        }
    }
}

async fn pin_file(
    State(seen): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    record_headers(&seen, &headers);
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();
        seen.lock().unwrap().parts.push((name, file_name, data));
    }
    Json(json!({ "IpfsHash": "QmImage", "PinSize": 3, "Timestamp": "2024-01-01T00:00:00Z" }))
}

async fn pin_json(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_headers(&seen, &headers);
    seen.lock().unwrap().json = Some(body);
    Json(json!({ "IpfsHash": "QmMeta" }))
}

async fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "invalid key")
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn pinning_server() -> (String, Shared) {
    let seen = Shared::default();
    let router = Router::new()
        .route("/pinning/pinFileToIPFS", post(pin_file))
        .route("/pinning/pinJSONToIPFS", post(pin_json))
        .with_state(seen.clone());
    (serve(router).await, seen)
}

fn publisher(url: &str, credentials: PinningCredentials) -> PinataPublisher {
    PinataPublisher::new(
        reqwest::Client::new(),
        url,
        Some(credentials),
        MetadataDefaults::default(),
    )
}

#[tokio::test]
async fn upload_sends_file_envelope_and_key_headers() {
    let (url, seen) = pinning_server().await;
    let publisher = publisher(
        &url,
        PinningCredentials::ApiKey {
            key: "key-1".into(),
            secret: Secret::new("secret-1"),
        },
    );

    let cid = publisher
        .upload_file(&SelectedFile::new("cat.png", vec![7u8, 8, 9]))
        .await
        .unwrap();
    assert_eq!(cid, ContentId::new("QmImage"));

    let seen = seen.lock().unwrap().clone();
    assert!(seen.headers.contains(&("pinata_api_key".into(), "key-1".into())));
    assert!(seen.headers.contains(&("pinata_secret_api_key".into(), "secret-1".into())));

    let part = |name: &str| {
        seen.parts
            .iter()
            .find(|(n, _, _)| n == name)
            .unwrap_or_else(|| panic!("missing part {name}"))
            .clone()
    };
    let (_, file_name, bytes) = part("file");
    assert_eq!(file_name.as_deref(), Some("cat.png"));
    assert_eq!(bytes, vec![7, 8, 9]);

    let envelope: Value = serde_json::from_slice(&part("pinataMetadata").2).unwrap();
    assert_eq!(envelope["name"], "cat.png");
    assert_eq!(envelope["keyvalues"]["app"], "picarts");

    let options: Value = serde_json::from_slice(&part("pinataOptions").2).unwrap();
    assert_eq!(options["cidVersion"], 0);
}

#[tokio::test]
async fn metadata_is_posted_as_json_with_bearer_token() {
    let (url, seen) = pinning_server().await;
    let publisher = publisher(&url, PinningCredentials::Jwt(Secret::new("jwt-token")));

    let uri = publisher
        .publish_metadata(&ContentId::new("QmImage"), &Price::parse("0.5").unwrap())
        .await
        .unwrap();
    assert_eq!(uri, "ipfs://QmMeta");

    let seen = seen.lock().unwrap().clone();
    assert!(seen.headers.contains(&("authorization".into(), "Bearer jwt-token".into())));
    assert_eq!(
        seen.json,
        Some(json!({
            "name": "PicArts NFT",
            "description": "Minted with PicArts",
            "image": "ipfs://QmImage",
            "price": "0.5",
        }))
    );
}

#[tokio::test]
async fn rejected_upload_is_an_upload_error() {
    let router = Router::new()
        .route("/pinning/pinFileToIPFS", post(unauthorized))
        .route("/pinning/pinJSONToIPFS", post(unauthorized));
    let url = serve(router).await;
    let publisher = publisher(&url, PinningCredentials::Jwt(Secret::new("expired")));

    let err = publisher
        .upload_file(&SelectedFile::new("cat.png", vec![1u8]))
        .await
        .unwrap_err();
    assert!(matches!(&err, MarketError::Upload(msg) if msg.contains("401")), "{err}");

    let err = publisher
        .publish_metadata(&ContentId::new("QmImage"), &Price::parse("1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::MetadataUpload(_)));
}

#[tokio::test]
async fn fetcher_accepts_json_and_rejects_everything_else() {
    let router = Router::new()
        .route(
            "/ipfs/good",
            get(|| async { Json(json!({ "name": "Sunset", "image": "ipfs://QmImg" })) }),
        )
        .route(
            "/ipfs/html",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html>rate limited</html>") }),
        )
        .route(
            "/ipfs/gone",
            get(|| async { (StatusCode::NOT_FOUND, "not found") }),
        );
    let url = serve(router).await;
    let fetcher = HttpMetadataFetcher::default();

    let doc = fetcher.fetch_metadata(&format!("{url}/ipfs/good")).await.unwrap();
    assert_eq!(doc.name.as_deref(), Some("Sunset"));
    assert_eq!(doc.image, "ipfs://QmImg");

    let err = fetcher
        .fetch_metadata(&format!("{url}/ipfs/html"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, MarketError::Http { reason, .. } if reason.contains("text/html")),
        "{err}"
    );

    let err = fetcher
        .fetch_metadata(&format!("{url}/ipfs/gone"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, MarketError::Http { reason, .. } if reason.contains("404")),
        "{err}"
    );
}
