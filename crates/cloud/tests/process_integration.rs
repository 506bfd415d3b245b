//! Integration tests for the Process API client against an in-process
//! HTTP stub.
//!
//! Tests marked `#[ignore]` talk to the real Copernicus Data Space
//! endpoint and need `SH_CLIENT_ID` / `SH_CLIENT_SECRET` in the environment.
//! Run with: `cargo test -p forestwatch-cloud -- --ignored`

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use forestwatch_cloud::blocking::ImageFetcherBlocking;
use forestwatch_cloud::{
    CloudError, Evalscript, FetchParams, ImageFetcher, ShConfig, TimeInterval,
};
use forestwatch_core::io::{encode, read_image, ImageFormat};
use forestwatch_core::{BBox, Raster};

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    fn image(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "image/tiff",
            body,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap();
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// Handler receives the request and how many earlier requests hit the
/// same path.
type Handler = dyn Fn(&Recorded, usize) -> Reply + Send + Sync;

struct Shared {
    handler: Box<Handler>,
    requests: Mutex<Vec<Recorded>>,
}

/// Axum app on an ephemeral port, served from its own thread and runtime
/// so blocking tests can use it too.
struct StubServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl StubServer {
    fn start(handler: impl Fn(&Recorded, usize) -> Reply + Send + Sync + 'static) -> Self {
        let shared = Arc::new(Shared {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(record)
            .with_state(Arc::clone(&shared));

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        let addr = rx.recv().unwrap();

        Self { addr, shared }
    }

    fn config(&self) -> ShConfig {
        ShConfig {
            sh_client_id: "test-client".into(),
            sh_client_secret: "test-secret".into(),
            sh_token_url: format!("http://{}/token", self.addr),
            sh_base_url: format!("http://{}", self.addr),
            request_timeout_secs: 5,
            max_retries: 3,
        }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().unwrap().clone()
    }

    fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

async fn record(
    State(shared): State<Arc<Shared>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    let request = Recorded {
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body: body.to_vec(),
    };

    let nth = {
        let mut log = shared.requests.lock().unwrap();
        let nth = log.iter().filter(|r| r.path == request.path).count();
        log.push(request.clone());
        nth
    };

    (shared.handler)(&request, nth)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const TOKEN_OK: &str = r#"{"access_token":"tok-1","expires_in":3600,"token_type":"Bearer"}"#;

fn small_bbox() -> BBox {
    BBox::new(-64.0, -10.5, -63.99, -10.49).unwrap()
}

fn dates() -> TimeInterval {
    TimeInterval::parse("2017-01-01", "2017-06-30").unwrap()
}

fn sample_raster() -> Raster {
    let data = vec![10, 20, 30, 40, 50, 60, 0, 100, 200, 1, 2, 3];
    Raster::from_vec(data, 2, 2, 3).unwrap()
}

fn sample_tiff() -> Vec<u8> {
    encode(&sample_raster(), ImageFormat::Tiff).unwrap()
}

fn happy_path(req: &Recorded, _nth: usize) -> Reply {
    match req.path.as_str() {
        "/token" => Reply::json(200, TOKEN_OK),
        "/api/v1/process" => Reply::image(sample_tiff()),
        _ => Reply::json(404, "{}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_brightens_and_saves() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("true_color_before.png");
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates())
        .brightness(6.0)
        .save_to(&path);

    let raster = fetcher.fetch(&params).await.unwrap();

    assert_eq!(
        raster.to_interleaved(),
        vec![60, 120, 180, 240, 255, 255, 0, 255, 255, 6, 12, 18]
    );
    assert_eq!(read_image(&path).unwrap().to_interleaved(), raster.to_interleaved());

    let (min_x, min_y, max_x, max_y) = raster.bounds();
    assert!((min_x - -64.0).abs() < 1e-9);
    assert!((min_y - -10.5).abs() < 1e-9);
    assert!((max_x - -63.99).abs() < 1e-9);
    assert!((max_y - -10.49).abs() < 1e-9);
}

#[tokio::test]
async fn test_unit_brightness_returns_service_pixels() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::NdviColor, small_bbox(), dates());

    let raster = fetcher.fetch(&params).await.unwrap();
    assert_eq!(raster.to_interleaved(), sample_raster().to_interleaved());
}

#[tokio::test]
async fn test_request_body_and_headers() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::NdviColor, small_bbox(), dates());
    fetcher.fetch(&params).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);

    let token = &requests[0];
    assert_eq!(token.path, "/token");
    let form = String::from_utf8(token.body.clone()).unwrap();
    assert!(form.contains("grant_type=client_credentials"));
    assert!(form.contains("client_id=test-client"));
    assert!(form.contains("client_secret=test-secret"));

    let process = &requests[1];
    assert_eq!(process.path, "/api/v1/process");
    assert_eq!(process.headers["authorization"], "Bearer tok-1");
    assert_eq!(process.headers["accept"], "image/tiff");

    let body: serde_json::Value = serde_json::from_slice(&process.body).unwrap();
    assert_eq!(body["input"]["bounds"]["bbox"][0], -64.0);
    assert_eq!(
        body["input"]["bounds"]["properties"]["crs"],
        "http://www.opengis.net/def/crs/EPSG/0/4326"
    );
    let source = &body["input"]["data"][0];
    assert_eq!(source["type"], "sentinel-2-l2a");
    assert_eq!(source["dataFilter"]["mosaickingOrder"], "leastCC");
    assert_eq!(source["dataFilter"]["timeRange"]["from"], "2017-01-01T00:00:00Z");
    assert_eq!(source["dataFilter"]["timeRange"]["to"], "2017-06-30T23:59:59Z");
    assert_eq!(body["output"]["responses"][0]["identifier"], "default");
    assert_eq!(body["evalscript"], Evalscript::NdviColor.source());

    let (w, h) = params.request_dimensions().unwrap();
    assert_eq!(body["output"]["width"], w);
    assert_eq!(body["output"]["height"], h);
}

#[tokio::test]
async fn test_token_reused_across_fetches() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates());

    fetcher.fetch(&params).await.unwrap();
    fetcher.fetch(&params).await.unwrap();

    assert_eq!(server.hits("/token"), 1);
    assert_eq!(server.hits("/api/v1/process"), 2);
}

#[tokio::test]
async fn test_rejected_credentials_fail_with_auth() {
    let server = StubServer::start(|req, _| match req.path.as_str() {
        "/token" => Reply::json(401, r#"{"error":"invalid_client"}"#),
        _ => Reply::image(sample_tiff()),
    });
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates());

    let err = fetcher.fetch(&params).await.unwrap_err();
    assert!(matches!(err, CloudError::Auth(_)), "got {err:?}");
    assert_eq!(server.hits("/token"), 1);
    assert_eq!(server.hits("/api/v1/process"), 0);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = StubServer::start(|req, _| match req.path.as_str() {
        "/token" => Reply::json(200, TOKEN_OK),
        _ => Reply::json(400, r#"{"error":{"message":"Invalid evalscript"}}"#),
    });
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::Custom("bogus".into()), small_bbox(), dates());

    match fetcher.fetch(&params).await {
        Err(CloudError::Network(msg)) => {
            assert!(msg.contains("400"));
            assert!(msg.contains("Invalid evalscript"));
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert_eq!(server.hits("/api/v1/process"), 1);
}

#[tokio::test]
async fn test_server_error_retried() {
    let server = StubServer::start(|req, nth| match req.path.as_str() {
        "/token" => Reply::json(200, TOKEN_OK),
        _ if nth == 0 => Reply::json(503, "{}"),
        _ => Reply::image(sample_tiff()),
    });
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates());

    fetcher.fetch(&params).await.unwrap();
    assert_eq!(server.hits("/api/v1/process"), 2);
}

#[tokio::test]
async fn test_persistent_server_error_gives_up() {
    let server = StubServer::start(|req, _| match req.path.as_str() {
        "/token" => Reply::json(200, TOKEN_OK),
        _ => Reply::json(500, "{}"),
    });
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates());

    let err = fetcher.fetch(&params).await.unwrap_err();
    assert!(matches!(err, CloudError::Network(_)));
    assert_eq!(server.hits("/api/v1/process"), 4);
}

#[tokio::test]
async fn test_oversized_request_sends_nothing() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let bbox = BBox::new(-66.0, -12.0, -62.0, -8.0).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, bbox, dates());

    let err = fetcher.fetch(&params).await.unwrap_err();
    assert!(matches!(err, CloudError::DimensionsTooLarge { .. }));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_brightness_sends_nothing() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params =
        FetchParams::new(Evalscript::TrueColor, small_bbox(), dates()).brightness(-2.0);

    let err = fetcher.fetch(&params).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidRequest(_)), "got {err:?}");
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_token_request_is_unsigned() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates());
    fetcher.fetch(&params).await.unwrap();

    let token = &server.requests()[0];
    assert_eq!(token.path, "/token");
    assert!(!token.headers.contains_key("authorization"));
    assert_eq!(token.headers["content-type"], "application/x-www-form-urlencoded");
}

#[tokio::test]
async fn test_empty_body_is_empty_response() {
    let server = StubServer::start(|req, _| match req.path.as_str() {
        "/token" => Reply::json(200, TOKEN_OK),
        _ => Reply::image(Vec::new()),
    });
    let fetcher = ImageFetcher::new(server.config()).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, small_bbox(), dates());

    let err = fetcher.fetch(&params).await.unwrap_err();
    assert!(matches!(err, CloudError::EmptyResponse));
}

#[test]
fn test_missing_credentials_rejected() {
    let err = ImageFetcher::new(ShConfig::default()).err().unwrap();
    assert!(matches!(err, CloudError::Config(_)));
}

#[test]
fn test_blocking_fetch_in_sequence() {
    let server = StubServer::start(happy_path);
    let fetcher = ImageFetcherBlocking::new(server.config()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for name in ["ndvi_before.png", "ndvi_after.png"] {
        let params = FetchParams::new(Evalscript::NdviColor, small_bbox(), dates())
            .brightness(0.8)
            .save_to(dir.path().join(name));
        let raster = fetcher.fetch(&params).unwrap();
        assert_eq!(raster.to_interleaved()[0], 8);
    }

    assert!(dir.path().join("ndvi_before.png").exists());
    assert!(dir.path().join("ndvi_after.png").exists());
    assert_eq!(server.hits("/token"), 1);
}

/// Fetch a small true-color scene from the real CDSE endpoint.
#[tokio::test]
#[ignore]
async fn test_fetch_from_cdse() {
    let id = std::env::var("SH_CLIENT_ID").expect("SH_CLIENT_ID not set");
    let secret = std::env::var("SH_CLIENT_SECRET").expect("SH_CLIENT_SECRET not set");

    let fetcher = ImageFetcher::new(ShConfig::cdse(id, secret)).unwrap();
    let bbox = BBox::from_aoi(-64.20, -10.60, -64.25, -10.55).unwrap();
    let params = FetchParams::new(Evalscript::TrueColor, bbox, dates());

    let raster = fetcher.fetch(&params).await.unwrap();
    let (w, h) = params.request_dimensions().unwrap();
    assert_eq!(raster.shape(), (h, w));
    assert_eq!(raster.bands(), 3);
}
