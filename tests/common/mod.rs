#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use scan_dash::api::HttpScannerApi;
use scan_dash::auth::BasicCredentials;
use scan_dash::types::Config;

pub const USER: &str = "admin";
pub const PASSWORD: &str = "secret";

/// What the mock backend saw and what it will answer.
#[derive(Debug)]
pub struct Recorded {
    pub config: Config,
    pub scans: Value,
    pub auth_headers: Vec<Option<String>>,
    pub get_content_types: Vec<Option<String>>,
    pub config_gets: usize,
    pub scan_gets: usize,
    pub runs: usize,
    pub puts: Vec<Config>,
    pub fail_with: Option<StatusCode>,
}

#[derive(Clone)]
pub struct Backend {
    pub addr: SocketAddr,
    pub inner: Arc<Mutex<Recorded>>,
}

impl Backend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api(&self) -> HttpScannerApi {
        HttpScannerApi::new(self.base_url(), Arc::new(BasicCredentials::new(USER, PASSWORD)))
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().expect("backend lock")
    }
}

pub fn sample_scans() -> Value {
    json!([
        {
            "id": 3,
            "date": "2024-01-15 10:00:00"
        },
        {
            "id": 2,
            "date": "2024-02-01 10:00:00",
            "hosts": [
                { "address": "192.168.1.20", "ports": [
                    { "port_num": 22, "protocol": "tcp", "service_name": "ssh", "state": "open", "vulnerabilities": null }
                ]}
            ]
        },
        {
            "id": 1,
            "date": "2024-01-01 10:00:00",
            "hosts": [
                { "address": "192.168.1.10", "ports": [
                    { "port_num": 80, "protocol": "tcp", "service_name": "http", "state": "open", "vulnerabilities": [
                        { "cve": "CVE-2021-41773", "description": "path traversal", "score": "7.5", "url": "https://nvd.nist.gov/vuln/detail/CVE-2021-41773" },
                        { "cve": "CVE-2021-42013", "description": "path traversal", "score": "9.8", "url": "https://nvd.nist.gov/vuln/detail/CVE-2021-42013" }
                    ]}
                ]},
                { "address": "192.168.1.11" }
            ]
        }
    ])
}

fn authorize(b: &Backend, headers: &HeaderMap) -> Result<(), StatusCode> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut rec = b.recorded();
    rec.auth_headers.push(auth.clone());
    if let Some(status) = rec.fail_with {
        return Err(status);
    }
    let expected = format!("Basic {}", base64_pair());
    if auth.as_deref() != Some(expected.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

fn record_get(b: &Backend, headers: &HeaderMap) {
    let ct = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    b.recorded().get_content_types.push(ct);
}

fn base64_pair() -> &'static str {
    // admin:secret
    "YWRtaW46c2VjcmV0"
}

async fn get_scans(State(b): State<Backend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorize(&b, &headers)?;
    record_get(&b, &headers);
    let mut rec = b.recorded();
    rec.scan_gets += 1;
    Ok(Json(rec.scans.clone()))
}

async fn get_scan(
    State(b): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&b, &headers)?;
    record_get(&b, &headers);
    let id: i64 = id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let found = b
        .recorded()
        .scans
        .as_array()
        .and_then(|all| all.iter().find(|s| s["id"] == id).cloned());
    found.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn run_scan(State(b): State<Backend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorize(&b, &headers)?;
    record_get(&b, &headers);
    let mut rec = b.recorded();
    rec.runs += 1;
    Ok(Json(json!({ "status": "scan started", "scan_id": 40 + rec.runs })))
}

async fn get_config(State(b): State<Backend>, headers: HeaderMap) -> Result<Json<Config>, StatusCode> {
    authorize(&b, &headers)?;
    record_get(&b, &headers);
    let mut rec = b.recorded();
    rec.config_gets += 1;
    Ok(Json(rec.config.clone()))
}

async fn put_config(
    State(b): State<Backend>,
    headers: HeaderMap,
    Json(cfg): Json<Config>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&b, &headers)?;
    let mut rec = b.recorded();
    rec.puts.push(cfg.clone());
    rec.config = cfg;
    Ok(Json(json!({ "status": "updated" })))
}

/// Serve the mock backend on an ephemeral localhost port.
pub async fn spawn_backend(scans: Value) -> Backend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    let backend = Backend {
        addr,
        inner: Arc::new(Mutex::new(Recorded {
            config: Config {
                email: "ops@example.com".into(),
                scan_frequency: 86400,
                target: "192.168.1.0/24".into(),
            },
            scans,
            auth_headers: Vec::new(),
            get_content_types: Vec::new(),
            config_gets: 0,
            scan_gets: 0,
            runs: 0,
            puts: Vec::new(),
            fail_with: None,
        })),
    };

    let app = Router::new()
        .route("/api/scans", get(get_scans))
        .route("/api/scan/run", get(run_scan))
        .route("/api/scan/{id}", get(get_scan))
        .route("/api/config", get(get_config).put(put_config))
        .with_state(backend.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    backend
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

/// An address that accepts connections but never answers, so every request stays pending.
pub async fn stalled_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stalled backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((conn, _)) = listener.accept().await {
            held.push(conn);
        }
    });
    addr
}
