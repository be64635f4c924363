//! A fake SmolHub: the REST `models` table plus the public storage bucket.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub enum Object {
    /// Served with a content-length header.
    Sized(Vec<u8>),
    /// Served chunked, without content-length.
    Chunked(Vec<u8>),
    /// Sends the bytes, then breaks the body stream.
    Broken(Vec<u8>),
}

#[derive(Clone, Default)]
pub struct FakeHub {
    models: HashMap<String, Value>,
    objects: HashMap<String, Object>,
    metadata_status: Option<StatusCode>,
    auth_seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model row pointing at `file_path`, and the object behind it.
    pub fn model(mut self, unique_id: &str, file_path: &str, object: Object) -> Self {
        self.models.insert(
            unique_id.to_string(),
            json!({ "unique_id": unique_id, "name": unique_id, "file_path": file_path }),
        );
        self.objects.insert(file_path.to_string(), object);
        self
    }

    /// Register a model row whose object is missing from storage.
    pub fn dangling_model(mut self, unique_id: &str, file_path: &str) -> Self {
        self.models.insert(
            unique_id.to_string(),
            json!({ "unique_id": unique_id, "file_path": file_path }),
        );
        self
    }

    /// Register a model row carrying only `file_path`.
    pub fn bare_model(mut self, unique_id: &str, file_path: &str, object: Object) -> Self {
        self.models
            .insert(unique_id.to_string(), json!({ "file_path": file_path }));
        self.objects.insert(file_path.to_string(), object);
        self
    }

    pub fn metadata_status(mut self, status: StatusCode) -> Self {
        self.metadata_status = Some(status);
        self
    }

    /// Authorization headers received by the metadata endpoint, in order.
    pub fn auth_seen(&self) -> Vec<Option<String>> {
        self.auth_seen.lock().unwrap().clone()
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/rest/v1/models", get(models))
            .route("/storage/v1/object/public/models/*path", get(object))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }
}

async fn models(
    State(hub): State<FakeHub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    hub.auth_seen.lock().unwrap().push(auth);

    if let Some(status) = hub.metadata_status {
        return (status, "upstream exploded").into_response();
    }

    let id = query
        .get("unique_id")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default();
    let rows: Vec<Value> = hub.models.get(id).cloned().into_iter().collect();

    Json(rows).into_response()
}

async fn object(State(hub): State<FakeHub>, Path(path): Path<String>) -> Response {
    match hub.objects.get(&path).cloned() {
        None => (StatusCode::NOT_FOUND, "object not found").into_response(),
        Some(Object::Sized(bytes)) => bytes.into_response(),
        Some(Object::Chunked(bytes)) => {
            let chunks: Vec<Result<Bytes, io::Error>> = bytes
                .chunks(3)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            Body::from_stream(stream::iter(chunks)).into_response()
        }
        Some(Object::Broken(bytes)) => {
            let head = stream::once(async move { Ok::<_, io::Error>(Bytes::from(bytes)) });
            let tail = stream::once(async {
                // let the first chunk reach the client before the connection drops
                tokio::time::sleep(Duration::from_millis(200)).await;
                Err::<Bytes, _>(io::Error::new(io::ErrorKind::ConnectionReset, "storage node went away"))
            });
            Body::from_stream(head.chain(tail)).into_response()
        }
    }
}
