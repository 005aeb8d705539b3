//! End-to-end tests: registry-wired controllers served through Axum

use axum::body::Body;
use fall_core::{Component, Environment, NoopEnvConfiguration, Registry};
use fall_http::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Note {
    id: u32,
    text: String,
}

#[derive(Default)]
struct NoteStore {
    notes: Mutex<HashMap<u32, Note>>,
}

impl NoteStore {
    fn insert(&self, text: String) -> Note {
        let mut notes = self.notes.lock().unwrap();
        let note = Note {
            id: notes.len() as u32 + 1,
            text,
        };
        notes.insert(note.id, note.clone());
        note
    }

    fn get(&self, id: u32) -> Option<Note> {
        self.notes.lock().unwrap().get(&id).cloned()
    }
}

#[derive(Default)]
struct NotesController {
    store: Option<Arc<NoteStore>>,
}

impl Controller for NotesController {
    fn configure(&self, router: &mut Router) -> HttpResult<()> {
        let store = self
            .store
            .clone()
            .ok_or_else(|| HttpError::internal("note store not injected"))?;

        router.group("/notes", |notes| {
            let reader = store.clone();
            notes.get("/{id}", move |req: FallRequest| {
                let store = reader.clone();
                async move {
                    let id: u32 = req.path_param_parsed("id")?;
                    match store.get(id) {
                        Some(note) => FallResponse::ok().json(&note),
                        None => Ok(FallResponse::not_found()),
                    }
                }
            })?;

            let writer = store.clone();
            notes.post("/", move |req: FallRequest| {
                let store = writer.clone();
                async move {
                    let body: HashMap<String, String> = req.json()?;
                    let text = body
                        .get("text")
                        .cloned()
                        .ok_or_else(|| HttpError::bad_request("missing text"))?;
                    FallResponse::created().json(&store.insert(text))
                }
            })?;
            Ok(())
        })?;
        Ok(())
    }
}

fn build_app() -> App {
    let registry = Arc::new(Registry::new());
    registry.store("store", NoteStore::default());
    registry.register(
        "notes",
        Component::<NotesController>::from_default()
            .inject("store", "store", |c: &mut NotesController, s: Arc<NoteStore>| {
                c.store = Some(s)
            })
            .controller(),
    );

    let global = MiddlewarePipeline::new()
        .add(LoggingMiddleware::new())
        .add(middleware_fn("powered-by", |req, next| async move {
            next.run(req).await.with_header("x-powered-by", "fall")
        }));

    App::new(registry, Environment::Testing, &NoopEnvConfiguration, global).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_and_fetch_through_axum() {
    let router = build_app().into_axum_router(&HttpConfig::default());

    let created = router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/notes")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"buy milk"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.headers()["x-powered-by"], "fall");
    let note: Note = serde_json::from_value(body_json(created).await).unwrap();
    assert_eq!(note.text, "buy milk");

    let fetched = router
        .oneshot(
            axum::http::Request::builder()
                .uri(format!("/notes/{}", note.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(fetched).await["text"], "buy milk");
}

#[tokio::test]
async fn handler_errors_become_json_responses() {
    let app = build_app();

    let bad_id = app
        .dispatch(FallRequest::parse(Method::GET, "/notes/abc").unwrap())
        .await;
    assert_eq!(bad_id.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body_json().unwrap()["error"]["code"], "BAD_REQUEST");

    let no_body = app
        .dispatch(FallRequest::parse(Method::POST, "/notes").unwrap())
        .await;
    assert_eq!(no_body.status_code(), StatusCode::BAD_REQUEST);

    let missing = app
        .dispatch(FallRequest::parse(Method::GET, "/notes/99").unwrap())
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = HttpConfig {
        max_request_size: 8,
        ..HttpConfig::default()
    };
    let router = build_app().into_axum_router(&config);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/notes")
                .body(Body::from(r#"{"text":"far too long for the limit"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn controller_with_missing_dependency_aborts_startup() {
    let registry = Arc::new(Registry::new());
    registry.register(
        "notes",
        Component::<NotesController>::from_default()
            .inject("store", "store", |c: &mut NotesController, s: Arc<NoteStore>| {
                c.store = Some(s)
            })
            .controller(),
    );

    let err = App::new(
        registry.clone(),
        Environment::Testing,
        &NoopEnvConfiguration,
        MiddlewarePipeline::new(),
    )
    .unwrap_err();

    assert!(matches!(err, HttpError::Registry(ref e) if e.is_not_registered()));
    assert!(!registry.is_resolved("notes"));
}

#[tokio::test]
async fn serves_over_tcp_and_shuts_down() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(build_app().serve(listener, HttpConfig::default(), async move {
        let _ = stopped.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /notes/1 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 404"), "unexpected response: {}", raw);

    stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
