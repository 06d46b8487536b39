//! Fake workflow host
//!
//! An axum server on an ephemeral local port answering `/webhook/{name}`
//! with the response shapes the real host produces. Every request is
//! recorded for inspection.

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use safeapp_common::config::DashConfig;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub webhook: String,
    pub body: Value,
}

pub struct WebhookServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl WebhookServer {
    /// Config pointing every webhook at this server
    pub fn config(&self) -> DashConfig {
        DashConfig {
            base_url: format!("http://{}", self.addr),
            ..DashConfig::default()
        }
    }

    pub fn requests_to(&self, webhook: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.webhook == webhook)
            .cloned()
            .collect()
    }
}

type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

pub async fn spawn_webhook_server() -> WebhookServer {
    let requests: Recorder = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/webhook/:name", any(handle_webhook))
        .with_state(requests.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    WebhookServer { addr, requests }
}

async fn handle_webhook(
    State(requests): State<Recorder>,
    Path(name): Path<String>,
    method: Method,
    body: String,
) -> Response {
    let body = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    requests.lock().unwrap().push(RecordedRequest {
        method,
        webhook: name.clone(),
        body,
    });

    match name.as_str() {
        "safeapp-tasks" => Json(json!({"items": [
            {"json": {"id": "t1", "title": "Relancer devis", "status": "needsAction"}},
            {"json": {"id": "t2", "title": "Commander cylindres", "status": "completed"}}
        ]}))
        .into_response(),
        "safeapp-calendar" => Json(json!({
            "1": {"id": "e2", "summary": "Pose porte blindée", "start": {"date": "2026-10-21"}},
            "0": {"id": "e1", "summary": "Métrage", "start": {"dateTime": "2026-10-20T09:00:00+02:00"}}
        }))
        .into_response(),
        "safeapp-stock" => Json(json!([
            ["Référence", "Marque", "Modèle", "Quantité restante", "Quantité minimum", "Prix unitaire"],
            ["CYL-30", "Fichet", "F3D", "1", "2", "89,90"],
            ["SER-01", "Abus", "Bravus", "8", "2", "45"]
        ]))
        .into_response(),
        "safeapp-fiches" => Json(json!([{
            "id": "f-1",
            "marque": "Fichet",
            "modele": "F3D",
            "photos": "https://drive.example/a.jpg\nhttps://drive.example/b.jpg",
            "cotes": "perçage: 30mm",
            "date": "2026-09-01T08:00:00Z"
        }]))
        .into_response(),
        "safeapp-fiche-asset" => {
            Json(json!({"items": [{"json": {"url": "https://drive.example/uploaded.jpg"}}]}))
                .into_response()
        }
        "safeapp-transcribe" => "entraxe: 70mm".into_response(),
        "safeapp-send-email" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "mailer down").into_response()
        }
        "safeapp-task-create"
        | "safeapp-task-update"
        | "safeapp-task-delete"
        | "safeapp-stock-update"
        | "safeapp-fiche-upsert"
        | "safeapp-fiche-delete" => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
