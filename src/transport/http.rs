//! HTTP transport, built directly on `actix-web` (treated as the concrete
//! embedded HTTP implementation, not hidden behind a HAL indirection — see
//! `hal::mod`). `/health`, `/metrics`, and `/sse` are ambient operational
//! endpoints, not MCP methods.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::header;
use actix_web::middleware::{Compress, DefaultHeaders, Logger};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use tracing::info;

use crate::protocol::engine::{ConnectionHandle, ProtocolEngine};

struct AppState {
    engine: Arc<ProtocolEngine>,
    request_count: AtomicU64,
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "service": "mcp-server" })))
}

async fn metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let count = state.request_count.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "requests_total": count, "status": "ok" })))
}

async fn sse_tools_discovery(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let tools = state.engine.tools.list().await;
    let payload = serde_json::json!({
        "tools": tools["tools"],
        "count": tools["tools"].as_array().map(|a| a.len()).unwrap_or(0),
    });
    let sse_data = format!(
        "data: {}\n\n",
        serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())
    );
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        .insert_header(("x-accel-buffering", "no"))
        .body(sse_data))
}

/// POST handler for the configured MCP path. Returns 202 with an empty
/// body for notifications (the engine itself returns `None` for those);
/// otherwise forwards the engine's serialized reply as the 200 body.
async fn mcp_handler(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let text = String::from_utf8_lossy(&body).to_string();
    let session_id = req
        .headers()
        .get("Mcp-Session-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let connection_id = session_id
        .clone()
        .unwrap_or_else(|| req.peer_addr().map(|a| a.to_string()).unwrap_or_default());

    let conn = ConnectionHandle::new(connection_id);
    *conn.session_id.write().unwrap() = session_id;

    let reply = state.engine.handle_message(&text, &conn).await;
    let resolved_session_id = conn.session_id.read().unwrap().clone();

    match reply {
        Some(body) => {
            let mut builder = cors(HttpResponse::Ok().content_type("application/json"));
            if let Some(id) = resolved_session_id {
                builder.insert_header(("Mcp-Session-Id", id));
            }
            Ok(builder.body(body))
        }
        None => {
            let mut builder = cors(HttpResponse::Accepted());
            if let Some(id) = resolved_session_id {
                builder.insert_header(("Mcp-Session-Id", id));
            }
            Ok(builder.finish())
        }
    }
}

fn cors(mut builder: actix_web::HttpResponseBuilder) -> actix_web::HttpResponseBuilder {
    builder
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header((
            "Access-Control-Allow-Headers",
            "Content-Type, Mcp-Session-Id, Mcp-Protocol-Version",
        ));
    builder
}

pub async fn run(engine: Arc<ProtocolEngine>, host: &str, port: u16, path: &str) -> std::io::Result<()> {
    let bind_addr = format!("{host}:{port}");
    let path = path.to_string();

    let state = web::Data::new(AppState {
        engine,
        request_count: AtomicU64::new(0),
    });

    let workers = std::env::var("WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| num_cpus::get().min(16).max(1));

    info!(%bind_addr, workers, "http transport starting");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .wrap(Logger::new("%r %s %Dms"))
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics))
            .route("/sse", web::get().to(sse_tools_discovery))
            .route(&path, web::post().to(mcp_handler))
    })
    .workers(workers)
    .max_connections(10_000)
    .max_connection_rate(1_000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}
