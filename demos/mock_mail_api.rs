// SPDX-License-Identifier: Apache-2.0
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use serde_json::json;
use uuid::Uuid;

/// Accept the `{from, to, subject, html|text}` payload and acknowledge it
/// the way a hosted mail API would, without delivering anything.
async fn send(payload: web::Json<serde_json::Value>) -> impl Responder {
    let to = payload
        .get("to")
        .and_then(|v| v.as_str())
        .unwrap_or("<missing>");
    println!("📧 would deliver to {}", to);

    HttpResponse::Ok().json(json!({
        "id": Uuid::new_v4().to_string(),
        "message": "Queued",
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("🚀 Starting mock mail API on http://127.0.0.1:7861");

    HttpServer::new(|| App::new().service(web::resource("/send").route(web::post().to(send))))
        .bind("127.0.0.1:7861")?
        .workers(2)
        .run()
        .await
}
