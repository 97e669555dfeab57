use actix_files::Files;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

use mailgate::config::MailerConfig;
use mailgate::dispatch::MailDispatcher;
use mailgate::error::MailError;
use mailgate::logging;
use mailgate::message::EmailMessage;
use mailgate::middleware::{API_KEY_ENV, ApiKeyGuard};
use mailgate::rate_limit::RateLimiters;

// Application configuration constants
const LISTEN_ENV: &str = "MAILGATE_LISTEN";
const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
const LOG_JSON_ENV: &str = "MAILGATE_LOG_JSON";

#[derive(Debug, Deserialize)]
struct SendRequest {
    to: String,
    subject: String,
    body: String,
    #[serde(default = "default_html")]
    html: bool,
}

fn default_html() -> bool {
    true
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok", "service": "mailgate" }))
}

/// Send endpoint: rate-limits, dispatches, and maps the outcome to a status.
/// A failed send is this endpoint's failure only; whether that is fatal to
/// the calling workflow is the caller's decision.
async fn send(
    req: HttpRequest,
    payload: web::Json<SendRequest>,
    dispatcher: web::Data<MailDispatcher>,
    limiters: web::Data<RateLimiters>,
) -> impl Responder {
    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_owned();

    if !limiters.send_limiter.check_ip(&client_ip) {
        return HttpResponse::TooManyRequests()
            .insert_header(("X-RateLimit-Reset", "60"))
            .json(json!({ "error": "too many send requests" }));
    }

    if let Some(remaining) = limiters.recipient_limiter.check_recipient(&payload.to) {
        return HttpResponse::TooManyRequests()
            .insert_header(("X-RateLimit-Reset", remaining.to_string()))
            .json(json!({ "error": "recipient is in cooldown" }));
    }

    let message = if payload.html {
        EmailMessage::html(&payload.to, &payload.subject, &payload.body)
    } else {
        EmailMessage::text(&payload.to, &payload.subject, &payload.body)
    };

    match dispatcher.send(&message).await {
        Ok(receipt) => HttpResponse::Ok().json(json!({
            "status": "sent",
            "provider_id": receipt.provider_id,
            "detail": receipt.detail,
        })),
        Err(e @ MailError::InvalidMessage(_)) => {
            HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
        }
        Err(e @ (MailError::TransportUnreachable(_) | MailError::TransportRejected(_))) => {
            HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

/// Expose the active rate limit configuration for diagnostics
async fn rate_limit_info(limiters: web::Data<RateLimiters>) -> impl Responder {
    HttpResponse::Ok().json(&limiters.config)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let json_logs = std::env::var(LOG_JSON_ENV)
        .map(|v| matches!(v.as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false);
    if json_logs {
        logging::init_tracing("mailgate", std::io::stdout);
    } else {
        logging::init_console_tracing();
    }

    let config = match MailerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    let dispatcher = match MailDispatcher::from_config(&config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!("failed to initialize mail transport: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    info!(
        transport = dispatcher.transport_kind(),
        sender = dispatcher.sender(),
        "mail dispatcher initialized"
    );
    if std::env::var(API_KEY_ENV).is_err() {
        info!("No API key set in environment. The send endpoint is unauthenticated.");
    }

    let dispatcher = web::Data::new(dispatcher);
    let limiters = web::Data::new(RateLimiters::new());

    let listen = std::env::var(LISTEN_ENV).unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
    info!("starting mailgate on {}", listen);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(ApiKeyGuard::from_env())
            .app_data(dispatcher.clone())
            .app_data(limiters.clone())
            // API Endpoints
            .service(web::resource("/health").route(web::get().to(health_check)))
            .service(web::resource("/send").route(web::post().to(send)))
            .service(web::resource("/rate_limit_info").route(web::get().to(rate_limit_info)))
            // Static status page
            .service(Files::new("/", "static").index_file("index.html"))
    })
    .bind(listen)?
    .workers(4)
    .run()
    .await
}
