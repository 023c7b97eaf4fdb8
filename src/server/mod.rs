//! # Server Module
//!
//! JSON API for the browser game.
//!
//! | Method | Path            | Body                                        |
//! |--------|-----------------|---------------------------------------------|
//! | POST   | `/api/generate` | `{ "prompt": "...", "mode": "random"/"user" }` |
//! | POST   | `/api/compare`  | `{ "targetImage": "...", "generatedImage": "..." }` |
//! | GET    | `/health`       |                                             |
//!
//! In `random` mode the prompt field carries the language code (`no`/`en`);
//! any other mode value is treated as `user`. Image locations must be
//! http(s) URLs; the API never reads files from the server's disk.
//! Failures answer with `{ "error", "kind", "details" }` and a status code
//! derived from the error kind; a failed comparison never carries a score.

use crate::core::game::GameService;
use crate::core::generator::Language;
use crate::core::scorer::ScoreTier;
use crate::error::{ErrorKind, GameError};
use actix_web::http::StatusCode;
use actix_web::error::InternalError;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// How `/api/generate` interprets its prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateMode {
    /// Draw a target prompt for the language in `prompt`
    Random,
    /// Use `prompt` as written by the player
    #[default]
    #[serde(other)]
    User,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub mode: GenerateMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    #[serde(default)]
    pub target_image: String,
    #[serde(default)]
    pub generated_image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareResponse {
    pub score: u8,
    pub tier: ScoreTier,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
    details: String,
}

fn error_response(summary: &str, err: &GameError) -> HttpResponse {
    let kind = err.kind();
    let status =
        StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match kind {
        ErrorKind::InvalidRequest | ErrorKind::Decode => {
            warn!(kind = ?kind, error = %err, "{}", summary)
        }
        _ => error!(kind = ?kind, error = %err, "{}", summary),
    }

    HttpResponse::build(status).json(ErrorBody {
        error: summary,
        kind,
        details: err.to_string(),
    })
}

/// Run blocking service work off the async executor
async fn blocking<T, F>(work: F) -> Result<T, GameError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GameError> + Send + 'static,
{
    web::block(work)
        .await
        .map_err(|e| GameError::Internal(format!("worker pool failure: {}", e)))?
}

async fn generate(
    service: web::Data<GameService>,
    body: web::Json<GenerateRequest>,
) -> HttpResponse {
    const SUMMARY: &str = "Failed to generate image";
    let GenerateRequest { prompt, mode } = body.into_inner();

    match mode {
        GenerateMode::Random => {
            let language = match prompt.parse::<Language>() {
                Ok(language) => language,
                Err(reason) => return error_response(SUMMARY, &GameError::InvalidRequest(reason)),
            };
            let service = service.get_ref().clone();
            match blocking(move || service.new_round(language)).await {
                Ok(round) => {
                    info!(round = %round.id, "Round started");
                    HttpResponse::Ok().json(GenerateResponse {
                        url: round.image_url,
                        prompt: Some(round.prompt),
                    })
                }
                Err(e) => error_response(SUMMARY, &e),
            }
        }
        GenerateMode::User => {
            let service = service.get_ref().clone();
            match blocking(move || service.generate(&prompt)).await {
                Ok(url) => HttpResponse::Ok().json(GenerateResponse { url, prompt: None }),
                Err(e) => error_response(SUMMARY, &e),
            }
        }
    }
}

async fn compare(
    service: web::Data<GameService>,
    body: web::Json<CompareRequest>,
) -> HttpResponse {
    const SUMMARY: &str = "Failed to compare images";
    let CompareRequest {
        target_image,
        generated_image,
    } = body.into_inner();

    if target_image.trim().is_empty() || generated_image.trim().is_empty() {
        return error_response(
            SUMMARY,
            &GameError::InvalidRequest("Missing image URLs".to_string()),
        );
    }

    let service = service.get_ref().clone();
    match blocking(move || service.compare(&target_image, &generated_image)).await {
        Ok(comparison) => HttpResponse::Ok().json(CompareResponse {
            score: comparison.score,
            tier: comparison.tier,
        }),
        Err(e) => error_response(SUMMARY, &e),
    }
}

async fn health(service: web::Data<GameService>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "generation": service.can_generate(),
    }))
}

/// Register routes and the JSON error handler
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorBody {
            error: "Invalid request body",
            kind: ErrorKind::InvalidRequest,
            details: err.to_string(),
        };
        let response = HttpResponse::BadRequest().json(body);
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .route("/health", web::get().to(health))
        .route("/api/generate", web::post().to(generate))
        .route("/api/compare", web::post().to(compare));
}

pub struct GameApi;

impl GameApi {
    pub async fn start(service: GameService, host: &str, port: u16) -> std::io::Result<()> {
        let data = web::Data::new(service);
        info!("Listening on http://{}:{}", host, port);

        HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
            .bind((host, port))?
            .run()
            .await
    }
}
