use actix_web::{
    body::BoxBody,
    error, get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer,
};
use blackjack_sim::prelude::*;
use serde::Serialize;

/// Upper bound on the rounds a single request may ask for.
const MAX_TRIALS: u64 = 5_000_000;

/// An enum that will handle user facing errors
#[derive(Debug)]
enum UserError {
    InternalError,
    BadInput(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InternalError => write!(f, "an internal error occured"),
            UserError::BadInput(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for UserError {}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<SimulationError> for UserError {
    fn from(value: SimulationError) -> Self {
        match value {
            SimulationError::ConfigError(_) | SimulationError::GameError(_) => {
                UserError::BadInput(value.to_string())
            }
            e => {
                log::error!("simulation failed: {}", e);
                UserError::InternalError
            }
        }
    }
}

#[derive(Serialize)]
struct StrategyInfo {
    name: &'static str,
    description: &'static str,
}

/// Lists the strategy names a player config accepts.
#[get("/strategies")]
async fn strategies() -> HttpResponse {
    HttpResponse::Ok().json([
        StrategyInfo {
            name: "never-hit",
            description: "always stays",
        },
        StrategyInfo {
            name: "threshold-N",
            description: "hits while the hand is worth less than N",
        },
        StrategyInfo {
            name: "basic",
            description: "table driven basic strategy",
        },
    ])
}

/// A handler that runs a simulation configured by the JSON body and responds with the JSON report.
#[post("/simulate")]
async fn run_simulation_handler(
    config: web::Json<BlackjackSimulatorConfig>,
) -> Result<HttpResponse, UserError> {
    let config = config.into_inner();
    if config.trials > MAX_TRIALS {
        return Err(UserError::BadInput(format!(
            "at most {} trials can be run per request",
            MAX_TRIALS
        )));
    }
    config.validate()?;

    let report = web::block(move || run_simulation(&config))
        .await
        .map_err(|_| UserError::InternalError)??;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .json(report))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let address = "127.0.0.1";
    let port = 8080;
    log::info!("listening at {}:{}", address, port);

    HttpServer::new(|| {
        App::new()
            .service(strategies)
            .service(run_simulation_handler)
    })
    .bind((address, port))?
    .run()
    .await
}
