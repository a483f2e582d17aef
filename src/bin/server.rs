use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use histloc::Simulation;
use histloc::config::Params;
use histloc::motion::{Direction, Position};
use histloc::render::{self, Marker};
use histloc::rng::Rng;

/// Slider values arrive as percentages, like the frontend shows them.
#[derive(Deserialize)]
struct ResetRequest {
    seed: Option<u64>,
    width: Option<usize>,
    height: Option<usize>,
    density: Option<usize>,
    movement_percent: Option<f64>,
    sensor_percent: Option<f64>,
}

#[derive(Deserialize)]
struct ParamsRequest {
    density: Option<usize>,
    movement_percent: Option<f64>,
    sensor_percent: Option<f64>,
}

#[derive(Deserialize)]
struct StepRequest {
    direction: Direction,
}

#[derive(Serialize)]
struct StateResponse {
    layers: Vec<Layer>,
    width: usize,
    height: usize,
    params: Params,
    position: Position,
    correct: bool,
    steps: u64,
    estimate: Position,
    estimate_probability: f64,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Simulation(#[from] histloc::Error),
    #[error("PNG encode failed: {0}")]
    Png(#[from] image::ImageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Simulation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Png(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(error = %self, "request failed");
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

struct Session {
    params: Params,
    sim: Simulation,
    rng: Rng,
}

type AppState = Arc<Mutex<Session>>;

fn lock(state: &AppState) -> MutexGuard<'_, Session> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn encode_png(rgba: &[u8], w: usize, h: usize) -> Result<String, ApiError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder.write_image(rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn snapshot(session: &Session) -> Result<StateResponse, ApiError> {
    let sim = &session.sim;
    let (w, h) = render::image_size(session.params.width, session.params.height);
    let marker = Marker {
        position: sim.position,
        correct: sim.last_correct,
    };

    let layers = vec![
        Layer {
            name: "environment".into(),
            data_url: encode_png(
                &render::render_environment(&sim.environment, Some(marker)),
                w,
                h,
            )?,
        },
        Layer {
            name: "belief".into(),
            data_url: encode_png(&render::render_belief(&sim.belief), w, h)?,
        },
    ];

    let (estimate, estimate_probability) = sim.belief.most_likely();
    Ok(StateResponse {
        layers,
        width: w,
        height: h,
        params: session.params.clone(),
        position: sim.position,
        correct: sim.last_correct,
        steps: sim.steps,
        estimate,
        estimate_probability,
    })
}

fn percent(value: Option<f64>, current: f64) -> f64 {
    value.map(|p| p / 100.0).unwrap_or(current)
}

async fn state_handler(State(state): State<AppState>) -> Result<Json<StateResponse>, ApiError> {
    Ok(Json(snapshot(&lock(&state))?))
}

async fn reset_handler(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let defaults = Params::default();
    let params = Params {
        width: req.width.unwrap_or(defaults.width),
        height: req.height.unwrap_or(defaults.height),
        density: req.density.unwrap_or(defaults.density),
        movement_certainty: percent(req.movement_percent, defaults.movement_certainty),
        sensor_accuracy: percent(req.sensor_percent, defaults.sensor_accuracy),
    };
    let seed = req.seed.unwrap_or(42);

    let mut rng = Rng::new(seed);
    let sim = Simulation::new(&params, &mut rng)?;
    info!(seed, ?params, "session reset");

    let mut session = lock(&state);
    *session = Session { params, sim, rng };
    Ok(Json(snapshot(&session)?))
}

async fn params_handler(
    State(state): State<AppState>,
    Json(req): Json<ParamsRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let mut session = lock(&state);
    let current = &session.params;
    let params = Params {
        density: req.density.unwrap_or(current.density),
        movement_certainty: percent(req.movement_percent, current.movement_certainty),
        sensor_accuracy: percent(req.sensor_percent, current.sensor_accuracy),
        ..current.clone()
    };

    let sim = session.sim.reconfigure(&params)?;
    session.sim = sim;
    session.params = params;
    Ok(Json(snapshot(&session)?))
}

async fn step_handler(
    State(state): State<AppState>,
    Json(req): Json<StepRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let mut guard = lock(&state);
    let session = &mut *guard;
    let sim = session
        .sim
        .step(req.direction.motion(), &session.params, &mut session.rng)?;
    session.sim = sim;
    Ok(Json(snapshot(session)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = Params::default();
    let mut rng = Rng::new(42);
    let sim = Simulation::new(&params, &mut rng)?;
    let state: AppState = Arc::new(Mutex::new(Session { params, sim, rng }));

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/state", get(state_handler))
        .route("/api/reset", post(reset_handler))
        .route("/api/params", post(params_handler))
        .route("/api/step", post(step_handler))
        .fallback_service(frontend)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("histloc server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
