use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use civitas_common::EnvVars;
use civitas_service_api::{api_router, setup_tracing, ApiServerEnv, GlobalState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let env = ApiServerEnv::load();
    let global_state = GlobalState::from_env(&env).await?;

    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let app = api_router(global_state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .layer(trace);

    let port = env.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
