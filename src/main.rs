use dewar_flow::estimation::model::RateModel;
use dewar_flow::estimation::pairwise_mean::PairwiseMeanModel;
use dewar_flow::{api, config, estimation, state};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tracing::Level;

fn init_tracing(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "dewar-flow starting"
    );

    let policy = config.policy()?;
    let max_observations = config.max_observations()?;
    let model: Box<dyn RateModel> = match estimation::create_rate_model(config.rate_method()) {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!(error = %e, "Unknown rate method, using pairwise mean");
            Box::new(PairwiseMeanModel)
        }
    };
    tracing::info!(
        rate_method = model.name(),
        min_level = policy.min_level,
        max_level = policy.max_level,
        delivery_days = policy.delivery_days,
        max_observations,
        "Estimation policy loaded"
    );

    let state = Arc::new(RwLock::new(state::AppState::with_settings(
        policy,
        Arc::from(model),
        max_observations,
    )));

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
