mod args;

use std::path::Path;

use clap::Parser;

use entail_model::{AppState, Predictor};

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let otel = entail_common::telemetry::init_tracing(
        "entail-model",
        args.otlp_url.as_deref(),
        args.otlp_token.as_deref(),
    );

    // A failed load keeps the server up so /ping can report it.
    let predictor = match Predictor::load(Path::new(&args.model_dir)) {
        Ok(p) => {
            tracing::info!(model_dir=%args.model_dir, "model loaded");
            Some(p)
        }
        Err(e) => {
            tracing::error!(error=%e, model_dir=%args.model_dir, "model failed to load");
            None
        }
    };

    let app = entail_model::handlers::router(AppState::new(predictor));

    tracing::info!(listen_addr=%args.listen_addr, "entail-model starting");
    let listener = tokio::net::TcpListener::bind(&args.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    entail_common::telemetry::shutdown_tracing(otel);
    Ok(())
}
