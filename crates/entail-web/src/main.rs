mod args;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use entail_common::{Clock, EndpointState, SystemClock};
use entail_meta::{EtcdMetaStore, MemoryMetaStore, MetaStore};
use entail_web::{
    AppState, ControllerConfig, EndpointController, EndpointPlatform, Handler, InferenceClient,
    IntervalTrigger, InvocationStore, InvocationTracker, LocalInvocationFile, ManagedPlatform,
    Metrics, PredictionProxy, StaticEndpoint,
};

use crate::args::{Args, PlatformKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let otel = entail_common::telemetry::init_tracing(
        "entail-web",
        args.otlp_url.as_deref(),
        args.otlp_token.as_deref(),
    );

    let store: Arc<dyn MetaStore> = match args.etcd_endpoint.as_ref() {
        Some(endpoint) => Arc::new(EtcdMetaStore::connect(std::slice::from_ref(endpoint)).await?),
        None => {
            tracing::warn!("ETCD_ENDPOINT not set, invocation record is process-local");
            Arc::new(MemoryMetaStore::new())
        }
    };

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(3))
        .timeout(Duration::from_secs(60))
        .build()?;

    let (platform, inference) = match args.platform {
        PlatformKind::Managed => {
            let p = Arc::new(ManagedPlatform::new(http, &args.control_url, &args.runtime_url));
            let platform: Arc<dyn EndpointPlatform> = p.clone();
            let inference: Arc<dyn InferenceClient> = p;
            (platform, inference)
        }
        PlatformKind::Static => {
            let p = Arc::new(StaticEndpoint::new(http, &args.runtime_url));
            let platform: Arc<dyn EndpointPlatform> = p.clone();
            let inference: Arc<dyn InferenceClient> = p;
            (platform, inference)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics = Arc::new(Metrics::default());
    let tracker = Arc::new(InvocationTracker::new(
        InvocationStore::new(store, args.project_id.clone()),
        LocalInvocationFile::new(&args.local_log_path),
        args.store_write_interval_minutes,
    ));

    // An endpoint left running by a previous process still needs idle checks.
    let initial = match platform.describe_endpoint(&args.endpoint_name).await {
        Ok(status) => EndpointState::from_platform_status(status.as_deref()),
        Err(e) => {
            tracing::warn!(error=%e, "initial endpoint status unavailable");
            EndpointState::Absent
        }
    };
    let trigger = Arc::new(IntervalTrigger::new(initial != EndpointState::Absent));

    let controller = EndpointController::new(
        platform,
        trigger.clone(),
        tracker.clone(),
        clock.clone(),
        metrics.clone(),
        ControllerConfig {
            endpoint_name: args.endpoint_name.clone(),
            endpoint_config_name: args.endpoint_config_name.clone(),
            idle_threshold_minutes: args.idle_threshold_minutes,
        },
    );
    let proxy = PredictionProxy::new(
        inference,
        tracker,
        clock,
        metrics.clone(),
        args.endpoint_name.clone(),
        Duration::from_secs(args.prediction_deadline_secs),
    );
    let handler = Arc::new(Handler::new(controller, proxy, metrics, args.premise.clone()));

    tokio::spawn(
        trigger.run(Duration::from_secs(args.check_interval_secs), Arc::downgrade(&handler)),
    );

    tracing::info!(
        listen_addr=%args.listen_addr,
        endpoint=%args.endpoint_name,
        platform=?args.platform,
        initial_state=%initial,
        "entail-web starting"
    );

    let app = entail_web::routes::router(AppState { handler });

    let listener = tokio::net::TcpListener::bind(&args.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    entail_common::telemetry::shutdown_tracing(otel);
    Ok(())
}
