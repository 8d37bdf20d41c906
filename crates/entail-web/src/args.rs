use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformKind {
    /// Managed hosting service with a REST control plane.
    Managed,
    /// Always-on model server at `--runtime-url`.
    Static,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Textual-entailment demo front end")]
pub struct Args {
    #[arg(long, env = "ENTAIL_WEB_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// etcd endpoint for the shared invocation record. Without it the record
    /// lives in process memory.
    #[arg(long, env = "ETCD_ENDPOINT")]
    pub etcd_endpoint: Option<String>,

    #[arg(long, env = "ENTAIL_PROJECT_ID", default_value = entail_common::DEFAULT_PROJECT_ID)]
    pub project_id: String,

    #[arg(long, env = "ENTAIL_PLATFORM", value_enum, default_value_t = PlatformKind::Managed)]
    pub platform: PlatformKind,

    #[arg(long, env = "ENTAIL_CONTROL_URL", default_value = "http://127.0.0.1:9000")]
    pub control_url: String,

    #[arg(long, env = "ENTAIL_RUNTIME_URL", default_value = "http://127.0.0.1:8081")]
    pub runtime_url: String,

    #[arg(long, env = "ENTAIL_ENDPOINT_NAME", default_value = "textual-entailment-endpoint")]
    pub endpoint_name: String,

    #[arg(
        long,
        env = "ENTAIL_ENDPOINT_CONFIG_NAME",
        default_value = "textual-entailment-endpoint-configuration"
    )]
    pub endpoint_config_name: String,

    /// Minutes without predictions before an in-service endpoint is deleted.
    #[arg(long, env = "ENTAIL_IDLE_MINUTES", default_value_t = 40.0)]
    pub idle_threshold_minutes: f64,

    /// Minimum minutes between writes of the shared invocation record.
    #[arg(long, env = "ENTAIL_STORE_WRITE_MINUTES", default_value_t = 5.0)]
    pub store_write_interval_minutes: f64,

    #[arg(long, env = "ENTAIL_PREDICTION_DEADLINE_SECS", default_value_t = 10)]
    pub prediction_deadline_secs: u64,

    /// How often the status trigger fires while enabled.
    #[arg(long, env = "ENTAIL_CHECK_INTERVAL_SECS", default_value_t = 600)]
    pub check_interval_secs: u64,

    #[arg(long, env = "ENTAIL_LOCAL_LOG_PATH", default_value = "/tmp/last_invocation.jsonl")]
    pub local_log_path: String,

    #[arg(long, env = "ENTAIL_PREMISE", default_value = entail_web::pages::DEFAULT_PREMISE)]
    pub premise: String,

    /// OTLP endpoint for exporting traces.
    #[arg(long, env = "OTLP_URL")]
    pub otlp_url: Option<String>,

    /// Bearer token for the OTLP collector.
    #[arg(long, env = "OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}
