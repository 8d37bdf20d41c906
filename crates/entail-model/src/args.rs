use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about = "Textual-entailment model server")]
pub struct Args {
    #[arg(long, env = "ENTAIL_MODEL_ADDR", default_value = "0.0.0.0:8081")]
    pub listen_addr: String,

    /// Directory holding `tokenizer.json` (or `inputs_vocab.json`) and
    /// `model.safetensors`.
    #[arg(long, env = "ENTAIL_MODEL_DIR", default_value = "/opt/ml/model")]
    pub model_dir: String,

    /// OTLP endpoint for exporting traces.
    #[arg(long, env = "OTLP_URL")]
    pub otlp_url: Option<String>,

    /// Bearer token for the OTLP collector.
    #[arg(long, env = "OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}
