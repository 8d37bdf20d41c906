use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    pub invocations_total: AtomicU64,
    pub invocation_errors_total: AtomicU64,
    pub pings_total: AtomicU64,
}

impl Metrics {
    pub fn render(&self) -> String {
        format!(
            "entail_model_invocations_total {}\nentail_model_invocation_errors_total {}\nentail_model_pings_total {}\n",
            self.invocations_total.load(Ordering::Relaxed),
            self.invocation_errors_total.load(Ordering::Relaxed),
            self.pings_total.load(Ordering::Relaxed),
        )
    }
}
