use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    pub requests_total: AtomicU64,
    pub requests_inflight: AtomicU64,
    pub status_2xx: AtomicU64,
    pub status_4xx: AtomicU64,
    pub status_5xx: AtomicU64,

    pub predictions_total: AtomicU64,
    pub prediction_success_total: AtomicU64,
    pub prediction_timeouts_total: AtomicU64,
    pub prediction_errors_total: AtomicU64,
    pub status_checks_total: AtomicU64,
    pub endpoint_creates_total: AtomicU64,
    pub endpoint_deletes_total: AtomicU64,
}

impl Metrics {
    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status(&self, status: u16) {
        if status >= 500 {
            self.inc(&self.status_5xx);
        } else if status >= 400 {
            self.inc(&self.status_4xx);
        } else if status >= 200 {
            self.inc(&self.status_2xx);
        }
    }

    /// Prometheus text exposition.
    pub fn render(&self) -> String {
        let counters: [(&str, &AtomicU64); 12] = [
            ("entail_web_requests_total", &self.requests_total),
            ("entail_web_requests_inflight", &self.requests_inflight),
            ("entail_web_responses_2xx", &self.status_2xx),
            ("entail_web_responses_4xx", &self.status_4xx),
            ("entail_web_responses_5xx", &self.status_5xx),
            ("entail_web_predictions_total", &self.predictions_total),
            ("entail_web_prediction_success_total", &self.prediction_success_total),
            ("entail_web_prediction_timeouts_total", &self.prediction_timeouts_total),
            ("entail_web_prediction_errors_total", &self.prediction_errors_total),
            ("entail_web_status_checks_total", &self.status_checks_total),
            ("entail_web_endpoint_creates_total", &self.endpoint_creates_total),
            ("entail_web_endpoint_deletes_total", &self.endpoint_deletes_total),
        ];
        let mut out = String::new();
        for (name, value) in counters {
            out.push_str(name);
            out.push(' ');
            out.push_str(&value.load(Ordering::Relaxed).to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_buckets() {
        let m = Metrics::default();
        m.record_status(200);
        m.record_status(405);
        m.record_status(502);
        let text = m.render();
        assert!(text.contains("entail_web_responses_2xx 1\n"));
        assert!(text.contains("entail_web_responses_4xx 1\n"));
        assert!(text.contains("entail_web_responses_5xx 1\n"));
    }
}
