use std::sync::Arc;

use crate::metrics::Metrics;
use crate::predictor::Predictor;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the model failed to load; `/ping` reports it.
    pub predictor: Option<Arc<Predictor>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(predictor: Option<Predictor>) -> Self {
        Self {
            predictor: predictor.map(Arc::new),
            metrics: Arc::new(Metrics::default()),
        }
    }
}
