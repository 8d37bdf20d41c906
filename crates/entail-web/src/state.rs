use std::sync::Arc;

use crate::handler::Handler;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<Handler>,
}
