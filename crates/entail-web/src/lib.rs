pub mod controller;
pub mod event;
pub mod handler;
pub mod invocation;
pub mod metrics;
pub mod pages;
pub mod platform;
pub mod predict;
pub mod routes;
pub mod state;
pub mod trigger;

pub use controller::{ControllerConfig, EndpointController, IdleCheckOutcome};
pub use event::{HandlerEvent, HandlerResponse};
pub use handler::Handler;
pub use invocation::{InvocationStore, InvocationTracker, LocalInvocationFile, LocalInvocationLog};
pub use metrics::Metrics;
pub use platform::{
    EndpointPlatform, InferenceClient, ManagedPlatform, MemoryEndpointPlatform, StaticEndpoint,
};
pub use predict::{PredictError, PredictionProxy};
pub use state::AppState;
pub use trigger::{IntervalTrigger, StatusTrigger};
