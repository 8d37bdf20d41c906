pub mod clock;
pub mod endpoint;
pub mod invocation;
pub mod label;
pub mod prediction;
pub mod telemetry;
pub mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use endpoint::EndpointState;
pub use invocation::{InvocationRecord, DEFAULT_PROJECT_ID};
pub use label::Label;
pub use prediction::{PredictionRequest, PredictionResult, RequestError, SuccessStatus};
pub use timestamp::{format_timestamp, minutes_between, parse_timestamp, TimestampError};
