pub mod handlers;
pub mod metrics;
pub mod model;
pub mod predictor;
pub mod state;
pub mod tokenizer;

pub use model::{BagOfEmbeddings, EntailmentModel, ModelError};
pub use predictor::{Prediction, Predictor};
pub use state::AppState;
pub use tokenizer::SentenceTokenizer;
