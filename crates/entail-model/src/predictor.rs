use std::path::Path;
use std::sync::Arc;

use candle_core::{Device, D};
use serde::{Deserialize, Serialize};

use entail_common::Label;

use crate::model::{BagOfEmbeddings, EntailmentModel, ModelError};
use crate::tokenizer::SentenceTokenizer;

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE: &str = "inputs_vocab.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Debug, Clone, Deserialize)]
pub struct InvocationRequest {
    pub sentence1: String,
    pub sentence2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Confidence of `label`, e.g. `"97.53%"`.
    pub probability: String,
}

/// Tokenizer plus model: raw sentence pair in, labelled prediction out.
pub struct Predictor {
    tokenizer: SentenceTokenizer,
    model: Arc<dyn EntailmentModel>,
}

impl Predictor {
    pub fn new(
        tokenizer: SentenceTokenizer,
        model: Arc<dyn EntailmentModel>,
    ) -> Result<Self, ModelError> {
        if tokenizer.vocab_size() != model.vocab_size() {
            return Err(ModelError::Shape(format!(
                "vocabulary has {} tokens but the model embeds {}",
                tokenizer.vocab_size(),
                model.vocab_size()
            )));
        }
        Ok(Self { tokenizer, model })
    }

    /// Loads the tokenizer (`tokenizer.json`, or `inputs_vocab.json`) and
    /// `model.safetensors` from `model_dir`, on the CPU.
    pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
        let tokenizer = SentenceTokenizer::load(
            &model_dir.join(TOKENIZER_FILE),
            &model_dir.join(VOCAB_FILE),
        )?;
        let model = BagOfEmbeddings::load(&model_dir.join(WEIGHTS_FILE), &Device::Cpu)?;
        Self::new(tokenizer, Arc::new(model))
    }

    pub fn predict(&self, premise: &str, hypothesis: &str) -> Result<Prediction, ModelError> {
        let p = self.tokenizer.encode(premise)?;
        let h = self.tokenizer.encode(hypothesis)?;
        let log_probs = self.model.forward(&p, &h)?;

        let class = log_probs.argmax(D::Minus1)?.to_scalar::<u32>()? as usize;
        let label = Label::from_class_index(class).ok_or(ModelError::UnknownClass(class))?;
        let confidence = log_probs.get(class)?.exp()?.to_scalar::<f32>()?;
        Ok(Prediction {
            label,
            probability: format_percent(confidence),
        })
    }
}

fn format_percent(p: f32) -> String {
    format!("{:.2}%", p * 100.0)
}
