use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;
use tokenizers::Tokenizer;

use crate::model::ModelError;

pub const UNK_TOKEN: &str = "<unk>";

/// Word-level segmentation after lowercasing, following spaCy's English
/// rules for the cases the training data exercises: abbreviations (`u.s.`)
/// and decimals (`3.5`) stay whole, `n't` and `'s`-style clitics split off,
/// and every other punctuation mark stands alone.
const SPLIT_PATTERN: &str =
    r"(?:[a-z]\.){2,}|\d+(?:[.,]\d+)+|\w+(?=n't\b)|n't|'(?:s|m|d|ll|ve|re)\b|\w+|\.{3}|[^\w\s]";

/// Input-side tokenizer: maps raw sentences to embedding row indices.
pub struct SentenceTokenizer {
    inner: Tokenizer,
}

#[derive(Deserialize)]
struct VocabularyFile {
    itos: Vec<String>,
}

impl SentenceTokenizer {
    pub fn new(inner: Tokenizer) -> Self {
        Self { inner }
    }

    /// Builds the word-level tokenizer for a training-time vocabulary.
    /// `itos[0]` must be `<unk>`; unknown tokens map to it.
    pub fn from_itos(itos: &[String]) -> Result<Self, ModelError> {
        if itos.first().map(String::as_str) != Some(UNK_TOKEN) {
            return Err(ModelError::Load(format!(
                "vocabulary must start with {UNK_TOKEN}"
            )));
        }
        let mut vocab = serde_json::Map::with_capacity(itos.len());
        for (i, token) in itos.iter().enumerate() {
            if vocab.insert(token.clone(), json!(i)).is_some() {
                return Err(ModelError::Load(format!("duplicate vocabulary entry {token:?}")));
            }
        }

        let config = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": {"type": "Lowercase"},
            "pre_tokenizer": {
                "type": "Sequence",
                "pretokenizers": [
                    {"type": "WhitespaceSplit"},
                    {
                        "type": "Split",
                        "pattern": {"Regex": SPLIT_PATTERN},
                        "behavior": "Isolated",
                        "invert": false
                    }
                ]
            },
            "post_processor": null,
            "decoder": null,
            "model": {"type": "WordLevel", "vocab": vocab, "unk_token": UNK_TOKEN}
        });
        let inner = Tokenizer::from_str(&config.to_string())
            .map_err(|e| ModelError::Load(format!("tokenizer: {e}")))?;
        Ok(Self::new(inner))
    }

    /// Prefers a serialized `tokenizer.json`; falls back to the bare
    /// `{"itos": [...]}` vocabulary written at training time.
    pub fn load(tokenizer_file: &Path, vocab_file: &Path) -> Result<Self, ModelError> {
        if tokenizer_file.exists() {
            let inner = Tokenizer::from_file(tokenizer_file)
                .map_err(|e| ModelError::Load(format!("{}: {e}", tokenizer_file.display())))?;
            return Ok(Self::new(inner));
        }
        let raw = std::fs::read_to_string(vocab_file)
            .map_err(|e| ModelError::Load(format!("{}: {e}", vocab_file.display())))?;
        let file: VocabularyFile = serde_json::from_str(&raw)
            .map_err(|e| ModelError::Load(format!("{}: {e}", vocab_file.display())))?;
        Self::from_itos(&file.itos)
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u32>, ModelError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| ModelError::Tokenize(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        self.inner
            .save(path, false)
            .map_err(|e| ModelError::Load(format!("{}: {e}", path.display())))
    }
}
