use std::path::Path;

use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{Embedding, Linear, VarBuilder};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to load model: {0}")]
    Load(String),
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("failed to tokenize input: {0}")]
    Tokenize(String),
    #[error("model predicted class {0}, which has no label")]
    UnknownClass(usize),
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

/// A natural-language-inference classifier over token indices.
pub trait EntailmentModel: Send + Sync {
    fn vocab_size(&self) -> usize;

    /// Log-probabilities over the answer classes for a single example,
    /// shape `(classes,)`.
    fn forward(&self, premise: &[u32], hypothesis: &[u32]) -> Result<Tensor, ModelError>;
}

/// Sentence encoder that averages token embeddings, followed by a linear
/// classifier over `[p, h, |p - h|, p * h]`.
pub struct BagOfEmbeddings {
    embedding: Embedding,
    classifier: Linear,
    vocab_size: usize,
    dim: usize,
    device: Device,
}

impl BagOfEmbeddings {
    /// `embedding` is `(vocab, dim)`, `weight` is `(classes, 4 * dim)` and
    /// `bias` is `(classes,)`.
    pub fn new(embedding: Tensor, weight: Tensor, bias: Tensor) -> Result<Self, ModelError> {
        let (vocab_size, dim) = embedding.dims2()?;
        let (classes, features) = weight.dims2()?;
        if vocab_size == 0 || dim == 0 {
            return Err(ModelError::Shape("embedding table is empty".to_string()));
        }
        if classes == 0 || features != 4 * dim {
            return Err(ModelError::Shape(format!(
                "linear weight is {classes}x{features}, expected Cx{}",
                4 * dim
            )));
        }
        if bias.dims1()? != classes {
            return Err(ModelError::Shape(format!(
                "linear bias has {} entries for {classes} classes",
                bias.dims1()?
            )));
        }
        let device = embedding.device().clone();
        Ok(Self {
            embedding: Embedding::new(embedding, dim),
            classifier: Linear::new(weight, Some(bias)),
            vocab_size,
            dim,
            device,
        })
    }

    /// Loads `embedding.weight`, `linear.weight` and `linear.bias` from a
    /// safetensors file.
    pub fn load(path: &Path, device: &Device) -> Result<Self, ModelError> {
        let tensors = candle_core::safetensors::load(path, device)
            .map_err(|e| ModelError::Load(format!("{}: {e}", path.display())))?;
        let dims = |name: &str| {
            tensors
                .get(name)
                .map(|t| t.dims().to_vec())
                .ok_or_else(|| ModelError::Load(format!("{}: missing tensor {name}", path.display())))
        };
        let (vocab_size, dim) = match dims("embedding.weight")?[..] {
            [v, d] if v > 0 && d > 0 => (v, d),
            ref other => {
                return Err(ModelError::Shape(format!("embedding.weight has shape {other:?}")))
            }
        };
        let classes = match dims("linear.bias")?[..] {
            [c] if c > 0 => c,
            ref other => return Err(ModelError::Shape(format!("linear.bias has shape {other:?}"))),
        };

        let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
        let embedding = candle_nn::embedding(vocab_size, dim, vb.pp("embedding"))?;
        let classifier = candle_nn::linear(4 * dim, classes, vb.pp("linear"))?;
        Ok(Self {
            embedding,
            classifier,
            vocab_size,
            dim,
            device: device.clone(),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Mean embedding; the zero vector for an empty sentence.
    fn encode(&self, ids: &[u32]) -> Result<Tensor, ModelError> {
        if ids.is_empty() {
            return Ok(Tensor::zeros(self.dim, DType::F32, &self.device)?);
        }
        if let Some(&t) = ids.iter().find(|&&t| t as usize >= self.vocab_size) {
            return Err(ModelError::Shape(format!(
                "token {t} outside embedding table of {}",
                self.vocab_size
            )));
        }
        let ids = Tensor::new(ids, &self.device)?;
        Ok(self.embedding.forward(&ids)?.mean(0)?)
    }
}

impl EntailmentModel for BagOfEmbeddings {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn forward(&self, premise: &[u32], hypothesis: &[u32]) -> Result<Tensor, ModelError> {
        let p = self.encode(premise)?;
        let h = self.encode(hypothesis)?;
        let diff = p.sub(&h)?.abs()?;
        let prod = p.mul(&h)?;

        let features = Tensor::cat(&[&p, &h, &diff, &prod], 0)?.unsqueeze(0)?;
        let logits = self.classifier.forward(&features)?;
        Ok(candle_nn::ops::log_softmax(&logits, D::Minus1)?.squeeze(0)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn tensor(values: &[f32], rows: usize, cols: usize) -> Tensor {
        Tensor::from_vec(values.to_vec(), (rows, cols), &Device::Cpu).unwrap()
    }

    pub(crate) fn vector(values: &[f32]) -> Tensor {
        Tensor::new(values, &Device::Cpu).unwrap()
    }

    fn three_class_model() -> BagOfEmbeddings {
        BagOfEmbeddings::new(
            tensor(&[0.0, 1.0], 2, 1),
            tensor(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3, 4),
            vector(&[0.0, 0.0, 0.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_forward_is_normalized_log_probabilities() {
        let out = three_class_model().forward(&[1], &[0]).unwrap();
        assert_eq!(out.dims(), &[3]);
        let total: f32 = out.exp().unwrap().sum_all().unwrap().to_scalar().unwrap();
        assert!((total - 1.0).abs() < 1e-5);

        // p = 1, h = 0: logits [p, h, |p - h|] = [1, 0, 1]
        let out: Vec<f32> = out.to_vec1().unwrap();
        assert!((out[0] - out[2]).abs() < 1e-6);
        assert!(out[0] > out[1]);
    }

    #[test]
    fn test_empty_sentence_encodes_to_zero() {
        let out: Vec<f32> = three_class_model().forward(&[], &[]).unwrap().to_vec1().unwrap();
        let uniform = (1.0f32 / 3.0).ln();
        assert!(out.iter().all(|x| (x - uniform).abs() < 1e-6));
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let err = BagOfEmbeddings::new(
            tensor(&[0.0], 1, 1),
            tensor(&[0.0; 3], 1, 3),
            vector(&[0.0]),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ModelError::Shape(_)));

        let err = BagOfEmbeddings::new(
            tensor(&[0.0], 1, 1),
            tensor(&[0.0; 4], 1, 4),
            vector(&[0.0, 0.0]),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ModelError::Shape(_)));
    }

    #[test]
    fn test_forward_rejects_out_of_range_token() {
        assert!(matches!(
            three_class_model().forward(&[0], &[7]),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn test_load_from_safetensors() {
        let dir = std::env::temp_dir().join(format!("entail-weights-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.safetensors");

        let tensors = HashMap::from([
            ("embedding.weight".to_string(), tensor(&[0.0, 1.0], 2, 1)),
            ("linear.weight".to_string(), tensor(&[0.0, 0.0, 1.0, 0.0], 1, 4)),
            ("linear.bias".to_string(), vector(&[0.5])),
        ]);
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let model = BagOfEmbeddings::load(&path, &Device::Cpu).unwrap();
        assert_eq!(model.vocab_size(), 2);
        assert_eq!(model.dim(), 1);
        let out: Vec<f32> = model.forward(&[1], &[0]).unwrap().to_vec1().unwrap();
        assert_eq!(out, vec![0.0]);

        let bad = HashMap::from([
            ("embedding.weight".to_string(), tensor(&[0.0, 1.0], 2, 1)),
            ("linear.weight".to_string(), tensor(&[0.0, 0.0, 1.0], 1, 3)),
            ("linear.bias".to_string(), vector(&[0.5])),
        ]);
        candle_core::safetensors::save(&bad, &path).unwrap();
        assert!(BagOfEmbeddings::load(&path, &Device::Cpu).is_err());

        assert!(matches!(
            BagOfEmbeddings::load(&dir.join("missing.safetensors"), &Device::Cpu),
            Err(ModelError::Load(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
