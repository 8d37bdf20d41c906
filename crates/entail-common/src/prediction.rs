use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub premise: String,
    pub hypothesis: String,
    pub expected_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request body is missing")]
    MissingBody,
    #[error("malformed prediction request: {0}")]
    Malformed(String),
}

/// The UI posts each field as a one-row column (`{"0": "..."}`).
#[derive(Debug, Deserialize)]
struct Column {
    #[serde(rename = "0")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    hypothesis: Column,
    premise: Column,
    task: Column,
}

impl PredictionRequest {
    pub fn from_body(body: Option<&str>) -> Result<Self, RequestError> {
        let raw = match body {
            Some(b) if !b.trim().is_empty() => b,
            _ => return Err(RequestError::MissingBody),
        };
        let parsed: PredictionBody =
            serde_json::from_str(raw).map_err(|e| RequestError::Malformed(e.to_string()))?;
        Ok(Self {
            premise: parsed.premise.value,
            hypothesis: parsed.hypothesis.value,
            expected_label: parsed.task.value,
        })
    }

    /// Payload shape the inference endpoint expects.
    pub fn endpoint_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "sentence1": self.premise,
            "sentence2": self.hypothesis,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuccessStatus {
    Success,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "jsonFeedback")]
    pub raw_label_text: String,
    #[serde(rename = "successStatus")]
    pub success_status: SuccessStatus,
}

impl PredictionResult {
    /// Success iff the expected label occurs literally anywhere in the raw
    /// endpoint text. The text is not parsed.
    pub fn classify(raw_label_text: String, expected_label: &str) -> Self {
        let success_status = if !expected_label.is_empty() && raw_label_text.contains(expected_label)
        {
            SuccessStatus::Success
        } else {
            SuccessStatus::Fail
        };
        Self {
            raw_label_text,
            success_status,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            raw_label_text: message.into(),
            success_status: SuccessStatus::Fail,
        }
    }
}
