use serde::{Deserialize, Serialize};

/// Output classes of the natural-language-inference model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Entailment,
    Contradiction,
    Neutral,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Entailment, Label::Contradiction, Label::Neutral];

    /// Maps the model's answer-vocabulary index to a label. Index 0 is the
    /// answer vocabulary's unknown token and has no label.
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            1 => Some(Label::Entailment),
            2 => Some(Label::Contradiction),
            3 => Some(Label::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Entailment => "Entailment",
            Label::Contradiction => "Contradiction",
            Label::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
