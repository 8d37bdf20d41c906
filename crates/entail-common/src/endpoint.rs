use serde::{Deserialize, Serialize};

/// Lifecycle state of the managed inference endpoint, derived from the
/// platform's live status string on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointState {
    Absent,
    Creating,
    InService,
    Other(String),
}

impl EndpointState {
    /// `None` means the platform has no endpoint by that name.
    pub fn from_platform_status(status: Option<&str>) -> Self {
        match status {
            None => EndpointState::Absent,
            Some("Creating") => EndpointState::Creating,
            Some("InService") => EndpointState::InService,
            Some(other) => EndpointState::Other(other.to_string()),
        }
    }

    pub fn is_in_service(&self) -> bool {
        matches!(self, EndpointState::InService)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EndpointState::Absent => "Absent",
            EndpointState::Creating => "Creating",
            EndpointState::InService => "InService",
            EndpointState::Other(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for EndpointState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
