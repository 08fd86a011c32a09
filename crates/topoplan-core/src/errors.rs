use thiserror::Error;

/// Planning errors - derivation is pure, so nothing here wraps I/O
#[derive(Error, Debug)]
pub enum PlanError {
    /// Invalid deployment input. Raised before any plan entity is emitted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Two tenants ended up with the same routing priority. This is a planner
    /// defect, never a user input problem.
    #[error(
        "Priority collision: tenant '{tenant}' was assigned priority {priority} \
         already held by '{holder}' (counter at {counter})"
    )]
    PriorityCollision {
        tenant: String,
        priority: u32,
        holder: String,
        counter: u32,
    },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PlanError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PlanError::Configuration(message.into())
    }

    /// True for errors caused by the caller's input rather than a planner defect
    pub fn is_configuration(&self) -> bool {
        matches!(self, PlanError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
