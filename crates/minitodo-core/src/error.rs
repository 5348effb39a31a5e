/// Caller supplied a value outside the accepted domain. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("task text must not be empty")]
    EmptyText,
    #[error("invalid priority: {0:?} (expected low, medium or high)")]
    InvalidPriority(String),
    #[error("invalid status filter: {0:?} (expected all, open or done)")]
    InvalidStatusFilter(String),
    #[error("invalid priority filter: {0:?} (expected all, low, medium or high)")]
    InvalidPriorityFilter(String),
    #[error("no task matches id {0:?}")]
    UnknownTask(String),
    #[error("id {0:?} matches more than one task")]
    AmbiguousTask(String),
}

impl ValidationError {
    /// Message meant for the person in front of the view layer.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::EmptyText => "Bitte gib eine Aufgabe ein.".to_string(),
            ValidationError::InvalidPriority(value) => {
                format!("Unbekannte Priorität: {value}")
            }
            ValidationError::InvalidStatusFilter(value)
            | ValidationError::InvalidPriorityFilter(value) => {
                format!("Unbekannter Filter: {value}")
            }
            ValidationError::UnknownTask(id) => format!("Keine Aufgabe mit ID {id}"),
            ValidationError::AmbiguousTask(id) => format!("ID {id} ist nicht eindeutig"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend failed to write `key`. The in-memory state still holds
    /// the mutation that preceded the write.
    #[error("failed to persist {key}")]
    Persistence {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CoreError {
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            CoreError::Validation(err) => Some(err),
            CoreError::Persistence { .. } => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
