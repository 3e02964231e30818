use super::ActiveEffectHandle;
use crate::error::{EffectsError, ErrorSeverity};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("active effect handles exhausted after {last}")]
    HandleExhausted { last: ActiveEffectHandle },
}

impl EffectsError for ContainerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::HandleExhausted { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::HandleExhausted { .. } => "CONTAINER_HANDLE_EXHAUSTED",
        }
    }
}
