use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown gender code {0}")]
    UnknownGender(i64),
    #[error("unknown gender '{0}'")]
    UnknownGenderLabel(String),
    #[error("weight {0} is outside the allowed range")]
    WeightOutOfRange(i64),
    #[error("malformed pet uri '{0}'")]
    MalformedUri(String),
}
