use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Challenge already completed")]
    AlreadyCompleted,

    #[error("{0}")]
    InvalidInput(String),

    #[error("store lock poisoned")]
    Poisoned,
}
