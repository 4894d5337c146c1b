use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] crate::input::InputError),
    #[error("state lock poisoned")]
    StateLock,
}
