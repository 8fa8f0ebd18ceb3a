use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("endpoint table must contain at least one model")]
    EmptyEndpointTable,

    #[error("unknown mode: {0}")]
    UnknownMode(String),
}
