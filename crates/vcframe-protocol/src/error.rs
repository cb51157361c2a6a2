use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("stored frame too large: {size} bytes (max {max})")]
    StoredFrameTooLarge { size: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),
}
