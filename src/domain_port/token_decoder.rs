use crate::domain_model::DecodedClaims;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("expiry out of range: {0}")]
    ExpiryOutOfRange(f64),
}

/// Pure token payload decoder. No signature checks, no clock.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<DecodedClaims, DecodeError>;
}
