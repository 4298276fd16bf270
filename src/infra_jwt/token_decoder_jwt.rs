use crate::domain_model::DecodedClaims;
use crate::domain_port::{DecodeError, TokenDecoder};
use chrono::DateTime;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    // NumericDate allows fractional seconds.
    exp: f64,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
///
/// A client holds no verification key; it only needs to know when the server
/// will stop accepting the token.
pub struct JwtExpiryDecoder {
    validation: Validation,
    key: DecodingKey,
}

impl JwtExpiryDecoder {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);
        Self {
            validation,
            key: DecodingKey::from_secret(&[]),
        }
    }
}

impl Default for JwtExpiryDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenDecoder for JwtExpiryDecoder {
    fn decode(&self, token: &str) -> Result<DecodedClaims, DecodeError> {
        let data = decode::<ExpiryClaims>(token, &self.key, &self.validation)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let exp = data.claims.exp;
        let secs = exp.floor();
        if !secs.is_finite() {
            return Err(DecodeError::ExpiryOutOfRange(exp));
        }
        // Saturates on overflow, which `from_timestamp` then rejects.
        let expires_at =
            DateTime::from_timestamp(secs as i64, 0).ok_or(DecodeError::ExpiryOutOfRange(exp))?;
        Ok(DecodedClaims { expires_at })
    }
}
