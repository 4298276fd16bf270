use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl RefreshToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Access and refresh credentials as held by one session.
///
/// Either side may be absent. An absent refresh token in a pair that is being
/// saved means "keep whatever is stored", not "remove it".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
}

impl CredentialPair {
    /// Builds a pair from a server reply. Empty strings count as absent, so a
    /// reply carrying `refreshToken: ""` does not rotate the refresh token.
    pub fn issued(access_token: AccessToken, refresh_token: Option<RefreshToken>) -> Self {
        Self {
            access_token: Some(access_token).filter(|t| !t.0.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.0.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Overlays the present fields of `update` onto `self`.
    pub fn merge(&mut self, update: CredentialPair) {
        if let Some(access_token) = update.access_token {
            self.access_token = Some(access_token);
        }
        if let Some(refresh_token) = update.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
    }
}

/// Claims read out of a token payload. Recomputed on every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedClaims {
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_treats_empty_refresh_as_absent() {
        let pair = CredentialPair::issued(
            AccessToken("a".to_string()),
            Some(RefreshToken(String::new())),
        );
        assert_eq!(pair.access_token, Some(AccessToken("a".to_string())));
        assert_eq!(pair.refresh_token, None);
    }

    #[test]
    fn merge_keeps_refresh_when_update_omits_it() {
        let mut pair = CredentialPair::issued(
            AccessToken("a1".to_string()),
            Some(RefreshToken("r1".to_string())),
        );
        pair.merge(CredentialPair::issued(AccessToken("a2".to_string()), None));
        assert_eq!(pair.access_token, Some(AccessToken("a2".to_string())));
        assert_eq!(pair.refresh_token, Some(RefreshToken("r1".to_string())));
    }
}
