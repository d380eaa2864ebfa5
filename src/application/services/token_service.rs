//! Access Token Service
//!
//! Issues and validates the JWT access tokens. Refresh tokens are opaque
//! random strings handled by the auth service.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::domain::User;
use crate::shared::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// JWT ID
    pub jti: String,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// User's security stamp at issuance. A mismatch revokes the token.
    pub security_stamp: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))
    }
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Signs and verifies access tokens with the configured HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());
        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    pub fn issue(
        &self,
        user: &User,
        roles: Vec<String>,
        permissions: Vec<String>,
    ) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let lifetime = Duration::minutes(self.settings.expires_in_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            security_stamp: user.security_stamp.clone(),
            roles,
            permissions,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Check signature, expiry, issuer and audience.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired".into())
                }
                _ => AppError::Unauthorized("Invalid token".into()),
            })
    }

    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::days(self.settings.refresh_token_expires_in_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;

    fn service() -> TokenService {
        TokenService::new(test_settings().auth.jwt)
    }

    #[test]
    fn test_issue_then_validate() {
        let service = service();
        let user = User::new("ada@example.com", None);

        let issued = service
            .issue(&user, vec!["Admin".into()], vec!["users.view".into()])
            .unwrap();
        assert_eq!(issued.expires_in, 600);

        let claims = service.validate(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.security_stamp, user.security_stamp);
        assert_eq!(claims.roles, vec!["Admin".to_string()]);
        assert_eq!(claims.iss, "netrock");
        assert_eq!(claims.aud, "netrock-frontend");
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let mut other = test_settings().auth.jwt;
        other.audience = "someone-else".into();
        let foreign = TokenService::new(other);
        let user = User::new("ada@example.com", None);

        let issued = foreign.issue(&user, vec![], vec![]).unwrap();
        assert!(matches!(
            service().validate(&issued.token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let user = User::new("ada@example.com", None);
        let issued = service.issue(&user, vec![], vec![]).unwrap();

        let tampered = format!("{}x", issued.token);
        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn test_refresh_lifetime() {
        assert_eq!(service().refresh_token_lifetime(), Duration::days(7));
    }
}
