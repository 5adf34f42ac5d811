use crate::domain::config::JwtConfig;
use crate::domain::roles::RoleSet;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

const MIN_SECRET_LEN: usize = 16;

#[rollcall_derive::rollcall_error]
pub enum SessionError {
    /// Token signing failed.
    #[code(Internal)]
    #[error("Session encoding error{}: {source}", format_context(.context))]
    Encode { source: jsonwebtoken::errors::Error, context: Option<Cow<'static, str>> },

    /// Missing, malformed, expired or forged bearer token.
    #[code(Unauthorized)]
    #[error("Invalid session{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Session configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// JWT claims of a session token. `roles` is a snapshot taken when the token was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub roles: RoleSet,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed bearer token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_seconds: i64,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl SessionTokens {
    /// # Errors
    /// Returns [`SessionError::Config`] for a short secret, an empty issuer or a zero TTL.
    pub fn new(config: &JwtConfig) -> Result<Self, SessionError> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::Config {
                message: format!("secret must be at least {MIN_SECRET_LEN} bytes").into(),
                context: Some("security.jwt.secret".into()),
            });
        }
        if config.issuer.trim().is_empty() {
            return Err(SessionError::Config {
                message: "issuer cannot be empty".into(),
                context: Some("security.jwt.issuer".into()),
            });
        }
        let ttl_seconds = i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX);
        if ttl_seconds == 0 {
            return Err(SessionError::Config {
                message: "ttl must be positive".into(),
                context: Some("security.jwt.ttl_seconds".into()),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = config.clock_skew_seconds;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            ttl_seconds,
        })
    }

    /// Signs a token for `user_id` valid from `now` (Unix seconds).
    pub fn issue_at(
        &self,
        user_id: &str,
        email: &str,
        roles: RoleSet,
        now: i64,
    ) -> Result<IssuedSession, SessionError> {
        let claims = SessionClaims {
            sub: user_id.to_owned(),
            email: email.to_owned(),
            roles,
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Signing session token")?;
        Ok(IssuedSession { token, expires_at: claims.exp })
    }

    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        roles: RoleSet,
    ) -> Result<IssuedSession, SessionError> {
        self.issue_at(user_id, email, roles, chrono::Utc::now().timestamp())
    }

    /// Verifies signature, issuer and expiry (with leeway) and returns the claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| SessionError::Invalid {
                message: e.to_string().into(),
                context: Some("Verifying bearer token".into()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> SessionTokens {
        SessionTokens::new(&JwtConfig {
            secret: "a-test-secret-of-enough-length".to_owned(),
            ..JwtConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn issued_token_verifies_and_keeps_role_snapshot() {
        let tokens = tokens();
        let roles = RoleSet::STUDENT | RoleSet::PROFESSOR;
        let issued = tokens.issue("u1", "ada@example.edu", roles).unwrap();

        let claims = tokens.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ada@example.edu");
        assert_eq!(claims.roles, roles);
        assert_eq!(claims.iss, "rollcall");
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = tokens();
        let long_ago = chrono::Utc::now().timestamp() - 7 * 24 * 3600;
        let issued = tokens.issue_at("u1", "a@b.c", RoleSet::STUDENT, long_ago).unwrap();
        assert!(matches!(tokens.verify(&issued.token), Err(SessionError::Invalid { .. })));
    }

    #[test]
    fn foreign_secret_and_issuer_are_rejected() {
        let issued = tokens().issue("u1", "a@b.c", RoleSet::ADMIN).unwrap();

        let other_secret = SessionTokens::new(&JwtConfig {
            secret: "another-secret-entirely-here".to_owned(),
            ..JwtConfig::default()
        })
        .unwrap();
        assert!(other_secret.verify(&issued.token).is_err());

        let other_issuer = SessionTokens::new(&JwtConfig {
            secret: "a-test-secret-of-enough-length".to_owned(),
            issuer: "elsewhere".to_owned(),
            ..JwtConfig::default()
        })
        .unwrap();
        assert!(other_issuer.verify(&issued.token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(tokens().verify("not-a-jwt").is_err());
    }

    #[test]
    fn weak_configuration_is_refused() {
        let short = JwtConfig { secret: "short".to_owned(), ..JwtConfig::default() };
        assert!(matches!(SessionTokens::new(&short), Err(SessionError::Config { .. })));

        let no_ttl = JwtConfig { ttl_seconds: 0, ..JwtConfig::default() };
        assert!(matches!(SessionTokens::new(&no_ttl), Err(SessionError::Config { .. })));
    }
}
