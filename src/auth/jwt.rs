use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity};
use crate::config::JwtConfig;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// HMAC-SHA256 signing material. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn issue(&self, who: &Identity) -> anyhow::Result<String> {
        self.issue_at(who, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, who: &Identity, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            id: who.id,
            email: who.email.clone(),
            name: who.name.clone(),
            role: who.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %who.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;
        // Valid strictly before `exp`; the library still accepts `now == exp`.
        if data.claims.exp as i64 <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::users::model::Role;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str) -> JwtKeys {
        let mut cfg = AppConfig::for_tests().jwt;
        cfg.secret = secret.into();
        cfg.issuer = issuer.into();
        JwtKeys::from_config(&cfg)
    }

    fn ann() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "ann@x.com".into(),
            name: "Ann".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", "test-issuer");
        let who = ann();
        let token = keys.issue(&who).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, who.id);
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.name, "Ann");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = make_keys("dev-secret", "test-issuer");
        let issued = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let token = keys.issue_at(&ann(), issued).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn tokens_expire_without_grace_period() {
        let keys = make_keys("dev-secret", "test-issuer");
        let ttl = TimeDuration::minutes(AppConfig::for_tests().jwt.ttl_minutes);
        let now = OffsetDateTime::now_utc();

        let just_past = keys.issue_at(&ann(), now - ttl - TimeDuration::seconds(1)).unwrap();
        assert_eq!(keys.verify(&just_past).unwrap_err(), TokenError::Expired);

        let at_expiry = keys.issue_at(&ann(), now - ttl).unwrap();
        assert_eq!(keys.verify(&at_expiry).unwrap_err(), TokenError::Expired);

        let almost = keys.issue_at(&ann(), now - ttl + TimeDuration::seconds(30)).unwrap();
        assert!(keys.verify(&almost).is_ok());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let good = make_keys("secret-a", "test-issuer");
        let forged = make_keys("secret-b", "test-issuer");
        let token = forged.issue(&ann()).unwrap();
        assert_eq!(good.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn garbage_and_wrong_issuer_are_malformed() {
        let keys = make_keys("dev-secret", "test-issuer");
        assert_eq!(keys.verify("not.a.jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Malformed);

        let other = make_keys("dev-secret", "someone-else");
        let token = other.issue(&ann()).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Malformed);
    }
}
