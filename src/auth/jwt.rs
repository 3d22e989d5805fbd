/// Token Codec
///
/// Signs and verifies compact HS256 tokens. Signature and structure are
/// checked by `jsonwebtoken`; expiry is checked here against the injected
/// clock so that an expired-but-authentic token is reported as `Expired`.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{TokenClaims, TokenKind};
use crate::auth::clock::Clock;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};

/// Upper bound for a configured token lifetime (ten years)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Build a codec from the configured signing key
    ///
    /// # Errors
    /// - `ConfigError::MissingRequired` if the key is empty
    /// - `ConfigError::InvalidValue` if a token lifetime is not in
    ///   `1..=MAX_TOKEN_TTL_SECONDS`
    pub fn new(config: &JwtSettings, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        if config.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        check_ttl("jwt.access_token_expiry", config.access_token_expiry)?;
        check_ttl("jwt.refresh_token_expiry", config.refresh_token_expiry)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            clock,
        })
    }

    /// Sign a new token for `subject_id` that expires `ttl_seconds` from now
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn mint(
        &self,
        subject_id: Uuid,
        kind: TokenKind,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let claims = TokenClaims::new(subject_id, kind, self.clock.now(), ttl_seconds);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Check structure, signature and expiry, in that order
    ///
    /// # Errors
    /// - `Malformed` if the token cannot be parsed or carries a bad subject id
    /// - `InvalidSignature` if it was not signed with this key
    /// - `Expired` if the signature is valid but `now >= exp`
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(classify_jwt_error)?;

        claims.subject_id()?;

        if claims.is_expired_at(self.clock.now()) {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// `verify`, then require the token to be of the given kind
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            return Err(AuthError::Malformed(format!(
                "expected {:?} token, got {:?}",
                kind, claims.kind
            )));
        }
        Ok(claims)
    }

    /// Read the subject id from the payload without checking signature or expiry
    ///
    /// Only for flows that authenticate the token by other means.
    pub fn extract_subject_id(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Malformed(format!("undecodable payload: {:?}", e.kind())))?;

        claims.subject_id()
    }
}

fn check_ttl(name: &str, ttl_seconds: i64) -> Result<(), ConfigError> {
    if ttl_seconds <= 0 || ttl_seconds > MAX_TOKEN_TTL_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {} seconds, got {}",
            name, MAX_TOKEN_TTL_SECONDS, ttl_seconds
        )));
    }
    Ok(())
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        other => {
            tracing::debug!(error = ?other, "Token failed structural validation");
            AuthError::Malformed(format!("{:?}", other))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;

    const NOW: i64 = 1_700_000_000;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 259200,
        }
    }

    fn codec_at(now: i64) -> (TokenCodec, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let codec = TokenCodec::new(&get_test_config(), clock.clone()).unwrap();
        (codec, clock)
    }

    #[test]
    fn test_mint_and_verify_token() {
        let (codec, _) = codec_at(NOW);
        let subject_id = Uuid::new_v4();

        let token = codec
            .mint(subject_id, TokenKind::Access, 3600)
            .expect("Failed to generate token");
        let claims = codec.verify(&token).expect("Failed to validate token");

        assert_eq!(claims.subject_id().unwrap(), subject_id);
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let mut config = get_test_config();
        config.secret = "  ".to_string();

        let result = TokenCodec::new(&config, Arc::new(FixedClock::new(NOW)));
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let (codec, _) = codec_at(NOW);

        assert!(matches!(codec.verify("invalid.token.here"), Err(AuthError::Malformed(_))));
        assert!(matches!(codec.verify("no-dots"), Err(AuthError::Malformed(_))));
        assert!(matches!(codec.verify(""), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_tampered_token() {
        let (codec, _) = codec_at(NOW);
        let token = codec.mint(Uuid::new_v4(), TokenKind::Access, 3600).unwrap();

        let tampered = format!("{}X", token);
        assert!(codec.verify(&tampered).is_err());
    }

    #[test]
    fn test_other_key_is_invalid_signature() {
        let (codec, clock) = codec_at(NOW);
        let mut other_config = get_test_config();
        other_config.secret = "a-completely-different-signing-key".to_string();
        let other = TokenCodec::new(&other_config, clock).unwrap();

        let token = other.mint(Uuid::new_v4(), TokenKind::Access, 3600).unwrap();

        assert_eq!(codec.verify(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_is_expired_not_invalid() {
        let (codec, clock) = codec_at(NOW);
        let token = codec.mint(Uuid::new_v4(), TokenKind::Access, 60).unwrap();

        clock.advance(59);
        assert!(codec.verify(&token).is_ok());

        clock.advance(1);
        assert_eq!(codec.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_expired_token_with_other_key_is_invalid_signature() {
        let (codec, clock) = codec_at(NOW);
        let mut other_config = get_test_config();
        other_config.secret = "a-completely-different-signing-key".to_string();
        let other = TokenCodec::new(&other_config, clock.clone()).unwrap();

        let token = other.mint(Uuid::new_v4(), TokenKind::Access, 60).unwrap();
        clock.advance(3600);

        assert_eq!(codec.verify(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_verify_kind() {
        let (codec, _) = codec_at(NOW);
        let refresh = codec.mint(Uuid::new_v4(), TokenKind::Refresh, 3600).unwrap();

        assert!(codec.verify_kind(&refresh, TokenKind::Refresh).is_ok());
        assert!(matches!(
            codec.verify_kind(&refresh, TokenKind::Access),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_extract_subject_id_ignores_expiry_and_key() {
        let (codec, clock) = codec_at(NOW);
        let mut other_config = get_test_config();
        other_config.secret = "a-completely-different-signing-key".to_string();
        let other = TokenCodec::new(&other_config, clock.clone()).unwrap();

        let subject_id = Uuid::new_v4();
        let token = other.mint(subject_id, TokenKind::Access, 60).unwrap();
        clock.advance(3600);

        assert_eq!(codec.extract_subject_id(&token).unwrap(), subject_id);
    }

    #[test]
    fn test_extract_subject_id_rejects_garbage() {
        let (codec, _) = codec_at(NOW);

        assert!(matches!(codec.extract_subject_id("a.b.c"), Err(AuthError::Malformed(_))));
        assert!(matches!(codec.extract_subject_id("nothing"), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_extract_subject_id_rejects_non_uuid_id() {
        let (codec, _) = codec_at(NOW);
        let mut claims = TokenClaims::new(Uuid::new_v4(), TokenKind::Access, NOW, 60);
        claims.jti = "alice".to_string();
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(get_test_config().secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec.extract_subject_id(&token), Err(AuthError::Malformed(_))));
        assert!(matches!(codec.verify(&token), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_non_positive_ttl_is_rejected() {
        let clock = Arc::new(FixedClock::new(NOW));
        let mut config = get_test_config();
        config.access_token_expiry = -5;
        assert!(matches!(
            TokenCodec::new(&config, clock.clone()),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut config = get_test_config();
        config.refresh_token_expiry = 0;
        assert!(matches!(
            TokenCodec::new(&config, clock),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_oversized_ttl_is_rejected() {
        let clock = Arc::new(FixedClock::new(NOW));
        let mut config = get_test_config();
        config.refresh_token_expiry = i64::MAX;
        assert!(matches!(
            TokenCodec::new(&config, clock.clone()),
            Err(ConfigError::InvalidValue(_))
        ));

        config.refresh_token_expiry = MAX_TOKEN_TTL_SECONDS;
        assert!(TokenCodec::new(&config, clock).is_ok());
    }
}
