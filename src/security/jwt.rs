use super::{AuthError, Security};
use crate::config::JwtConfig;
use crate::contract::{ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemes};
use crate::server::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// HMAC signing methods accepted by [`JwtAuth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum JwtAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl JwtAlgorithm {
    fn as_jsonwebtoken(self) -> Algorithm {
        match self {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(JwtAlgorithm::HS256),
            "HS384" => Ok(JwtAlgorithm::HS384),
            "HS512" => Ok(JwtAlgorithm::HS512),
            _ => Err(AuthError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Serialize, Deserialize)]
struct TokenClaims<T> {
    user: T,
    iat: u64,
    exp: u64,
}

/// Bearer-token authenticator carrying a typed principal `T`.
///
/// Tokens are read from `Authorization: Bearer <token>`. On success the
/// decoded `T` is stored as the request's claims, retrievable with
/// `ctx.claims::<T>()` or [`JwtAuth::user`].
///
/// In the contract the scheme is described as an API key in the
/// `Authorization` header, which lets the documentation UI send the raw header.
pub struct JwtAuth<T> {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: JwtAlgorithm,
    scheme: String,
    expires: Duration,
    _user: PhantomData<fn() -> T>,
}

impl<T> JwtAuth<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(secret: &str, scheme: &str, algorithm: JwtAlgorithm, expires: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            scheme: scheme.to_string(),
            expires,
            _user: PhantomData,
        }
    }

    /// # Errors
    ///
    /// [`AuthError::UnsupportedAlgorithm`] for a non-HMAC `sign_method`.
    pub fn from_config(config: &JwtConfig) -> Result<Self, AuthError> {
        let algorithm = config.sign_method.parse()?;
        Ok(Self::new(
            &config.secret,
            &config.scheme,
            algorithm,
            Duration::from_secs(config.expires_secs),
        ))
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Sign a token for `user`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// [`AuthError::Encode`] if `user` cannot be serialized.
    pub fn generate_token(&self, user: &T) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = TokenClaims {
            user,
            iat: now,
            exp: now + self.expires.as_secs(),
        };
        encode(
            &Header::new(self.algorithm.as_jsonwebtoken()),
            &claims,
            &self.encoding,
        )
        .map_err(|e| AuthError::Encode(e.to_string()))
    }

    /// Verify signature and expiry, then return the embedded principal.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] for any verification failure.
    pub fn parse_token(&self, token: &str) -> Result<T, AuthError> {
        let validation = Validation::new(self.algorithm.as_jsonwebtoken());
        decode::<TokenClaims<T>>(token, &self.decoding, &validation)
            .map(|data| data.claims.user)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Raw token from the `Authorization` header.
    #[must_use]
    pub fn token<'c>(&self, ctx: &'c Context) -> Option<&'c str> {
        let header = ctx.header("authorization")?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        (!token.is_empty()).then_some(token)
    }
}

impl<T> JwtAuth<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Principal of the request: the stored claims when the route is secured,
    /// otherwise whatever a valid token on the request carries.
    #[must_use]
    pub fn user(&self, ctx: &Context) -> Option<T> {
        if let Some(user) = ctx.claims::<T>() {
            return Some(user.clone());
        }
        self.token(ctx).and_then(|t| self.parse_token(t).ok())
    }
}

impl<T> Security for JwtAuth<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn auth(&self, ctx: &mut Context) {
        let Some(token) = self.token(ctx) else {
            debug!(scheme = %self.scheme, "JWT auth failed: missing Authorization header");
            ctx.abort_with_json(401, &json!({"error": "Authorization header required"}));
            return;
        };
        match self.parse_token(token) {
            Ok(user) => ctx.set_claims(user),
            Err(e) => {
                debug!(scheme = %self.scheme, error = %e, "JWT auth failed");
                ctx.abort_with_json(401, &json!({"error": "Invalid token"}));
            }
        }
    }

    fn security_schemes(&self) -> SecuritySchemes {
        SecuritySchemes::from([(
            self.scheme.clone(),
            SecurityScheme::api_key("Authorization", ApiKeyLocation::Header),
        )])
    }

    fn security_requirement(&self) -> SecurityRequirement {
        SecurityRequirement::from([(self.scheme.clone(), Vec::new())])
    }
}
