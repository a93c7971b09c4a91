use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use turnstile_types::{AppError, Result};
use uuid::Uuid;

/// Claims injected into the per-request context after bearer-token
/// validation (spec.md §6 "AuthN").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: String,
    pub exp: usize,
}

/// Capability boundary for the identity provider (spec.md §1, "Out of
/// scope: ... authentication"). The core never issues or stores
/// credentials; it only validates bearer tokens minted elsewhere.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, bearer_token: &str) -> Result<IdentityClaims>;
}

struct JwksCache {
    keys: Vec<JwkKey>,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize, Clone)]
struct JwkKey {
    kid: Option<String>,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

/// Validates tokens issued by an external identity provider against its
/// published JWKS, caching keys for 5 minutes. Generalizes the teacher's
/// Supabase JWKS-fetch-and-cache pattern to a provider-agnostic issuer URL.
pub struct JwtIdentityVerifier {
    issuer: String,
    audience: String,
    jwks_url: String,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<JwksCache>>>,
}

const CACHE_TTL: Duration = Duration::from_secs(300);

impl JwtIdentityVerifier {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            jwks_url: jwks_url.into(),
            client: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    async fn fetch_jwks(&self) -> Result<Vec<JwkKey>> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("failed to fetch JWKS: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse JWKS: {e}")))?;
        Ok(jwks.keys)
    }

    async fn get_jwks(&self) -> Result<Vec<JwkKey>> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.fetched_at.elapsed() < CACHE_TTL {
                    return Ok(entry.keys.clone());
                }
            }
        }

        let keys = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(JwksCache {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    fn find_key<'a>(keys: &'a [JwkKey], kid: Option<&str>) -> Option<&'a JwkKey> {
        match kid {
            Some(kid) => keys.iter().find(|k| k.kid.as_deref() == Some(kid)),
            None => keys.first(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, bearer_token: &str) -> Result<IdentityClaims> {
        let header =
            decode_header(bearer_token).map_err(|_| AppError::Unauthorized)?;

        let keys = self.get_jwks().await?;
        let jwk = Self::find_key(&keys, header.kid.as_deref()).ok_or(AppError::Unauthorized)?;

        let alg = match jwk.alg.as_deref() {
            Some("RS384") => Algorithm::RS384,
            Some("RS512") => Algorithm::RS512,
            _ => Algorithm::RS256,
        };
        let n = jwk.n.as_ref().ok_or(AppError::Unauthorized)?;
        let e = jwk.e.as_ref().ok_or(AppError::Unauthorized)?;
        let decoding_key =
            DecodingKey::from_rsa_components(n, e).map_err(|_| AppError::Unauthorized)?;

        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<IdentityClaims>(bearer_token, &decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized)?;

        Ok(token_data.claims)
    }
}

/// Fixed-identity verifier for local development and tests: accepts any
/// non-empty token and returns a caller-supplied identity.
pub struct StaticIdentityVerifier {
    pub claims: IdentityClaims,
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, bearer_token: &str) -> Result<IdentityClaims> {
        if bearer_token.is_empty() {
            return Err(AppError::Unauthorized);
        }
        Ok(self.claims.clone())
    }
}

/// HS256 shared-secret verifier backing the default deployment when no
/// external JWKS-issuing provider is configured (`Config::jwt_secret`).
/// Tokens are expected to carry `IdentityClaims` directly as the JWT body.
pub struct HmacIdentityVerifier {
    decoding_key: DecodingKey,
}

impl HmacIdentityVerifier {
    pub fn new(shared_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(shared_secret.as_bytes()),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HmacIdentityVerifier {
    async fn verify(&self, bearer_token: &str) -> Result<IdentityClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<IdentityClaims>(bearer_token, &self.decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized)?;
        Ok(token_data.claims)
    }
}
