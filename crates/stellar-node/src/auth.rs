//! Access guard: resolves the bearer credential of a request into an [`Actor`].
//!
//! Tokens are issued at login and never stored; the registry keeps their
//! SHA-256 digests until logout.

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use stellar_core::Actor;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Live sessions, keyed by token digest.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    by_digest: RwLock<HashMap<String, Actor>>,
}

impl TokenRegistry {
    /// Start a session for `actor` and return its raw bearer token.
    pub async fn issue(&self, actor: Actor) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.by_digest.write().await.insert(hash_token(&token), actor);
        token
    }

    /// The identity behind a raw bearer token.
    pub async fn resolve(&self, token: &str) -> Option<Actor> {
        self.by_digest.read().await.get(&hash_token(token)).copied()
    }

    /// End a session. Returns false if the token was not live.
    pub async fn revoke(&self, token: &str) -> bool {
        self.by_digest.write().await.remove(&hash_token(token)).is_some()
    }

    pub async fn len(&self) -> usize {
        self.by_digest.read().await.len()
    }
}

/// Lowercase hex SHA-256 of a token.
pub fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Caller(session.actor))
    }
}

/// The caller of a public route; `None` when the request carries no live token.
#[derive(Debug, Clone, Copy)]
pub struct MaybeCaller(pub Option<Actor>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let actor = match bearer_token(parts) {
            Some(token) => state.tokens.resolve(token).await,
            None => None,
        };
        Ok(MaybeCaller(actor))
    }
}

/// The caller together with the token it presented. Used by logout.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthenticated)?;
        let actor = state
            .tokens
            .resolve(token)
            .await
            .ok_or(ApiError::Unauthenticated)?;
        Ok(Session {
            actor,
            token: token.to_string(),
        })
    }
}
