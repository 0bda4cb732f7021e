use super::error::ApiError;
use crate::game::types::UserId;
use crate::shared::names::sanitize_display_name;
use crate::shared::session_token::{sign_session_token, verify_session_token, SessionClaims};
use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
}

pub trait ProfileStore: Send + Sync {
    fn get_by_id(&self, user_id: &UserId) -> Option<Profile>;
    fn insert(&self, profile: Profile);
}

#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    profiles: DashMap<UserId, Profile>,
}

impl ProfileStore for InMemoryProfiles {
    fn get_by_id(&self, user_id: &UserId) -> Option<Profile> {
        self.profiles.get(user_id).map(|entry| entry.value().clone())
    }

    fn insert(&self, profile: Profile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }
}

/// Issues and checks bearer tokens; resolves them to a stored profile.
pub struct Authenticator {
    secret: String,
    ttl: Duration,
    profiles: Box<dyn ProfileStore>,
}

impl Authenticator {
    pub fn new(secret: String, ttl: Duration, profiles: Box<dyn ProfileStore>) -> Self {
        Self {
            secret,
            ttl,
            profiles,
        }
    }

    /// Registers a fresh profile and returns it with its token.
    pub fn register(&self, name: Option<&str>) -> Result<(Profile, String), ApiError> {
        let profile = Profile {
            user_id: UserId::new(Uuid::new_v4().to_string()),
            display_name: sanitize_display_name(name.unwrap_or_default(), "Player"),
        };
        let claims = SessionClaims {
            sub: profile.user_id.to_string(),
            expires_at_ms: now_millis() + self.ttl.as_millis() as i64,
        };
        let token = sign_session_token(&claims, &self.secret)?;
        self.profiles.insert(profile.clone());
        Ok((profile, token))
    }

    pub fn authenticate(&self, token: &str) -> Result<Profile, ApiError> {
        let claims = verify_session_token(token, &self.secret, now_millis()).map_err(|error| {
            tracing::debug!(%error, "token rejected");
            ApiError::Unauthorized
        })?;
        self.profiles
            .get_by_id(&UserId::new(claims.sub))
            .ok_or(ApiError::Unauthorized)
    }

    pub fn authenticate_headers(&self, headers: &HeaderMap) -> Result<Profile, ApiError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;
        self.authenticate(token.trim())
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
