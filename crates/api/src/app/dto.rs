use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeep_auth::IssuedToken;

use crate::app::services::LoginOutcome;
use crate::context::AuthContext;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_at: DateTime<Utc>,
    pub user: UserDto,
    pub role: RoleDto,
    pub permissions: Vec<String>,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let LoginOutcome { identity, issued } = outcome;
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            refresh_at: issued.refresh_at,
            permissions: identity
                .permissions()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            user: UserDto {
                id: identity.user_id.to_string(),
                username: identity.username,
                display_name: identity.display_name,
            },
            role: RoleDto {
                id: identity.role_id.to_string(),
                name: identity.role.as_str().to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_at: DateTime<Utc>,
}

impl From<IssuedToken> for RefreshResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            refresh_at: issued.refresh_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub refresh_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserDto,
    pub role: RoleDto,
    pub permissions: Vec<String>,
    pub session_started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&AuthContext> for MeResponse {
    fn from(ctx: &AuthContext) -> Self {
        Self {
            user: UserDto {
                id: ctx.user_id().to_string(),
                username: ctx.username().to_string(),
                display_name: ctx.display_name().to_string(),
            },
            role: RoleDto {
                id: ctx.role_id().to_string(),
                name: ctx.role().as_str().to_string(),
            },
            permissions: permission_names(ctx),
            session_started_at: ctx.claims().session_started_at(),
            expires_at: ctx.expires_at(),
        }
    }
}

pub fn permission_names(ctx: &AuthContext) -> Vec<String> {
    ctx.permissions()
        .iter()
        .map(|p| p.as_str().to_string())
        .collect()
}
