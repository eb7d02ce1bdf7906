//! Caller identity supplied by the upstream gateway.
//!
//! Authentication happens in front of this service. The gateway forwards the
//! authenticated user in headers:
//!
//! | Header         | Value                         |
//! |----------------|-------------------------------|
//! | `x-user-id`    | UUID (required)               |
//! | `x-user-name`  | username (required)           |
//! | `x-user-email` | email address (optional)      |
//! | `x-user-admin` | `true` / `1` for administrators |

use super::error::ApiError;
use crate::types::{Actor, Customer, UserId};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Header carrying the user ID
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the username
pub const USER_NAME_HEADER: &str = "x-user-name";
/// Header carrying the email address
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the administrator flag
pub const USER_ADMIN_HEADER: &str = "x-user-admin";

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User ID
    pub id: UserId,
    /// Username
    pub username: String,
    /// Email address
    pub email: Option<String>,
    /// Administrator capability
    pub is_admin: bool,
}

impl Identity {
    /// The caller as a booking owner
    #[must_use]
    pub fn customer(&self) -> Customer {
        Customer::new(self.id, self.username.clone(), self.email.clone())
    }

    /// The caller as the actor of an administrative decision
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?;
        let id = Uuid::parse_str(id)
            .map_err(|_| ApiError::unauthorized("x-user-id must be a UUID"))?;
        let username = header(parts, USER_NAME_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-name header"))?;
        let is_admin = header(parts, USER_ADMIN_HEADER)
            .is_some_and(|value| value.eq_ignore_ascii_case("true") || value == "1");

        Ok(Self {
            id: UserId::from_uuid(id),
            username: username.to_string(),
            email: header(parts, USER_EMAIL_HEADER).map(str::to_string),
            is_admin,
        })
    }
}

/// Identity that must carry the administrator capability.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if !identity.is_admin {
            return Err(ApiError::forbidden(format!(
                "{} is not an administrator",
                identity.username
            )));
        }
        Ok(Self(identity))
    }
}
