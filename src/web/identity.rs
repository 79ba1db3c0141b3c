//! Caller identity supplied by the authentication layer in front of this
//! service through request headers.

use crate::constants::SignerRole;
use crate::web::errors::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub role: SignerRole,
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| ApiError::unauthorized(format!("{USER_ID_HEADER} is not a valid UUID")))?;

        let role = header_value(parts, USER_ROLE_HEADER)?
            .parse::<SignerRole>()
            .map_err(|_| ApiError::unauthorized(format!("{USER_ROLE_HEADER} is not a known role")))?;

        debug!(user_id = %user_id, role = %role, "Resolved caller identity");
        Ok(Self { user_id, role })
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::unauthorized(format!("missing {name} header")))?
        .to_str()
        .map(str::trim)
        .map_err(|_| ApiError::unauthorized(format!("{name} header is not valid text")))
}
