//! Caller identity.
//!
//! The gateway in front of this service authenticates the request and
//! forwards the identity as `x-user-id` and `x-user-role`. Both are trusted
//! as given. The first request from a user records the id locally.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    fn from_headers(parts: &Parts) -> Result<Self, ApiError> {
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("user not authenticated"))?;
        let user_id =
            Uuid::parse_str(user_id).map_err(|_| ApiError::unauthorized("invalid user id"))?;
        let role = header(parts, USER_ROLE_HEADER).map(str::to_uppercase);
        let role = match role.as_deref() {
            Some("ADMIN") => Role::Admin,
            Some("USER") | None => Role::User,
            Some(_) => return Err(ApiError::unauthorized("invalid user role")),
        };
        Ok(Self { user_id, role })
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = Self::from_headers(parts)?;
        state.services.users.register(user.user_id).await?;
        Ok(user)
    }
}

/// An [`AuthUser`] already checked to hold the admin role.
#[derive(Clone, Copy, Debug)]
pub struct Admin(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(user_id: &str, role: Option<&str>) -> Parts {
        let mut builder = Request::builder().header(USER_ID_HEADER, user_id);
        if let Some(role) = role {
            builder = builder.header(USER_ROLE_HEADER, role);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_role_header() {
        let id = Uuid::now_v7().to_string();
        let admin = AuthUser::from_headers(&parts(&id, Some("admin"))).unwrap();
        assert!(admin.is_admin());
        let user = AuthUser::from_headers(&parts(&id, None)).unwrap();
        assert_eq!(user.role, Role::User);
        let err = AuthUser::from_headers(&parts(&id, Some("ROOT"))).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bad_user_id() {
        let err = AuthUser::from_headers(&parts("not-a-uuid", None)).unwrap_err();
        assert_eq!(err.code(), "unauthorized");
    }
}
