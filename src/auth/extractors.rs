use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{
    jwt::{JwtKeys, TokenKind},
    repo_types::User,
};
use crate::{error::AppError, state::AppState};

/// Extracts and validates the bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthorized("invalid or expired token".into())
        })?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("access token required".into()));
        }

        Ok(AuthUser(claims.sub))
    }
}

/// An authenticated user whose admin flag was confirmed against the database
/// on this request.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("user not found".into()))?;
        if !user.is_admin {
            warn!(user_id = %user_id, "admin route refused");
            return Err(AppError::Forbidden("admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};

    use super::*;

    async fn extract(header_value: Option<String>) -> Result<AuthUser, AppError> {
        let st = AppState::fake();
        let mut builder = Request::builder().uri("/me");
        if let Some(v) = header_value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &st).await
    }

    #[tokio::test]
    async fn accepts_access_token() {
        let st = AppState::fake();
        let id = Uuid::new_v4();
        let token = JwtKeys::from_ref(&st).sign_access(id).unwrap();
        let AuthUser(got) = extract(Some(format!("Bearer {token}"))).await.unwrap();
        assert_eq!(got, id);
    }

    #[tokio::test]
    async fn refuses_refresh_token() {
        let st = AppState::fake();
        let token = JwtKeys::from_ref(&st).sign_refresh(Uuid::new_v4()).unwrap();
        let err = extract(Some(format!("Bearer {token}"))).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refuses_missing_or_malformed_header() {
        let err = extract(None).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        let err = extract(Some("Basic abc".into())).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        let err = extract(Some("Bearer garbage".into())).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
