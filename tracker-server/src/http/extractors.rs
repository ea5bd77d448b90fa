//! Custom Axum extractors
//!
//! `Json`, `Query` and `Path` wrap axum's extractors so a malformed body,
//! query string or path segment comes back as the same `{error, message}`
//! JSON as every other `ApiError`, with axum's status code kept.

use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;

/// Header carrying the authenticated user's id, set by the auth gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user every repository call is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let id = Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Unauthorized)?;
        Ok(Self(id))
    }
}

/// JSON body extractor and response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = <axum::Json<T> as FromRequest<S>>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Option<Json<T>>`: `None` when the request has no JSON body.
impl<T, S> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let value = <axum::Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(value.map(|axum::Json(v)| Self(v)))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Path parameter extractor.
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use serde::Deserialize;

    async fn extract(header: Option<&str>) -> Result<CurrentUser, ApiError> {
        let mut builder = Request::builder().uri("/api/tasks");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_uuid_header() {
        let id = Uuid::new_v4();
        let user = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(user, CurrentUser(id));
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthorized)));
        assert!(matches!(extract(Some("alice")).await, Err(ApiError::Unauthorized)));
    }

    #[derive(Debug, Deserialize)]
    struct MonthFilter {
        #[allow(dead_code)]
        month: tracker_core::MonthKey,
    }

    #[tokio::test]
    async fn bad_query_is_json_400() {
        let (mut parts, _) = Request::builder()
            .uri("/api/transactions?month=2024-3")
            .body(())
            .unwrap()
            .into_parts();
        let err = Query::<MonthFilter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: StatusCode::BAD_REQUEST, .. }));
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/tasks")
            .body(axum::body::Body::from(r#"{"title":"x"}"#))
            .unwrap();
        let err = <Json<serde_json::Value> as FromRequest<()>>::from_request(req, &())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rejected { status: StatusCode::UNSUPPORTED_MEDIA_TYPE, .. }
        ));
    }

    #[tokio::test]
    async fn absent_optional_body_is_none() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/bills/x/pay")
            .body(axum::body::Body::empty())
            .unwrap();
        let body = <Json<serde_json::Value> as OptionalFromRequest<()>>::from_request(req, &())
            .await
            .unwrap();
        assert!(body.is_none());
    }
}
