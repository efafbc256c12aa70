//! Query-string extractor with `validator` rules, the `Query` twin of
//! [`ValidatedJson`](super::ValidatedJson).

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedQuery(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct PriceRange {
        #[validate(range(min = 0))]
        min_price: Option<i64>,
    }

    fn app() -> Router {
        Router::new().route(
            "/items",
            get(|ValidatedQuery(q): ValidatedQuery<PriceRange>| async move {
                q.min_price.unwrap_or_default().to_string()
            }),
        )
    }

    async fn status_for(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_query_validation() {
        assert_eq!(status_for("/items").await, StatusCode::OK);
        assert_eq!(status_for("/items?min_price=10").await, StatusCode::OK);
        assert_eq!(
            status_for("/items?min_price=-1").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for("/items?min_price=abc").await,
            StatusCode::BAD_REQUEST
        );
    }
}
