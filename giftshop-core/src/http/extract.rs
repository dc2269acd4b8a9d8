// giftshop-core/src/http/extract.rs
//
// Drop-in replacements for axum's `Json`, `Path` and `Query` whose rejections
// use the same envelope as every other failure.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ApiError;
use crate::Error;

/// JSON body. A value of the wrong shape is reported against the field path
/// that failed, e.g. `price` or `entries[2].dropChance`.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| Error::invalid("body", rejection.body_text()))?;
        parse_body(&bytes).map(Json).map_err(ApiError::from)
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|err| {
        let path = err.path().to_string();
        let field = if path == "." { "body".to_string() } else { path };
        Error::invalid(field, err.inner().to_string())
    })?;
    de.end().map_err(|err| Error::invalid("body", err.to_string()))?;
    Ok(value)
}

/// Path parameters. An id that cannot be parsed names nothing that exists,
/// so it is a not-found rather than a bad request.
#[derive(Debug)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(rejection) => {
                debug!("Unparseable path {}: {}", parts.uri.path(), rejection.body_text());
                Err(Error::NotFound(parts.uri.path().to_string()).into())
            }
        }
    }
}

/// Query string.
#[derive(Debug)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Query(value)| Query(value))
            .map_err(|rejection| Error::invalid("query", rejection.body_text()).into())
    }
}
