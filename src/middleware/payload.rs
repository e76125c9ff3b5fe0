// src/middleware/payload.rs

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{ApiError, AppError},
    middleware::i18n::Locale,
};

/// `Json<T>` cujas rejeições (corpo ilegível, campo desconhecido, Content-Type
/// errado) saem no mesmo formato dos demais erros de validação.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                Err(AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale))
            }
        }
    }
}

/// `Path<T>` com a mesma tradução: um UUID inválido na rota vira 400 estruturado.
#[derive(Debug)]
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale))
            }
        }
    }
}

/// `Query<T>` com a mesma tradução: parâmetro ausente ou ilegível vira 400 estruturado.
#[derive(Debug)]
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale))
            }
        }
    }
}
