//! Request extractors whose rejections render as [`ApiError`] bodies.
//!
//! Axum's own `Json`, `Path` and `Query` reject with plain-text responses. These
//! wrappers run the same extraction and convert the rejection, so a malformed body or
//! a non-UUID id still answers with `{code, message}`.

use super::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
