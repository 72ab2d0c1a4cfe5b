//! Request extractors that report rejections as [`AppError`] JSON bodies.
//!
//! Axum's stock extractors answer malformed input with plain-text bodies. These
//! wrappers run the same extraction and convert the rejection, so every error a
//! client sees has the `{code, message}` shape.

use crate::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON body extractor.
///
/// Syntax errors are `400`; well-formed JSON of the wrong shape is `422`.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor. Unparseable IDs are `400`.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor. Unparseable parameters are `400`.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
