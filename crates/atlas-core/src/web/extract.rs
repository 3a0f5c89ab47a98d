//! Request extractors whose rejections render through [`Error`]
//!
//! Malformed bodies, path segments and query strings become `Error::Parse`,
//! so clients always receive the `{error, code, status}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Typed path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParams<T>(pub T);

/// Typed query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);
