use axum::extract::FromRequest;

use crate::errors::AppError;

/// `Json` whose rejections render as the standard `AppError` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
