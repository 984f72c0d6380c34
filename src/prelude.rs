pub use std::convert::Infallible;
pub use std::sync::Arc;

pub use anyhow::{Context as _, Result};
pub use askama::Template;
pub use askama_web::WebTemplate;
pub use axum::extract::{Query, Request, State};
pub use axum::http::{header, StatusCode};
pub use axum::middleware::Next;
pub use axum::response::{IntoResponse, Redirect, Response};
pub use axum::routing::{get, post};
pub use axum::Form;
pub use axum_extra::extract::CookieJar;

pub use crate::app::session::SessionProvider;
pub use crate::db::profile::Profile;
pub use crate::db::user::User;
pub use crate::db::Db;
pub use crate::utils::config::Config;
pub use crate::utils::error::{AppError, AppResult};
pub use crate::utils::types::{AxumRouter, SharedAppState};
