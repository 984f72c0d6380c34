use crate::prelude::*;

/// Semantic app error, templated into an error page.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Unauthorized,
    Internal(anyhow::Error),
}
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn message(&self) -> &'static str {
        match self {
            AppError::NotFound => "Page not found.",
            AppError::Unauthorized => "Unauthorized.",
            AppError::Internal(_) => "Something went wrong on our end. Please try again later.",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Anything that converts into an anyhow error is an internal error.
impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        AppError::Internal(e.into())
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorHtml {
    pub title: &'static str,
    pub message: &'static str,
    pub context: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            tracing::error!("{e:#}");
        }

        #[cfg(debug_assertions)]
        let context = match &self {
            AppError::Internal(e) => Some(format!("{e:#}")),
            _ => None,
        };
        #[cfg(not(debug_assertions))]
        let context = None;

        let title = match &self {
            AppError::Internal(_) => "We encountered an unexpected error",
            _ => "Error",
        };
        let html = ErrorHtml { title, message: self.message(), context };
        (self.status(), html).into_response()
    }
}
