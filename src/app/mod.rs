use crate::app::session::DbSessionProvider;
use crate::prelude::*;

pub mod account;
pub mod auth;
pub mod session;

pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub sessions: Arc<dyn SessionProvider>,
}

pub async fn build(config: Config) -> Result<axum::Router<()>> {
    let db = crate::db::init(&config.db).await?;
    let sessions = Arc::new(DbSessionProvider::new(db.clone()));
    let state = Arc::new(AppState { config, db, sessions });
    Ok(router(state))
}

fn router(state: SharedAppState) -> axum::Router<()> {
    // Register business logic routes
    let r = AxumRouter::new();
    let r = auth::add_routes(r);
    let r = account::add_routes(r);

    // Register app-wide routes
    let r = r.route("/", get(|| async { Redirect::to(account::ACCOUNT_PATH) }));
    let r = r.fallback(|| async { AppError::NotFound });

    // Register middleware
    let r = auth::add_middleware(r, Arc::clone(&state));
    let r = crate::utils::tracing::add_middleware(r);
    r.with_state(state)
}

/// The full app over an in-memory database and the given sessions.
#[cfg(test)]
pub(crate) async fn test_router(
    sessions: impl SessionProvider + 'static,
) -> (axum::Router<()>, SharedAppState) {
    let state = Arc::new(AppState {
        config: crate::utils::config::test_config(),
        db: crate::db::init_in_memory().await.unwrap(),
        sessions: Arc::new(sessions),
    });
    (router(Arc::clone(&state)), state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use tower::ServiceExt as _;

    use super::*;
    use crate::app::session::fake::FakeSessions;

    fn get(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn root_redirects_to_account() {
        let (router, _) = test_router(FakeSessions::default()).await;
        let response = router.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], account::ACCOUNT_PATH);
    }

    #[tokio::test]
    async fn unknown_paths_render_not_found() {
        let (router, _) = test_router(FakeSessions::default()).await;
        let response = router.oneshot(get("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Page not found."));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let (router, _) = test_router(FakeSessions::default()).await;
        let response = router.oneshot(get("/login")).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
