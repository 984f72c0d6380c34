//! Session cookies and the login page.
//!
//! Login tokens are issued out-of-band (see `config/seed.toml` for local
//! development). Visiting `/login?token=...` exchanges one for a session cookie
//! and sends the user to their account page.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::app::account::ACCOUNT_PATH;
use crate::prelude::*;

pub const LOGIN_PATH: &str = "/login";
pub const SESSION_COOKIE: &str = "session";

/// Add all `auth` routes to the router.
pub fn add_routes(router: AxumRouter) -> AxumRouter {
    router.route(LOGIN_PATH, get(login_link))
}

/// Add all `auth` middleware to the router.
///
/// The session layer adds a `User` to the request if a valid session token is present,
/// and expires the cookie when the token is stale unless the handler already set a new one.
pub fn add_middleware(router: AxumRouter, state: SharedAppState) -> AxumRouter {
    async fn session_middleware(
        State(state): State<SharedAppState>, cookies: CookieJar, mut request: Request, next: Next,
    ) -> AppResult<Response> {
        let mut stale = false;
        if let Some(token) = cookies.get(SESSION_COOKIE) {
            match state.sessions.current_user(token.value()).await? {
                Some(user) => {
                    request.extensions_mut().insert(user);
                }
                None => stale = true,
            }
        }

        let response = next.run(request).await;
        if stale && !sets_session_cookie(&response) {
            return Ok((cookies.remove(removal_cookie()), response).into_response());
        }
        Ok(response)
    }
    router.layer(axum::middleware::from_fn_with_state(state, session_middleware))
}

/// Whether a response already writes the session cookie, either a new session or a removal.
fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|value| value.to_str().is_ok_and(|value| value.starts_with(&prefix)))
}

#[derive(serde::Deserialize)]
struct LoginQuery {
    token: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginHtml;

/// Show the login page or handle a login link.
async fn login_link(
    user: Option<User>, State(state): State<SharedAppState>, cookies: CookieJar, Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    // Already signed in, nothing to do
    if user.is_some() {
        return Ok(Redirect::to(ACCOUNT_PATH).into_response());
    }

    let Some(token) = &query.token else {
        return Ok(LoginHtml.into_response());
    };

    let Some(session) = state.sessions.sign_in(token).await? else {
        return Err(AppError::Unauthorized);
    };
    let cookies = cookies.add(session_cookie(&state.config, session));
    Ok((cookies, Redirect::to(ACCOUNT_PATH)).into_response())
}

fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .secure(config.acme.is_some())
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(cookie::time::Duration::days(config.app.session_expiry_days.into()))
        .build()
}

/// Expires the session cookie. The path has to match the one it was set with.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use tower::ServiceExt as _;
    use uuid::Uuid;

    use super::*;
    use crate::app::session::fake::FakeSessions;
    use crate::app::test_router;

    fn alice() -> User {
        User { id: Uuid::now_v7(), email: "alice@example.com".into() }
    }

    fn get(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn login_page_renders_without_token() {
        let (router, _) = test_router(FakeSessions::default()).await;
        let response = router.oneshot(get("/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_token_sets_session_cookie() {
        let sessions = FakeSessions::default();
        sessions.login_tokens.lock().unwrap().insert("abc".into(), alice());
        let (router, _) = test_router(sessions).await;

        let response = router.clone().oneshot(get("/login?token=abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], ACCOUNT_PATH);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session=session-"), "{cookie}");
        assert!(cookie.contains("HttpOnly"), "{cookie}");

        let response = router.oneshot(get("/login?token=abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_session_cookie_is_cleared() {
        let (router, _) = test_router(FakeSessions::default()).await;
        let request = axum::http::Request::builder()
            .uri("/login")
            .header(header::COOKIE, "session=stale")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session=;"), "{cookie}");
    }

    #[tokio::test]
    async fn login_token_replaces_stale_session_cookie() {
        let sessions = FakeSessions::default();
        sessions.login_tokens.lock().unwrap().insert("abc".into(), alice());
        let (router, _) = test_router(sessions).await;
        let request = axum::http::Request::builder()
            .uri("/login?token=abc")
            .header(header::COOKIE, "session=stale")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 1, "{cookies:?}");
        assert!(cookies[0].starts_with("session=session-"), "{cookies:?}");
    }
}
