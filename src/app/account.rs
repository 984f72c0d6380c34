//! The account settings page: edit the signed-in user's profile, or sign out.

use crate::app::auth::{removal_cookie, LOGIN_PATH, SESSION_COOKIE};
use crate::db::profile::ProfileUpdate;
use crate::prelude::*;

pub const ACCOUNT_PATH: &str = "/account";

/// Add all `account` routes to the router.
pub fn add_routes(router: AxumRouter) -> AxumRouter {
    router
        .route(ACCOUNT_PATH, get(account_page).post(update_profile))
        .route("/account/sign-out", post(sign_out))
}

/// Outcome of looking up the signed-in user's profile.
#[derive(Debug)]
pub enum ProfileLookup {
    /// Nobody is signed in, so the lookup never ran.
    NoSession,
    /// Signed in, but no profile matches the user id.
    NotFound,
    /// The store failed to answer.
    Failed,
    Found(Profile),
}

impl ProfileLookup {
    pub async fn fetch(db: &Db, user: Option<&User>) -> Self {
        let Some(user) = user else {
            return Self::NoSession;
        };
        match Profile::lookup(db, user.id).await {
            Ok(Some(profile)) => Self::Found(profile),
            Ok(None) => Self::NotFound,
            Err(e) => {
                tracing::warn!(user_id = %user.id, "profile lookup failed: {e:#}");
                Self::Failed
            }
        }
    }

    /// Anonymous users and users without a profile belong on the login page.
    pub fn should_redirect(&self) -> bool {
        matches!(self, Self::NoSession | Self::NotFound)
    }
}

/// State of the edit form as shown to the user.
#[derive(Debug)]
pub struct AccountForm {
    pub username: String,
    pub website: String,
    pub error: Option<&'static str>,
    pub fetching: bool,
}

impl AccountForm {
    pub const UPDATE_LABEL: &'static str = "Update";
    pub const LOADING_LABEL: &'static str = "Loading ...";

    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone().unwrap_or_default(),
            website: profile.website.clone().unwrap_or_default(),
            error: None,
            fetching: false,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.fetching {
            Self::LOADING_LABEL
        } else {
            Self::UPDATE_LABEL
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountHtml {
    /// `None` renders the page without a form.
    pub form: Option<AccountForm>,
}

impl AccountHtml {
    fn into_page(self, status: StatusCode) -> Response {
        (status, self).into_response()
    }
}

/// Display the account form for the signed-in user.
async fn account_page(user: Option<User>, State(state): State<SharedAppState>) -> Response {
    match ProfileLookup::fetch(&state.db, user.as_ref()).await {
        lookup if lookup.should_redirect() => Redirect::to(LOGIN_PATH).into_response(),
        ProfileLookup::Found(profile) => {
            AccountHtml { form: Some(AccountForm::from_profile(&profile)) }.into_page(StatusCode::OK)
        }
        _ => AccountHtml { form: None }.into_page(StatusCode::OK),
    }
}

/// Write the submitted username and website to the signed-in user's profile.
async fn update_profile(
    user: Option<User>, State(state): State<SharedAppState>, Form(form): Form<ProfileUpdate>,
) -> Response {
    let profile = match ProfileLookup::fetch(&state.db, user.as_ref()).await {
        lookup if lookup.should_redirect() => return Redirect::to(LOGIN_PATH).into_response(),
        ProfileLookup::Found(profile) => profile,
        _ => return AccountHtml { form: None }.into_page(StatusCode::OK),
    };

    match Profile::update(&state.db, profile.id, &form).await {
        Ok(outcome) => {
            tracing::info!(profile_id = %profile.id, affected = outcome.affected_count, "profile updated");
            tracing::debug!(records = ?outcome.records);
            Redirect::to(ACCOUNT_PATH).into_response()
        }
        Err(e) => {
            let error = e.code.user_message();
            let status = match error {
                Some(_) => StatusCode::UNPROCESSABLE_ENTITY,
                None => {
                    tracing::warn!(profile_id = %profile.id, "{e:#}");
                    StatusCode::OK
                }
            };
            // Keep what the user typed, not what is stored
            let form = AccountForm { username: form.username, website: form.website, error, fetching: false };
            AccountHtml { form: Some(form) }.into_page(status)
        }
    }
}

/// End the current session, then let the account page send the user to login.
async fn sign_out(State(state): State<SharedAppState>, cookies: CookieJar) -> impl IntoResponse {
    if let Some(token) = cookies.get(SESSION_COOKIE) {
        if let Err(e) = state.sessions.sign_out(token.value()).await {
            tracing::warn!("sign out failed: {e:#}");
        }
    }
    (cookies.remove(removal_cookie()), Redirect::to(ACCOUNT_PATH))
}
