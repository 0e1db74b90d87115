use crate::domain::user::TodoUser;
use crate::domain::user::driving_ports::UserPort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{GenericErrorResponse, UnsafeRedirectResponse};
use crate::views::PageContext;
use crate::{AppState, domain, persistence};
use anyhow::Context;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::Uri;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use tower_sessions::Session;
use tracing::{info, warn};
use url::{Position, Url, form_urlencoded};

const USER_ID_KEY: &str = "user_id";
const FLASHES_KEY: &str = "_flashes";

/// Who is making the current request, if anyone is logged in
#[derive(Clone, Default)]
#[cfg_attr(test, derive(Debug))]
pub struct Visitor(pub Option<TodoUser>);

/// The logged in user, available to handlers behind [require_login]
#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct AuthenticatedUser(pub TodoUser);

/// Queues a one-shot message for the next rendered page
pub async fn flash(session: &Session, message: &str) -> Result<(), anyhow::Error> {
    let mut flashes: Vec<String> = session
        .get(FLASHES_KEY)
        .await
        .context("Reading flash messages")?
        .unwrap_or_default();
    flashes.push(message.to_owned());

    session
        .insert(FLASHES_KEY, flashes)
        .await
        .context("Storing flash message")?;

    Ok(())
}

/// Gathers what every page shows around its content. Pending flash messages are consumed.
pub async fn page_context(session: &Session, visitor: &Visitor) -> Result<PageContext, anyhow::Error> {
    let flashes: Vec<String> = session
        .remove(FLASHES_KEY)
        .await
        .context("Taking flash messages")?
        .unwrap_or_default();

    Ok(PageContext {
        user: visitor.0.clone(),
        flashes,
    })
}

/// Marks the session as belonging to a user. The session ID is replaced first so an ID
/// handed out before login can't be used to ride along.
pub async fn establish(session: &Session, user_id: i64) -> Result<(), anyhow::Error> {
    session.cycle_id().await.context("Rotating session ID")?;
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .context("Storing user in session")?;

    info!(user_id, "Session established");
    Ok(())
}

/// Forgets everything about the session. Safe to call on an empty session.
pub async fn end(session: &Session) -> Result<(), anyhow::Error> {
    session.flush().await.context("Clearing session")
}

/// Resolves the session's user. A session pointing at a user which no longer exists is treated as anonymous.
async fn load_visitor(
    session: &Session,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Visitor, anyhow::Error> {
    let Some(user_id) = session
        .get::<i64>(USER_ID_KEY)
        .await
        .context("Reading user from session")?
    else {
        return Ok(Visitor(None));
    };

    let user_reader = persistence::db_user_driven_ports::DbReadUsers;
    let user = user_service.user_by_id(user_id, &mut *ext_cxn, &user_reader).await?;
    if user.is_none() {
        warn!(user_id, "Session refers to a missing user, dropping it");
        session
            .remove::<i64>(USER_ID_KEY)
            .await
            .context("Removing stale user from session")?;
    }

    Ok(Visitor(user))
}

/// Middleware which attaches a [Visitor] to every request
pub async fn identify_visitor(
    axum::extract::State(app_state): AppState,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, GenericErrorResponse> {
    let mut ext_cxn = app_state.ext_cxn.clone();
    let user_service = domain::user::UserService {};

    let visitor = load_visitor(&session, &mut ext_cxn, &user_service).await?;
    request.extensions_mut().insert(visitor);

    Ok(next.run(request).await)
}

/// Middleware for routes which need a logged in user. Anonymous visitors are sent to
/// the login page with a `next` parameter pointing back at what they asked for.
pub async fn require_login(Extension(visitor): Extension<Visitor>, mut request: Request, next: Next) -> Response {
    match visitor.0 {
        Some(user) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        None => login_redirect(request.uri()).into_response(),
    }
}

fn login_redirect(original: &Uri) -> Redirect {
    let original_target = original.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Redirect::to(&with_next("/login", original_target))
}

fn with_next(page: &str, target: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();

    format!("{page}?next={encoded}")
}

/// Checks that `next` stays on the host the request was sent to. Returns the path to redirect to
/// when it does.
pub fn safe_redirect_target(next: &str, host: &str) -> Option<String> {
    let origin = Url::parse(&format!("http://{host}/")).ok()?;
    let target = origin.join(next).ok()?;

    let same_site = matches!(target.scheme(), "http" | "https")
        && target.host_str() == origin.host_str()
        && target.port() == origin.port();
    if !same_site {
        return None;
    }

    Some(target[Position::BeforePath..].to_owned())
}

/// Where to send a visitor after they log in or sign up, taken from the `next` query parameter.
/// Requests whose `next` leaves the site are rejected.
#[cfg_attr(test, derive(Debug))]
pub struct RedirectTarget(pub Option<String>);

impl RedirectTarget {
    pub fn location(&self) -> &str {
        self.0.as_deref().unwrap_or("/")
    }

    /// Link to `page` which keeps the accepted target, so a visitor sent back to the login
    /// or sign up page still ends up where they were going
    pub fn carried_to(&self, page: &str) -> String {
        match &self.0 {
            Some(target) => with_next(page, target),
            None => page.to_owned(),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RedirectTarget {
    type Rejection = UnsafeRedirectResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let next = parts.uri.query().and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, value)| key == "next" && !value.is_empty())
                .map(|(_, value)| value.into_owned())
        });
        let Some(next) = next else {
            return Ok(RedirectTarget(None));
        };

        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| parts.uri.authority().map(|authority| authority.as_str()))
            .unwrap_or("localhost");

        match safe_redirect_target(&next, host) {
            Some(target) => Ok(RedirectTarget(Some(target))),
            None => {
                warn!(next = %next, host = %host, "Rejected redirect target");
                Err(UnsafeRedirectResponse)
            }
        }
    }
}
