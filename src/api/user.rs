use crate::domain::user::driving_ports::{LoginError, RegisterError, UserPort};
use crate::dto::user::{LoginForm, RegisterForm};
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
use crate::password::Argon2Hasher;
use crate::routing_utils::{Form, GenericErrorResponse};
use crate::session::{self, RedirectTarget, Visitor};
use crate::{AppState, SharedData, domain, persistence, views};
use axum::extract::State;
use axum::response::{ErrorResponse, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};
use validator::Validate;

const ALREADY_REGISTERED: &str = "You've already signed up with that email, log in instead!";
const UNKNOWN_EMAIL: &str = "That email does not exist, please try again.";
const INCORRECT_PASSWORD: &str = "Password incorrect, please try again.";

/// Sign up and log in pages
pub fn public_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/register",
            get(|Extension(visitor): Extension<Visitor>, session: Session| async move {
                let ctx = session::page_context(&session, &visitor)
                    .await
                    .map_err(GenericErrorResponse)?;

                Ok::<_, ErrorResponse>(views::register_form(&ctx, &RegisterForm::default(), None))
            })
            .post(
                |State(app_state): AppState,
                 Extension(visitor): Extension<Visitor>,
                 session: Session,
                 redirect_target: RedirectTarget,
                 Form(register_form): Form<RegisterForm>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    register(
                        register_form,
                        &redirect_target,
                        &visitor,
                        &session,
                        &mut ext_cxn,
                        &user_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/login",
            get(|Extension(visitor): Extension<Visitor>, session: Session| async move {
                let ctx = session::page_context(&session, &visitor)
                    .await
                    .map_err(GenericErrorResponse)?;

                Ok::<_, ErrorResponse>(views::login_form(&ctx, &LoginForm::default(), None))
            })
            .post(
                |State(app_state): AppState,
                 Extension(visitor): Extension<Visitor>,
                 session: Session,
                 redirect_target: RedirectTarget,
                 Form(login_form): Form<LoginForm>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    log_in(login_form, &redirect_target, &visitor, &session, &mut ext_cxn, &user_service).await
                },
            ),
        )
}

/// Logging out needs a session to end
pub fn protected_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/logout",
        get(|session: Session| async move { log_out(&session).await })
            .post(|session: Session| async move { log_out(&session).await }),
    )
}

/// Signs up a new user and logs them in
async fn register(
    register_form: RegisterForm,
    redirect_target: &RedirectTarget,
    visitor: &Visitor,
    session: &Session,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Response, ErrorResponse> {
    info!("Attempt to register user: {}", register_form);
    if let Err(validation_errors) = register_form.validate() {
        let ctx = session::page_context(session, visitor)
            .await
            .map_err(GenericErrorResponse)?;
        return Ok(views::register_form(&ctx, &register_form, Some(&validation_errors)).into_response());
    }

    let new_user = domain::user::CreateUser::from(register_form);
    let user_detect = persistence::db_user_driven_ports::DbDetectUser;
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;

    let register_result = user_service
        .register(&new_user, &mut *ext_cxn, &user_detect, &user_writer, &Argon2Hasher)
        .await;
    match register_result {
        Ok(user) => {
            session::establish(session, user.id)
                .await
                .map_err(GenericErrorResponse)?;

            Ok(Redirect::to(redirect_target.location()).into_response())
        }
        Err(RegisterError::EmailAlreadyRegistered) => {
            session::flash(session, ALREADY_REGISTERED)
                .await
                .map_err(GenericErrorResponse)?;

            Ok(Redirect::to(&redirect_target.carried_to("/login")).into_response())
        }
        Err(RegisterError::PortError(err)) => Err(GenericErrorResponse(err).into()),
    }
}

/// Checks a user's credentials and starts their session
async fn log_in(
    login_form: LoginForm,
    redirect_target: &RedirectTarget,
    visitor: &Visitor,
    session: &Session,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Response, ErrorResponse> {
    if let Err(validation_errors) = login_form.validate() {
        let ctx = session::page_context(session, visitor)
            .await
            .map_err(GenericErrorResponse)?;
        return Ok(views::login_form(&ctx, &login_form, Some(&validation_errors)).into_response());
    }

    let credentials = domain::user::LoginCredentials::from(login_form);
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;

    let login_result = user_service
        .log_in(&credentials, &mut *ext_cxn, &user_reader, &Argon2Hasher)
        .await;
    let failure_flash = match login_result {
        Ok(user) => {
            session::establish(session, user.id)
                .await
                .map_err(GenericErrorResponse)?;
            info!(user_id = user.id, "User logged in");

            return Ok(Redirect::to(redirect_target.location()).into_response());
        }
        Err(LoginError::UnknownEmail) => (UNKNOWN_EMAIL, "/register"),
        Err(LoginError::IncorrectPassword) => (INCORRECT_PASSWORD, "/login"),
        Err(LoginError::PortError(err)) => return Err(GenericErrorResponse(err).into()),
    };

    let (message, destination) = failure_flash;
    warn!("Failed login attempt: {message}");
    session::flash(session, message)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(Redirect::to(&redirect_target.carried_to(destination)).into_response())
}

async fn log_out(session: &Session) -> Result<Redirect, ErrorResponse> {
    session::end(session).await.map_err(GenericErrorResponse)?;
    info!("User logged out");

    Ok(Redirect::to("/"))
}
