use crate::domain::folder::driving_ports::{CreateFolderError, FolderPort};
use crate::domain::user::TodoUser;
use crate::dto::folder::FolderForm;
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle};
use crate::routing_utils::{Form, GenericErrorResponse};
use crate::session::{self, AuthenticatedUser, Visitor};
use crate::{AppState, SharedData, domain, persistence, views};
use axum::extract::{Path, State};
use axum::response::{ErrorResponse, Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::info;
use validator::Validate;

/// Routes anyone can visit
pub fn public_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/",
        get(
            |State(app_state): AppState, Extension(visitor): Extension<Visitor>, session: Session| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let folder_service = domain::folder::FolderService {};

                list_folders(&visitor, &session, &mut ext_cxn, &folder_service).await
            },
        ),
    )
}

/// Routes for changing folders, which need a logged in user
pub fn protected_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/add/folder",
            get(|Extension(visitor): Extension<Visitor>, session: Session| async move {
                let ctx = session::page_context(&session, &visitor)
                    .await
                    .map_err(GenericErrorResponse)?;

                Ok::<_, ErrorResponse>(views::folder_form(&ctx, &FolderForm::default(), None))
            })
            .post(
                |State(app_state): AppState,
                 Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
                 Extension(visitor): Extension<Visitor>,
                 session: Session,
                 Form(folder_form): Form<FolderForm>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let folder_service = domain::folder::FolderService {};

                    create_folder(&user, &visitor, &session, folder_form, &mut ext_cxn, &folder_service).await
                },
            ),
        )
        .route(
            "/del/folder/{folder_id}",
            get(|State(app_state): AppState, Path(folder_id): Path<i64>| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let folder_service = domain::folder::FolderService {};

                delete_folder(folder_id, &mut ext_cxn, &folder_service).await
            }),
        )
}

/// Renders every folder along with its tasks
async fn list_folders(
    visitor: &Visitor,
    session: &Session,
    ext_cxn: &mut impl ExternalConnectivity,
    folder_service: &impl FolderPort,
) -> Result<Html<String>, ErrorResponse> {
    info!("Listing folders");
    let folder_reader = persistence::db_folder_driven_ports::DbFolderReader;
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;

    let folders = folder_service
        .folders_with_tasks(&mut *ext_cxn, &folder_reader, &task_reader)
        .await
        .map_err(GenericErrorResponse)?;
    let ctx = session::page_context(session, visitor)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(views::home(&ctx, &folders))
}

/// Creates a folder owned by the current user. Duplicate titles are flashed back on the form.
async fn create_folder(
    user: &TodoUser,
    visitor: &Visitor,
    session: &Session,
    folder_form: FolderForm,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    folder_service: &impl FolderPort,
) -> Result<Response, ErrorResponse> {
    info!(user_id = user.id, "Creating folder");
    if let Err(validation_errors) = folder_form.validate() {
        let ctx = session::page_context(session, visitor)
            .await
            .map_err(GenericErrorResponse)?;
        return Ok(views::folder_form(&ctx, &folder_form, Some(&validation_errors)).into_response());
    }

    let new_folder = domain::folder::NewFolder::from(&folder_form);
    let folder_writer = persistence::db_folder_driven_ports::DbFolderWriter;
    let mut txn = ext_cxn.start_transaction().await.map_err(GenericErrorResponse)?;

    let create_result = folder_service
        .create_folder(user.id, &new_folder, &mut txn, &folder_writer)
        .await;
    match create_result {
        Ok(folder_id) => {
            txn.commit().await.map_err(GenericErrorResponse)?;
            info!(folder_id, "Folder created");
            Ok(Redirect::to("/").into_response())
        }
        Err(err @ CreateFolderError::AlreadyExists) => {
            drop(txn);
            session::flash(session, &err.to_string())
                .await
                .map_err(GenericErrorResponse)?;
            let ctx = session::page_context(session, visitor)
                .await
                .map_err(GenericErrorResponse)?;

            Ok(views::folder_form(&ctx, &folder_form, None).into_response())
        }
        Err(CreateFolderError::PortError(err)) => Err(GenericErrorResponse(err).into()),
    }
}

/// Deletes a folder and every task in it. Unknown folders are ignored.
async fn delete_folder(
    folder_id: i64,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    folder_service: &impl FolderPort,
) -> Result<Redirect, ErrorResponse> {
    info!(folder_id, "Deleting folder");
    let folder_writer = persistence::db_folder_driven_ports::DbFolderWriter;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;
    let mut txn = ext_cxn.start_transaction().await.map_err(GenericErrorResponse)?;

    folder_service
        .delete_folder(folder_id, &mut txn, &folder_writer, &task_writer)
        .await
        .map_err(GenericErrorResponse)?;
    txn.commit().await.map_err(GenericErrorResponse)?;

    Ok(Redirect::to("/"))
}
