use crate::domain::folder::driving_ports::FolderPort;
use crate::domain::todo::driving_ports::{TaskError, TaskPort};
use crate::dto::task::TaskForm;
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle};
use crate::routing_utils::{Form, GenericErrorResponse, NotFoundResponse};
use crate::session::{self, Visitor};
use crate::{AppState, SharedData, domain, persistence, views};
use axum::extract::{Path, State};
use axum::response::{ErrorResponse, Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};
use validator::Validate;

/// Adds routes for adding and removing tasks. All of them need a logged in user.
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/add/task/{folder_id}",
            get(
                |State(app_state): AppState,
                 Path(folder_id): Path<i64>,
                 Extension(visitor): Extension<Visitor>,
                 session: Session| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let folder_service = domain::folder::FolderService {};

                    new_task_form(folder_id, &visitor, &session, &mut ext_cxn, &folder_service).await
                },
            )
            .post(
                |State(app_state): AppState,
                 Path(folder_id): Path<i64>,
                 Extension(visitor): Extension<Visitor>,
                 session: Session,
                 Form(task_form): Form<TaskForm>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let folder_service = domain::folder::FolderService {};
                    let task_service = domain::todo::TaskService {};

                    create_task(
                        folder_id,
                        task_form,
                        &visitor,
                        &session,
                        &mut ext_cxn,
                        &folder_service,
                        &task_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/del/task/{task_id}",
            get(|State(app_state): AppState, Path(task_id): Path<i64>| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let task_service = domain::todo::TaskService {};

                delete_task(task_id, &mut ext_cxn, &task_service).await
            }),
        )
}

/// Renders the add-task form, or fails with a 404 if the folder doesn't exist
async fn task_form_page(
    folder_id: i64,
    task_form: &TaskForm,
    validation_errors: Option<&validator::ValidationErrors>,
    visitor: &Visitor,
    session: &Session,
    ext_cxn: &mut impl ExternalConnectivity,
    folder_service: &impl FolderPort,
) -> Result<Html<String>, ErrorResponse> {
    let folder_reader = persistence::db_folder_driven_ports::DbFolderReader;
    let Some(folder) = folder_service
        .folder_by_id(folder_id, &mut *ext_cxn, &folder_reader)
        .await
        .map_err(GenericErrorResponse)?
    else {
        warn!(folder_id, "Tried to add a task to a folder which doesn't exist");
        return Err(NotFoundResponse.into());
    };

    let ctx = session::page_context(session, visitor)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(views::task_form(&ctx, &folder, task_form, validation_errors))
}

async fn new_task_form(
    folder_id: i64,
    visitor: &Visitor,
    session: &Session,
    ext_cxn: &mut impl ExternalConnectivity,
    folder_service: &impl FolderPort,
) -> Result<Html<String>, ErrorResponse> {
    task_form_page(
        folder_id,
        &TaskForm::default(),
        None,
        visitor,
        session,
        &mut *ext_cxn,
        folder_service,
    )
    .await
}

/// Adds a task to a folder
async fn create_task(
    folder_id: i64,
    task_form: TaskForm,
    visitor: &Visitor,
    session: &Session,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    folder_service: &impl FolderPort,
    task_service: &impl TaskPort,
) -> Result<Response, ErrorResponse> {
    info!(folder_id, "Adding task");
    if let Err(validation_errors) = task_form.validate() {
        let page = task_form_page(
            folder_id,
            &task_form,
            Some(&validation_errors),
            visitor,
            session,
            &mut *ext_cxn,
            folder_service,
        )
        .await?;
        return Ok(page.into_response());
    }

    let new_task = domain::todo::NewTask::from(task_form);
    let folder_reader = persistence::db_folder_driven_ports::DbFolderReader;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;
    let mut txn = ext_cxn.start_transaction().await.map_err(GenericErrorResponse)?;

    let create_result = task_service
        .create_task_in_folder(folder_id, &new_task, &mut txn, &folder_reader, &task_writer)
        .await;
    match create_result {
        Ok(task_id) => {
            txn.commit().await.map_err(GenericErrorResponse)?;
            info!(task_id, folder_id, "Task created");
            Ok(Redirect::to("/").into_response())
        }
        Err(TaskError::FolderDoesNotExist) => Err(NotFoundResponse.into()),
        Err(TaskError::PortError(err)) => Err(GenericErrorResponse(err).into()),
    }
}

/// Deletes a task. Unknown tasks are ignored.
async fn delete_task(
    task_id: i64,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Redirect, ErrorResponse> {
    info!(task_id, "Deleting task");
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;
    let mut txn = ext_cxn.start_transaction().await.map_err(GenericErrorResponse)?;

    task_service
        .delete_task(task_id, &mut txn, &task_writer)
        .await
        .map_err(GenericErrorResponse)?;
    txn.commit().await.map_err(GenericErrorResponse)?;

    Ok(Redirect::to("/"))
}
