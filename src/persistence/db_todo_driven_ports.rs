use crate::domain;
use crate::domain::todo::{NewTask, TodoTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{FromRow, query, query_as};

pub struct DbTaskReader;

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    folder_id: i64,
    content: String,
}

impl From<TaskRow> for domain::todo::TodoTask {
    fn from(value: TaskRow) -> Self {
        TodoTask {
            id: value.id,
            folder_id: value.folder_id,
            content: value.content,
        }
    }
}

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn all_tasks(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<TodoTask> = query_as::<_, TaskRow>("SELECT t.id, t.folder_id, t.content FROM task t ORDER BY t.id")
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch all tasks")?
            .into_iter()
            .map(domain::todo::TodoTask::from)
            .collect();

        Ok(tasks)
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        folder_id: i64,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("INSERT INTO task(content, folder_id) VALUES (?, ?)")
            .bind(&new_task.content)
            .bind(folder_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to insert a new task into the database")?;

        Ok(result.last_insert_rowid())
    }

    async fn delete_task(&self, task_id: i64, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("DELETE FROM task WHERE id = ?")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(())
    }

    async fn delete_tasks_in_folder(
        &self,
        folder_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<u64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("DELETE FROM task WHERE folder_id = ?")
            .bind(folder_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove the tasks of a folder")?;

        Ok(result.rows_affected())
    }
}
