use crate::domain;
use crate::domain::todo::driven_ports::TaskWriter;
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, Error};
use tracing::info;

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i64,
    pub folder_id: i64,
    pub content: String,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTask {
    pub content: String,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Every task in the system, ordered by ID
        async fn all_tasks(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task(
            &self,
            folder_id: i64,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;

        async fn delete_task(
            &self,
            task_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Removes every task in the given folder, returning how many were removed
        async fn delete_tasks_in_folder(
            &self,
            folder_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The specified folder did not exist.")]
        FolderDoesNotExist,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn create_task_in_folder(
            &self,
            folder_id: i64,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            folder_read: &impl domain::folder::driven_ports::FolderReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<i64, TaskError>;
        async fn delete_task(
            &self,
            task_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), anyhow::Error>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn create_task_in_folder(
        &self,
        folder_id: i64,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        folder_read: &impl domain::folder::driven_ports::FolderReader,
        task_write: &impl TaskWriter,
    ) -> Result<i64, TaskError> {
        let folder = folder_read
            .folder_by_id(folder_id, &mut *ext_cxn)
            .await
            .context("Looking up folder for new task")?;
        if folder.is_none() {
            return Err(TaskError::FolderDoesNotExist);
        }

        let created_task_id = task_write
            .create_task(folder_id, task, &mut *ext_cxn)
            .await?;
        info!(folder_id, task_id = created_task_id, "Created task");

        Ok(created_task_id)
    }

    async fn delete_task(
        &self,
        task_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), Error> {
        task_write
            .delete_task(task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;
        Ok(())
    }
}


#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::domain::folder::driven_ports::FolderReader;
    use crate::domain::test_util::{Connectivity, FakeImplementation};
    use crate::domain::todo::driven_ports::TaskReader;
    use crate::domain::todo::driving_ports::TaskPort;
    use std::sync::{Mutex, RwLock};

    pub struct InMemoryTaskPersistence {
        pub tasks: Vec<TodoTask>,
        pub connected: Connectivity,
        highest_task_id: i64,
    }

    pub struct NewTaskInFolder {
        pub folder_id: i64,
        pub task: NewTask,
    }

    impl InMemoryTaskPersistence {
        pub fn new() -> InMemoryTaskPersistence {
            InMemoryTaskPersistence {
                tasks: Vec::new(),
                connected: Connectivity::Connected,
                highest_task_id: 0,
            }
        }

        pub fn new_with_tasks(tasks: &[NewTaskInFolder]) -> InMemoryTaskPersistence {
            InMemoryTaskPersistence {
                tasks: tasks
                    .iter()
                    .enumerate()
                    .map(|(index, task_in_folder)| {
                        task_from_create(task_in_folder.folder_id, index as i64 + 1, &task_in_folder.task)
                    })
                    .collect(),
                connected: Connectivity::Connected,
                highest_task_id: tasks.len() as i64,
            }
        }

        pub fn new_locked() -> RwLock<InMemoryTaskPersistence> {
            RwLock::new(Self::new())
        }
    }

    impl TaskReader for RwLock<InMemoryTaskPersistence> {
        async fn all_tasks(
            &self,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, Error> {
            let persistence = self.read().expect("task persist rw lock poisoned");
            persistence.connected.blow_up_if_disconnected()?;

            Ok(persistence.tasks.clone())
        }
    }

    impl TaskWriter for RwLock<InMemoryTaskPersistence> {
        async fn create_task(
            &self,
            folder_id: i64,
            task: &NewTask,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, Error> {
            let mut persistence = self.write().expect("task persist rw lock poisoned");
            persistence.connected.blow_up_if_disconnected()?;

            persistence.highest_task_id += 1;
            let task_id = persistence.highest_task_id;
            persistence
                .tasks
                .push(task_from_create(folder_id, task_id, task));
            Ok(task_id)
        }

        async fn delete_task(
            &self,
            task_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), Error> {
            let mut persistence = self.write().expect("task persist rw lock poisoned");
            persistence.connected.blow_up_if_disconnected()?;

            persistence.tasks.retain(|task| task.id != task_id);

            Ok(())
        }

        async fn delete_tasks_in_folder(
            &self,
            folder_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, Error> {
            let mut persistence = self.write().expect("task persist rw lock poisoned");
            persistence.connected.blow_up_if_disconnected()?;

            let before = persistence.tasks.len();
            persistence.tasks.retain(|task| task.folder_id != folder_id);

            Ok((before - persistence.tasks.len()) as u64)
        }
    }

    pub fn task_from_create(folder_id: i64, task_id: i64, new_task: &NewTask) -> TodoTask {
        TodoTask {
            id: task_id,
            folder_id,
            content: new_task.content.clone(),
        }
    }

    pub struct MockTaskService {
        pub create_task_in_folder_result: FakeImplementation<(i64, NewTask), Result<i64, TaskError>>,
        pub delete_task_result: FakeImplementation<i64, Result<(), anyhow::Error>>,
    }

    impl MockTaskService {
        pub fn new() -> MockTaskService {
            MockTaskService {
                create_task_in_folder_result: FakeImplementation::new(),
                delete_task_result: FakeImplementation::new(),
            }
        }

        pub fn new_locked() -> Mutex<MockTaskService> {
            Mutex::new(MockTaskService::new())
        }
    }

    impl TaskPort for Mutex<MockTaskService> {
        async fn create_task_in_folder(
            &self,
            folder_id: i64,
            task: &NewTask,
            _ext_cxn: &mut impl ExternalConnectivity,
            _folder_read: &impl FolderReader,
            _task_write: &impl TaskWriter,
        ) -> Result<i64, TaskError> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self
                .create_task_in_folder_result
                .save_arguments((folder_id, task.clone()));

            locked_self
                .create_task_in_folder_result
                .return_value_result()
        }

        async fn delete_task(
            &self,
            task_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
            _task_write: &impl TaskWriter,
        ) -> Result<(), anyhow::Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.delete_task_result.save_arguments(task_id);

            locked_self.delete_task_result.return_value_anyhow()
        }
    }
}
