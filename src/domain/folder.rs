use crate::domain::WriteError;
use crate::domain::folder::driving_ports::CreateFolderError;
use crate::domain::todo::TodoTask;
use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use std::collections::HashMap;
use tracing::info;

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Folder {
    pub id: i64,
    pub title: String,
    /// Folders created before accounts existed have no owner
    pub owner_user_id: Option<i64>,
}

/// A folder along with every task filed under it
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct FolderWithTasks {
    pub folder: Folder,
    pub tasks: Vec<TodoTask>,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewFolder {
    pub title: String,
}

pub mod driven_ports {
    use super::*;

    pub trait FolderReader {
        /// Every folder in the system, ordered by ID
        async fn all_folders(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Folder>, anyhow::Error>;
        async fn folder_by_id(
            &self,
            folder_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Folder>, anyhow::Error>;
    }

    pub trait FolderWriter {
        /// Stores a new folder. Fails with [WriteError::AlreadyExists] if the title is taken.
        async fn create_folder(
            &self,
            owner_user_id: i64,
            new_folder: &NewFolder,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, WriteError>;

        /// Removes a folder row. Does not touch the folder's tasks.
        async fn delete_folder(
            &self,
            folder_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CreateFolderError {
        #[error("Folder already exists")]
        AlreadyExists,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait FolderPort {
        async fn folders_with_tasks(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            folder_read: &impl driven_ports::FolderReader,
            task_read: &impl TaskReader,
        ) -> Result<Vec<FolderWithTasks>, anyhow::Error>;
        async fn folder_by_id(
            &self,
            folder_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            folder_read: &impl driven_ports::FolderReader,
        ) -> Result<Option<Folder>, anyhow::Error>;
        async fn create_folder(
            &self,
            owner_user_id: i64,
            new_folder: &NewFolder,
            ext_cxn: &mut impl ExternalConnectivity,
            folder_write: &impl driven_ports::FolderWriter,
        ) -> Result<i64, CreateFolderError>;
        async fn delete_folder(
            &self,
            folder_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            folder_write: &impl driven_ports::FolderWriter,
            task_write: &impl TaskWriter,
        ) -> Result<(), anyhow::Error>;
    }
}

pub struct FolderService {}

impl driving_ports::FolderPort for FolderService {
    async fn folders_with_tasks(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        folder_read: &impl driven_ports::FolderReader,
        task_read: &impl TaskReader,
    ) -> Result<Vec<FolderWithTasks>, anyhow::Error> {
        let folders = folder_read
            .all_folders(&mut *ext_cxn)
            .await
            .context("Fetching folders")?;
        let tasks = task_read
            .all_tasks(&mut *ext_cxn)
            .await
            .context("Fetching tasks for folders")?;

        let mut tasks_by_folder: HashMap<i64, Vec<TodoTask>> = HashMap::new();
        for task in tasks {
            tasks_by_folder.entry(task.folder_id).or_default().push(task);
        }

        Ok(folders
            .into_iter()
            .map(|folder| FolderWithTasks {
                tasks: tasks_by_folder.remove(&folder.id).unwrap_or_default(),
                folder,
            })
            .collect())
    }

    async fn folder_by_id(
        &self,
        folder_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        folder_read: &impl driven_ports::FolderReader,
    ) -> Result<Option<Folder>, anyhow::Error> {
        folder_read
            .folder_by_id(folder_id, &mut *ext_cxn)
            .await
            .context("Fetching a folder by ID")
    }

    async fn create_folder(
        &self,
        owner_user_id: i64,
        new_folder: &NewFolder,
        ext_cxn: &mut impl ExternalConnectivity,
        folder_write: &impl driven_ports::FolderWriter,
    ) -> Result<i64, CreateFolderError> {
        match folder_write
            .create_folder(owner_user_id, new_folder, &mut *ext_cxn)
            .await
        {
            Ok(folder_id) => {
                info!(folder_id, owner_user_id, "Created folder");
                Ok(folder_id)
            }
            Err(WriteError::AlreadyExists) => Err(CreateFolderError::AlreadyExists),
            Err(WriteError::CommsFailure(err)) => Err(err.context("creating a folder").into()),
        }
    }

    async fn delete_folder(
        &self,
        folder_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        folder_write: &impl driven_ports::FolderWriter,
        task_write: &impl TaskWriter,
    ) -> Result<(), anyhow::Error> {
        let removed_tasks = task_write
            .delete_tasks_in_folder(folder_id, &mut *ext_cxn)
            .await
            .context("deleting the tasks of a folder")?;
        folder_write
            .delete_folder(folder_id, &mut *ext_cxn)
            .await
            .context("deleting a folder")?;
        info!(folder_id, removed_tasks, "Deleted folder");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::domain::folder::driving_ports::FolderPort;
    use crate::domain::test_util::Connectivity;
    use crate::domain::todo::NewTask;
    use crate::domain::todo::test_util::{InMemoryTaskPersistence, NewTaskInFolder};
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    fn task_in(folder_id: i64, content: &str) -> NewTaskInFolder {
        NewTaskInFolder {
            folder_id,
            task: NewTask {
                content: content.to_owned(),
            },
        }
    }

    mod folders_with_tasks {
        use super::*;

        #[tokio::test]
        async fn groups_tasks_under_their_folders() {
            let folder_persist =
                RwLock::new(InMemoryFolderPersistence::new_with_titles(&["Chores", "Work", "Empty"]));
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                task_in(2, "Write report"),
                task_in(1, "Dishes"),
                task_in(1, "Laundry"),
            ]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let listing = FolderService {}
                .folders_with_tasks(&mut ext_cxn, &folder_persist, &task_persist)
                .await;
            assert_that!(listing).is_ok().matches(|folders| {
                matches!(folders.as_slice(), [
                    FolderWithTasks { folder: Folder { id: 1, .. }, tasks: chores },
                    FolderWithTasks { folder: Folder { id: 2, .. }, tasks: work },
                    FolderWithTasks { folder: Folder { id: 3, .. }, tasks: empty },
                ] if chores.iter().map(|t| t.content.as_str()).collect::<Vec<_>>() == ["Dishes", "Laundry"]
                    && work.len() == 1
                    && empty.is_empty())
            });
        }

        #[tokio::test]
        async fn propagates_port_error() {
            let mut raw_folders = InMemoryFolderPersistence::new();
            raw_folders.connectivity = Connectivity::Disconnected;
            let folder_persist = RwLock::new(raw_folders);
            let task_persist = InMemoryTaskPersistence::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let listing = FolderService {}
                .folders_with_tasks(&mut ext_cxn, &folder_persist, &task_persist)
                .await;
            assert_that!(listing).is_err();
        }
    }

    mod create_folder {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let folder_persist = InMemoryFolderPersistence::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let new_folder = NewFolder {
                title: "Groceries".to_owned(),
            };

            let create_result = FolderService {}
                .create_folder(4, &new_folder, &mut ext_cxn, &folder_persist)
                .await;
            assert_that!(create_result).is_ok_containing(1);

            let locked_folders = folder_persist.read().expect("folder rwlock poisoned");
            assert!(matches!(locked_folders.folders.as_slice(), [
                Folder {
                    id: 1,
                    title,
                    owner_user_id: Some(4),
                }
            ] if title == "Groceries"));
        }

        #[tokio::test]
        async fn rejects_duplicate_title() {
            let folder_persist =
                RwLock::new(InMemoryFolderPersistence::new_with_titles(&["Groceries"]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let new_folder = NewFolder {
                title: "Groceries".to_owned(),
            };

            let create_result = FolderService {}
                .create_folder(1, &new_folder, &mut ext_cxn, &folder_persist)
                .await;
            let Err(CreateFolderError::AlreadyExists) = create_result else {
                panic!("Duplicate title should have been refused: {create_result:#?}");
            };

            let locked_folders = folder_persist.read().expect("folder rwlock poisoned");
            assert_eq!(1, locked_folders.folders.len());
        }

        #[tokio::test]
        async fn propagates_port_error() {
            let mut raw_folders = InMemoryFolderPersistence::new();
            raw_folders.connectivity = Connectivity::Disconnected;
            let folder_persist = RwLock::new(raw_folders);
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let new_folder = NewFolder {
                title: "Groceries".to_owned(),
            };

            let create_result = FolderService {}
                .create_folder(1, &new_folder, &mut ext_cxn, &folder_persist)
                .await;
            assert_that!(create_result)
                .is_err()
                .matches(|err| matches!(err, CreateFolderError::PortError(_)));
        }
    }

    mod delete_folder {
        use super::*;

        #[tokio::test]
        async fn removes_folder_and_its_tasks() {
            let folder_persist =
                RwLock::new(InMemoryFolderPersistence::new_with_titles(&["Chores", "Work"]));
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                task_in(1, "Dishes"),
                task_in(2, "Write report"),
                task_in(1, "Laundry"),
            ]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = FolderService {}
                .delete_folder(1, &mut ext_cxn, &folder_persist, &task_persist)
                .await;
            assert_that!(delete_result).is_ok();

            let locked_folders = folder_persist.read().expect("folder rwlock poisoned");
            assert!(matches!(locked_folders.folders.as_slice(), [Folder { id: 2, .. }]));
            let locked_tasks = task_persist.read().expect("task rwlock poisoned");
            assert!(matches!(locked_tasks.tasks.as_slice(), [
                TodoTask { folder_id: 2, content, .. }
            ] if content == "Write report"));
        }

        #[tokio::test]
        async fn missing_folder_is_a_no_op() {
            let folder_persist = RwLock::new(InMemoryFolderPersistence::new_with_titles(&["Chores"]));
            let task_persist =
                RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[task_in(1, "Dishes")]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = FolderService {}
                .delete_folder(42, &mut ext_cxn, &folder_persist, &task_persist)
                .await;
            assert_that!(delete_result).is_ok();

            assert_eq!(1, folder_persist.read().expect("folder rwlock poisoned").folders.len());
            assert_eq!(1, task_persist.read().expect("task rwlock poisoned").tasks.len());
        }

        #[tokio::test]
        async fn keeps_folder_when_tasks_cannot_be_removed() {
            let folder_persist = RwLock::new(InMemoryFolderPersistence::new_with_titles(&["Chores"]));
            let mut raw_tasks = InMemoryTaskPersistence::new();
            raw_tasks.connected = Connectivity::Disconnected;
            let task_persist = RwLock::new(raw_tasks);
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = FolderService {}
                .delete_folder(1, &mut ext_cxn, &folder_persist, &task_persist)
                .await;
            assert_that!(delete_result).is_err();
            assert_eq!(1, folder_persist.read().expect("folder rwlock poisoned").folders.len());
        }
    }
}
