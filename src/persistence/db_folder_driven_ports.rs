use crate::domain;
use crate::domain::WriteError;
use crate::domain::folder::{Folder, NewFolder};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{FromRow, query, query_as};

pub struct DbFolderReader;

#[derive(FromRow)]
struct FolderRow {
    id: i64,
    title: String,
    user_id: Option<i64>,
}

impl From<FolderRow> for Folder {
    fn from(value: FolderRow) -> Self {
        Folder {
            id: value.id,
            title: value.title,
            owner_user_id: value.user_id,
        }
    }
}

impl domain::folder::driven_ports::FolderReader for DbFolderReader {
    async fn all_folders(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<Folder>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let folders = query_as::<_, FolderRow>("SELECT f.id, f.title, f.user_id FROM folder f ORDER BY f.id")
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch all folders")?
            .into_iter()
            .map(Folder::from)
            .collect();

        Ok(folders)
    }

    async fn folder_by_id(
        &self,
        folder_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Folder>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let folder = query_as::<_, FolderRow>("SELECT f.id, f.title, f.user_id FROM folder f WHERE f.id = ?")
            .bind(folder_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to fetch a folder by ID")?
            .map(Folder::from);

        Ok(folder)
    }
}

pub struct DbFolderWriter;

impl domain::folder::driven_ports::FolderWriter for DbFolderWriter {
    async fn create_folder(
        &self,
        owner_user_id: i64,
        new_folder: &NewFolder,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, WriteError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("INSERT INTO folder(title, user_id) VALUES (?, ?)")
            .bind(&new_folder.title)
            .bind(owner_user_id)
            .execute(cxn.borrow_connection())
            .await
            .map_err(|err| super::classify_write_error(err, "trying to insert a new folder"))?;

        Ok(result.last_insert_rowid())
    }

    async fn delete_folder(&self, folder_id: i64, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("DELETE FROM folder WHERE id = ?")
            .bind(folder_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a folder from the database")?;

        Ok(())
    }
}
