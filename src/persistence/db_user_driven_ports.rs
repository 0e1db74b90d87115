use crate::domain;
use crate::domain::WriteError;
use crate::domain::user::TodoUser;
use crate::domain::user::driven_ports::{HashedNewUser, StoredCredentials};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{FromRow, query, query_as};

pub struct DbDetectUser;

#[derive(FromRow)]
struct Count {
    count: i64,
}

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_with_email_exists(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let user_with_email_count = query_as::<_, Count>("SELECT count(*) AS count FROM todo_user tu WHERE tu.email = ?")
            .bind(email)
            .fetch_one(connection.borrow_connection())
            .await
            .context("Detecting user via email")?;

        Ok(user_with_email_count.count > 0)
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct TodoUserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
        }
    }
}

impl From<TodoUserRow> for StoredCredentials {
    fn from(mut value: TodoUserRow) -> Self {
        let password_hash = std::mem::take(&mut value.password);
        StoredCredentials {
            user: TodoUser::from(value),
            password_hash,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_by_id(&self, id: i64, ext_cxn: &mut impl ExternalConnectivity) -> Result<Option<TodoUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, TodoUserRow>("SELECT * FROM todo_user tu WHERE tu.id = ?")
            .bind(id)
            .fetch_optional(cxn_handle.borrow_connection())
            .await
            .context("Fetching a user by id")?;

        Ok(user.map(TodoUser::from))
    }

    async fn credentials_by_email(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<StoredCredentials>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, TodoUserRow>("SELECT * FROM todo_user tu WHERE tu.email = ?")
            .bind(email)
            .fetch_optional(cxn_handle.borrow_connection())
            .await
            .context("Fetching a user by email")?;

        Ok(user.map(StoredCredentials::from))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &HashedNewUser<'_>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, WriteError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let result = query("INSERT INTO todo_user(first_name, last_name, email, password) VALUES (?, ?, ?, ?)")
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(&user.password_hash)
            .execute(cxn_handle.borrow_connection())
            .await
            .map_err(|err| super::classify_write_error(err, "Inserting new user"))?;

        Ok(result.last_insert_rowid())
    }
}
