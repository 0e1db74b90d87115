use crate::domain::WriteError;
use crate::domain::user::driving_ports::{LoginError, RegisterError};
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use anyhow::Context;
use tracing::{error, info};

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TodoUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Details of a user signing up. The password is still in plaintext here.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

pub mod driven_ports {
    use super::*;

    /// A user about to be stored, with the password already hashed
    pub struct HashedNewUser<'user> {
        pub first_name: &'user str,
        pub last_name: &'user str,
        pub email: &'user str,
        pub password_hash: String,
    }

    /// A stored user along with the hash their password is checked against
    #[cfg_attr(test, derive(Debug))]
    pub struct StoredCredentials {
        pub user: TodoUser,
        pub password_hash: String,
    }

    pub trait UserReader {
        async fn get_by_id(
            &self,
            id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
        async fn credentials_by_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<StoredCredentials>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            user: &HashedNewUser<'_>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, WriteError>;
    }

    pub trait DetectUser {
        async fn user_with_email_exists(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    /// One-way salted password hashing
    pub trait HashPassword {
        async fn hash(&self, plaintext: &str) -> Result<String, anyhow::Error>;
        async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error("A user with that email is already registered.")]
        EmailAlreadyRegistered,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum LoginError {
        #[error("No user is registered with that email.")]
        UnknownEmail,
        #[error("The password did not match.")]
        IncorrectPassword,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait UserPort {
        /// Stores a new user. The password is hashed before the write transaction opens,
        /// and the transaction is committed before this returns.
        async fn register(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            u_detect: &impl driven_ports::DetectUser,
            u_writer: &impl driven_ports::UserWriter,
            hasher: &impl driven_ports::HashPassword,
        ) -> Result<TodoUser, RegisterError>;
        async fn log_in(
            &self,
            credentials: &LoginCredentials,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
            hasher: &impl driven_ports::HashPassword,
        ) -> Result<TodoUser, LoginError>;
        async fn user_by_id(
            &self,
            user_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn register(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        u_detect: &impl driven_ports::DetectUser,
        u_writer: &impl driven_ports::UserWriter,
        hasher: &impl driven_ports::HashPassword,
    ) -> Result<TodoUser, RegisterError> {
        // Hashing is slow, so it must not happen while holding the write lock
        let password_hash = hasher
            .hash(&new_user.password)
            .await
            .context("Hashing password during registration")?;
        let to_store = driven_ports::HashedNewUser {
            first_name: &new_user.first_name,
            last_name: &new_user.last_name,
            email: &new_user.email,
            password_hash,
        };

        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("Starting registration transaction")?;
        let already_registered = u_detect
            .user_with_email_exists(&new_user.email, &mut txn)
            .await
            .context("Looking up email during registration")?;
        if already_registered {
            return Err(RegisterError::EmailAlreadyRegistered);
        }

        let user_id = match u_writer.create_user(&to_store, &mut txn).await {
            Ok(id) => id,
            // Lost a race with another registration for the same email
            Err(WriteError::AlreadyExists) => return Err(RegisterError::EmailAlreadyRegistered),
            Err(WriteError::CommsFailure(err)) => {
                return Err(err.context("Trying to create user at service level").into());
            }
        };
        txn.commit()
            .await
            .context("Committing registration transaction")?;
        info!(user_id, "Registered new user");

        Ok(TodoUser {
            id: user_id,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            email: new_user.email.clone(),
        })
    }

    async fn log_in(
        &self,
        credentials: &LoginCredentials,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
        hasher: &impl driven_ports::HashPassword,
    ) -> Result<TodoUser, LoginError> {
        let Some(stored) = u_reader
            .credentials_by_email(&credentials.email, &mut *ext_cxn)
            .await
            .context("Looking up user during login")?
        else {
            return Err(LoginError::UnknownEmail);
        };

        let password_matches = hasher
            .verify(&credentials.password, &stored.password_hash)
            .await
            .context("Verifying password during login")?;
        if !password_matches {
            return Err(LoginError::IncorrectPassword);
        }

        Ok(stored.user)
    }

    async fn user_by_id(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Option<TodoUser>, anyhow::Error> {
        let user_result = u_reader.get_by_id(user_id, &mut *ext_cxn).await;
        if let Err(ref port_err) = user_result {
            error!("User fetch failure: {port_err}");
        }

        user_result.context("Failed fetching user")
    }
}
