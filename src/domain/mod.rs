use thiserror::Error;

pub mod folder;
pub mod todo;
pub mod user;

#[cfg(test)]
pub(crate) mod test_util;

/// Failure of a driven port write which may collide with a uniqueness constraint
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("a record with the same unique value already exists")]
    AlreadyExists,
    #[error("a communication failure occurred: {0}")]
    CommsFailure(#[from] anyhow::Error),
}
