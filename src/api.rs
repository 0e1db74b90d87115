pub mod folder;
pub mod todo;
pub mod user;

#[cfg(test)]
mod test_util;
