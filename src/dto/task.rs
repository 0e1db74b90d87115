use crate::domain;
use serde::Deserialize;
use validator::Validate;

/// Form for adding a task to a folder
#[derive(Deserialize, Validate, Default)]
#[cfg_attr(test, derive(Debug, Clone))]
pub struct TaskForm {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        custom(function = "super::not_blank"),
        length(max = 100, message = "Tasks can be at most 100 characters.")
    )]
    pub content: String,
}

impl From<TaskForm> for domain::todo::NewTask {
    fn from(value: TaskForm) -> Self {
        domain::todo::NewTask {
            content: value.content.trim().to_owned(),
        }
    }
}
