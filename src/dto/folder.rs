use crate::domain;
use serde::Deserialize;
use validator::Validate;

/// Form for creating a folder
#[derive(Deserialize, Validate, Default)]
#[cfg_attr(test, derive(Debug, Clone))]
pub struct FolderForm {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        custom(function = "super::not_blank"),
        length(max = 40, message = "Folder titles can be at most 40 characters.")
    )]
    pub title: String,
}

impl From<&FolderForm> for domain::folder::NewFolder {
    fn from(value: &FolderForm) -> Self {
        domain::folder::NewFolder {
            title: value.title.trim().to_owned(),
        }
    }
}
