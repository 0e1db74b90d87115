use crate::domain;
use derive_more::Display;
use serde::Deserialize;
use validator::Validate;

/// Sign up form. Both the email and password have to be typed twice.
#[derive(Deserialize, Validate, Display, Default)]
#[cfg_attr(test, derive(Debug, Clone))]
#[display("{first_name} {last_name}")]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        custom(function = "super::not_blank"),
        length(max = 100, message = "First names can be at most 100 characters.")
    )]
    pub first_name: String,
    #[serde(default)]
    #[validate(
        custom(function = "super::not_blank"),
        length(max = 100, message = "Last names can be at most 100 characters.")
    )]
    pub last_name: String,
    #[serde(default)]
    #[validate(
        email(message = "Invalid email address."),
        length(max = 100, message = "Emails can be at most 100 characters.")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(must_match(other = "email", message = "Emails must match"))]
    pub confirm_email: String,
    #[serde(default)]
    #[validate(
        custom(function = "super::not_blank"),
        length(max = 100, message = "Passwords can be at most 100 characters.")
    )]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

impl From<RegisterForm> for domain::user::CreateUser {
    fn from(value: RegisterForm) -> Self {
        domain::user::CreateUser {
            first_name: value.first_name.trim().to_owned(),
            last_name: value.last_name.trim().to_owned(),
            email: value.email,
            password: value.password,
        }
    }
}

#[derive(Deserialize, Validate, Default)]
#[cfg_attr(test, derive(Debug, Clone))]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "super::not_blank"))]
    pub password: String,
}

impl From<LoginForm> for domain::user::LoginCredentials {
    fn from(value: LoginForm) -> Self {
        domain::user::LoginCredentials {
            email: value.email,
            password: value.password,
        }
    }
}
