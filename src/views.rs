use crate::domain::folder::{Folder, FolderWithTasks};
use crate::domain::user::TodoUser;
use crate::dto::folder::FolderForm;
use crate::dto::task::TaskForm;
use crate::dto::user::{LoginForm, RegisterForm};
use axum::response::Html;
use html_escape::{encode_double_quoted_attribute, encode_text};
use validator::ValidationErrors;

/// Per-request details shown around every page: who is logged in and any pending flash messages
#[derive(Default)]
#[cfg_attr(test, derive(Debug, Clone))]
pub struct PageContext {
    pub user: Option<TodoUser>,
    pub flashes: Vec<String>,
}

fn layout(ctx: &PageContext, title: &str, content: &str) -> Html<String> {
    let nav_links = match &ctx.user {
        Some(user) => format!(
            r#"<span class="user">Logged in as {} {}</span> <a href="/logout">Log out</a>"#,
            encode_text(&user.first_name),
            encode_text(&user.last_name),
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_owned(),
    };

    let mut flashes = String::new();
    if !ctx.flashes.is_empty() {
        flashes.push_str(r#"<ul class="flashes">"#);
        for message in &ctx.flashes {
            flashes.push_str(&format!("<li>{}</li>", encode_text(message)));
        }
        flashes.push_str("</ul>");
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav><a href="/">Folders</a> {nav_links}</nav>
{flashes}
<main>
{content}
</main>
</body>
</html>
"#,
        title = encode_text(title),
    ))
}

/// Home page listing every folder with its tasks
pub fn home(ctx: &PageContext, folders: &[FolderWithTasks]) -> Html<String> {
    let mut content = String::from("<h1>Folders</h1>\n");

    if folders.is_empty() {
        content.push_str("<p>No folders yet.</p>\n");
    }

    for FolderWithTasks { folder, tasks } in folders {
        content.push_str(&format!(
            r#"<section class="folder"><h2>{title}</h2> <a href="/add/task/{id}">Add task</a> <a href="/del/folder/{id}">Delete folder</a><ul>"#,
            title = encode_text(&folder.title),
            id = folder.id,
        ));
        for task in tasks {
            content.push_str(&format!(
                r#"<li>{} <a href="/del/task/{}">Delete</a></li>"#,
                encode_text(&task.content),
                task.id,
            ));
        }
        content.push_str("</ul></section>\n");
    }

    content.push_str(r#"<p><a href="/add/folder">Add folder</a></p>"#);

    layout(ctx, "Folders", &content)
}

/// Renders the messages attached to a field by a failed validation
fn field_errors(errors: Option<&ValidationErrors>, field: &str) -> String {
    let Some(field_errors) = errors.and_then(|errors| errors.field_errors().get(field).copied()) else {
        return String::new();
    };

    let mut rendered = String::from(r#"<ul class="errors">"#);
    for error in field_errors {
        let message = error
            .message
            .as_ref()
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
        rendered.push_str(&format!("<li>{}</li>", encode_text(&message)));
    }
    rendered.push_str("</ul>");

    rendered
}

fn input(errors: Option<&ValidationErrors>, label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        r#"<p><label for="{name}">{label}</label> <input id="{name}" name="{name}" type="{kind}" value="{value}">{errors}</p>"#,
        label = encode_text(label),
        value = encode_double_quoted_attribute(value),
        errors = field_errors(errors, name),
    )
}

fn form(fields: &[String], submit: &str) -> String {
    format!(
        r#"<form method="post">{}<p><button type="submit">{}</button></p></form>"#,
        fields.concat(),
        encode_text(submit),
    )
}

pub fn folder_form(ctx: &PageContext, values: &FolderForm, errors: Option<&ValidationErrors>) -> Html<String> {
    let content = format!(
        "<h1>New folder</h1>{}",
        form(&[input(errors, "Folder title:", "title", "text", &values.title)], "Add"),
    );

    layout(ctx, "New folder", &content)
}

pub fn task_form(
    ctx: &PageContext,
    folder: &Folder,
    values: &TaskForm,
    errors: Option<&ValidationErrors>,
) -> Html<String> {
    let content = format!(
        "<h1>New task in {}</h1>{}",
        encode_text(&folder.title),
        form(&[input(errors, "Task:", "content", "text", &values.content)], "Add"),
    );

    layout(ctx, "New task", &content)
}

/// Sign up page. Passwords are never written back into the form.
pub fn register_form(ctx: &PageContext, values: &RegisterForm, errors: Option<&ValidationErrors>) -> Html<String> {
    let fields = [
        input(errors, "First name:", "first_name", "text", &values.first_name),
        input(errors, "Last name:", "last_name", "text", &values.last_name),
        input(errors, "Email:", "email", "email", &values.email),
        input(errors, "Confirm email:", "confirm_email", "email", &values.confirm_email),
        input(errors, "Password:", "password", "password", ""),
        input(errors, "Confirm password:", "confirm_password", "password", ""),
    ];
    let content = format!("<h1>Register</h1>{}", form(&fields, "Sign up"));

    layout(ctx, "Register", &content)
}

pub fn login_form(ctx: &PageContext, values: &LoginForm, errors: Option<&ValidationErrors>) -> Html<String> {
    let fields = [
        input(errors, "Email:", "email", "email", &values.email),
        input(errors, "Password:", "password", "password", ""),
    ];
    let content = format!("<h1>Log in</h1>{}", form(&fields, "Log in"));

    layout(ctx, "Log in", &content)
}

/// Bare page for failed requests
pub fn error_page(heading: &str, detail: &str) -> Html<String> {
    let content = format!("<h1>{}</h1><p>{}</p>", encode_text(heading), encode_text(detail));

    layout(&PageContext::default(), heading, &content)
}
