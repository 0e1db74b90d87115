#![allow(dead_code)]

use axum::Router;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use folder_todo::{SharedData, db, persistence, routes};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::cookie::Key;
use url::form_urlencoded;

/// The whole application over a private in-memory database, driven one request at a time
/// like a single browser would. The session cookie is carried from response to request.
pub struct TestApp {
    router: Router,
    pub db: SqlitePool,
    session_cookie: Option<String>,
}

/// A response with its body already read
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestApp {
    pub async fn new() -> TestApp {
        let db = db::connect_in_memory()
            .await
            .expect("in-memory database should open");

        TestApp::with_pool(db)
    }

    /// The application over a database file, which unlike the in-memory database can be
    /// written by several connections at once
    pub async fn file_backed(db_path: &Path) -> TestApp {
        let db = db::connect_sqlx(&format!("sqlite://{}", db_path.display()))
            .await
            .expect("file database should open");

        TestApp::with_pool(db)
    }

    fn with_pool(db: SqlitePool) -> TestApp {
        let shared_data = Arc::new(SharedData {
            ext_cxn: persistence::ExternalConnectivity::new(db.clone()),
        });

        TestApp {
            router: routes::build_router(shared_data, Key::generate()),
            db,
            session_cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request_builder("GET", path).body(Body::empty());
        self.send(request.expect("GET request should build")).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = self.form_request(path, fields);
        self.send(request).await
    }

    /// A form submission carrying the current session, for sending outside of [TestApp::send]
    pub fn form_request(&self, path: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();

        self.request_builder("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("POST request should build")
    }

    /// A handle on the router for sending requests concurrently
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn post_raw(&mut self, path: &str, content_type: &str, body: &str) -> TestResponse {
        let request = self
            .request_builder("POST", path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_owned()));

        self.send(request.expect("POST request should build")).await
    }

    fn request_builder(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, "localhost:5000");

        match &self.session_cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should always respond");
        self.remember_cookie(&response);

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read data from response body!");

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn remember_cookie(&mut self, response: &Response) {
        let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
        else {
            return;
        };

        let pair = set_cookie.split(';').next().unwrap_or_default().trim();
        let removed = pair.ends_with('=') || set_cookie.contains("Max-Age=0");
        self.session_cookie = if removed { None } else { Some(pair.to_owned()) };
    }

    /// Signs up through the registration form. The new user ends up logged in.
    pub async fn register(&mut self, first_name: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("first_name", first_name),
                ("last_name", "Tester"),
                ("email", email),
                ("confirm_email", email),
                ("password", password),
                ("confirm_password", password),
            ],
        )
        .await
    }

    pub async fn log_in(&mut self, path: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(path, &[("email", email), ("password", password)]).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT count(*) FROM {table}"))
            .fetch_one(&self.db)
            .await
            .expect("counting rows should succeed")
    }
}
