use axum::body;
use axum::http::header;
use axum::response::Response;

/// Used in tests to read the whole HTTP response body as text. Will panic and fail the test
/// if the body can't be read or isn't UTF-8.
pub async fn body_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read data from response body!");

    String::from_utf8(bytes.to_vec()).unwrap_or_else(|err| panic!("Response body was not UTF-8! Error: {}", err))
}

/// Where a redirect response points
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}
