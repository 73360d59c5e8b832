#![cfg(feature = "http")]

use std::thread;
use std::time::Duration;

use catalog_sync::{FetchError, HttpFetcher, JsonFetcher};
use tiny_http::{Header, Response, Server, StatusCode};

/// Serve one request with `response`; the thread returns the request's
/// `(header name, value)` pairs.
fn serve_once(
    response: Response<std::io::Cursor<Vec<u8>>>,
) -> (String, thread::JoinHandle<Vec<(String, String)>>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let addr = server.server_addr();
    let handle = thread::spawn(move || {
        let Ok(request) = server.recv() else {
            return Vec::new();
        };
        let headers = request
            .headers()
            .iter()
            .map(|h| (h.field.to_string().to_ascii_lowercase(), h.value.to_string()))
            .collect();
        request.respond(response).expect("respond");
        headers
    });
    (format!("http://{addr}/config"), handle)
}

#[tokio::test]
async fn fetches_json_with_catalog_headers() {
    let (url, handle) = serve_once(
        Response::from_string(r#"{"MicrosoftTeamsAppCatalog": {"appCatalog": {}}}"#)
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap()),
    );

    let fetcher = HttpFetcher::new(Duration::from_secs(5), Some("catalog-test")).unwrap();
    let document = fetcher.fetch_json(&url).await.unwrap();
    assert!(document["MicrosoftTeamsAppCatalog"]["appCatalog"].is_object());

    let headers = handle.join().expect("server thread");
    let header = |name: &str| {
        headers
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    };
    assert_eq!(header("accept"), Some("application/json, text/plain, */*"));
    assert_eq!(header("cache-control"), Some("no-cache"));
    assert_eq!(header("user-agent"), Some("catalog-test"));
}

#[tokio::test]
async fn error_status_maps_to_server_error() {
    let (url, handle) =
        serve_once(Response::from_string("maintenance").with_status_code(StatusCode(503)));

    let fetcher = HttpFetcher::new(Duration::from_secs(5), None).unwrap();
    let err = fetcher.fetch_json(&url).await.unwrap_err();
    match err {
        FetchError::Server { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    handle.join().expect("server thread");
}

#[tokio::test]
async fn invalid_json_is_a_parse_error() {
    let (url, handle) = serve_once(Response::from_string("<html>not json</html>"));

    let fetcher = HttpFetcher::new(Duration::from_secs(5), None).unwrap();
    let err = fetcher.fetch_json(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Json(_)), "{err:?}");
    handle.join().expect("server thread");
}
