//! `test-utils` is used for testing in both `cmscan-lib` and `cmscan`.
//! This crate does not depend on `cmscan-lib` or `cmscan`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies
//! (`wiremock` and `serde_json`).

/// Build the JSON body of a lookup service response.
///
/// ```ignore
/// api_body!(200, [("WordPress", "6.4"), ("Nginx", "")]);
/// api_body!(rate_limited, 2);
/// api_body!(rate_limited);
/// api_body!(error, 101, "Invalid API Key");
/// ```
#[macro_export]
macro_rules! api_body {
    (rate_limited) => {
        serde_json::json!({
            "result": {"code": 120, "msg": "Too Many Requests"}
        })
        .to_string()
    };
    (rate_limited, $retry:expr) => {
        serde_json::json!({
            "result": {"code": 120, "msg": "Too Many Requests"},
            "retry_in_seconds": $retry
        })
        .to_string()
    };
    (error, $code:expr, $msg:expr) => {
        serde_json::json!({
            "result": {"code": $code, "msg": $msg}
        })
        .to_string()
    };
    ($code:expr, [$(($name:expr, $version:expr)),* $(,)?]) => {
        serde_json::json!({
            "result": {"code": $code, "msg": "Success"},
            "results": [$({"name": $name, "version": $version}),*]
        })
        .to_string()
    };
}

/// Create a mock lookup service, which responds with the given body to
/// every `GET` request
#[macro_export]
macro_rules! mock_api {
    ($body:expr) => {{
        let mock_server = wiremock::MockServer::start().await;
        let template = wiremock::ResponseTemplate::new(200).set_body_string($body);
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// Mount a response for a single host (`url` query parameter) on an
/// existing mock lookup service
#[macro_export]
macro_rules! mock_host {
    ($mock_server:expr, $host:expr, $body:expr) => {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("url", $host))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string($body))
            .mount(&$mock_server)
            .await
    };
}

/// Get the root path of the project.
#[macro_export]
macro_rules! root_path {
    () => {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
    };
}

/// Get the path to the `fixtures` directory.
#[macro_export]
macro_rules! fixtures_path {
    () => {
        $crate::root_path!().join("fixtures")
    };
}
