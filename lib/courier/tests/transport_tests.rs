//! Integration tests for `HyperTransport` using wiremock.
//!
//! The transport blocks on its own runtime, so the mock server is driven by a
//! separate runtime and the client is used from the plain test thread.

use std::time::Duration;

use assert2::{check, let_assert};
use courier::{
    Client, Error, HyperTransport, Method, NO_PARAMS, Request, ResponseExt, SkipLimitPolicy,
    Transport, TransportConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Product {
    id: u64,
    title: String,
}

/// Mock server running on its own runtime.
struct Server {
    mock: MockServer,
    runtime: Runtime,
}

impl Server {
    fn start() -> Self {
        let runtime = Runtime::new().expect("runtime");
        let mock = runtime.block_on(MockServer::start());
        Self { mock, runtime }
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.mock));
    }

    fn uri(&self) -> String {
        self.mock.uri()
    }

    fn client(&self) -> Client {
        Client::builder()
            .base_url(self.uri())
            .build()
            .expect("client")
    }
}

#[test]
fn get_request() {
    let server = Server::start();
    let product = Product {
        id: 1,
        title: "Essence Mascara Lash Princess".to_string(),
    };
    server.mount(
        Mock::given(method("GET"))
            .and(path("/products/1"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&product)),
    );

    let response = server
        .client()
        .get("/products/1", &NO_PARAMS)
        .expect("response");

    check!(response.is_success());
    check!(response.json::<Product>().expect("json") == product);
}

#[test]
fn post_request_with_json_body() {
    let server = Server::start();
    let input = json!({"title": "BMW Pencil"});
    server.mount(
        Mock::given(method("POST"))
            .and(path("/products/add"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(&input))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 195, "title": "BMW Pencil"})),
            ),
    );

    let response = server
        .client()
        .post("/products/add", &input)
        .expect("response");

    check!(response.status() == 201);
    check!(response.json_path("id") == Some(json!(195)));
}

#[test]
fn form_post_request() {
    let server = Server::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome")),
    );

    let response = server
        .client()
        .form(
            Method::Post,
            "/auth/login",
            &[("username", "emilys"), ("password", "emilyspass")],
        )
        .expect("response");

    check!(response.text().expect("utf8") == "welcome");
    check!(
        response.request().body().map(AsRef::as_ref)
            == Some(b"username=emilys&password=emilyspass".as_slice())
    );
}

#[test]
fn error_status_is_a_response() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/products/999"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Product with id '999' not found"})),
            ),
    );

    let client = server.client();
    let response = client.get("/products/999", &NO_PARAMS).expect("response");

    check!(response.status() == 404);
    check!(response.raw().is_client_error());
    client.assert_sent(|_, response| response.status() == 404);
}

#[test]
fn bearer_auth_reaches_the_server() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer my-secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1}))),
    );

    let client = Client::builder()
        .base_url(server.uri())
        .with_logging()
        .with_bearer_auth("my-secret-token")
        .build()
        .expect("client");
    let response = client.get("/auth/me", &NO_PARAMS).expect("response");

    check!(response.is_success());
}

#[test]
fn request_timeout() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2))),
    );

    let client = Client::builder()
        .base_url(server.uri())
        .transport_config(
            TransportConfig::builder()
                .timeout(Duration::from_millis(200))
                .build(),
        )
        .build()
        .expect("client");
    let result = client.get("/slow", &NO_PARAMS);

    let_assert!(Err(Error::Timeout) = result);
    client.assert_nothing_sent();
}

#[test]
fn transport_used_directly() {
    let server = Server::start();
    server.mount(
        Mock::given(method("DELETE"))
            .and(path("/products/1"))
            .respond_with(ResponseTemplate::new(200).insert_header("X-Deleted", "true")),
    );

    let transport = HyperTransport::new().expect("transport");
    let url = format!("{}/products/1", server.uri()).parse().expect("url");
    let raw = transport
        .send(&Request::new(Method::Delete, url))
        .expect("response");

    check!(raw.status() == 200);
    check!(raw.header("x-deleted") == Some("true"));
}

#[test]
fn pagination_over_the_network() {
    let server = Server::start();
    for skip in [0_u64, 2, 4] {
        server.mount(
            Mock::given(method("GET"))
                .and(path("/users"))
                .and(query_param("limit", "2"))
                .and(query_param("skip", skip.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "users": [{"id": skip + 1}, {"id": skip + 2}],
                    "total": 5,
                    "skip": skip,
                    "limit": 2,
                }))),
        );
    }

    let client = Client::builder()
        .base_url(server.uri())
        .pagination(SkipLimitPolicy::new())
        .build()
        .expect("client");
    let first = client
        .get("/users", &json!({"limit": 2, "skip": 0}))
        .expect("first page");

    let pages = first
        .pages(&client)
        .collect::<Result<Vec<_>, _>>()
        .expect("pages");

    check!(pages.len() == 3);
    client.assert_sent_count(3);
}
