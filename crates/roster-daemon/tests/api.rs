use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use roster_config::ServerConfig;
use roster_daemon::DaemonServer;
use roster_store::Store;
use roster_types::{ErrorResponse, RouteNotFoundResponse, User, UserResponse, UsersResponse};
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct TestServer {
    dir: TempDir,
    addr: SocketAddr,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with_limit(1024 * 1024).await
    }

    async fn start_with_limit(max_body_bytes: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("users.json"));
        store.ensure_initialized().unwrap();

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_body_bytes,
        };
        let server = DaemonServer::bind(&config, store).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        Self {
            dir,
            addr,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn data_file(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("users.json")).unwrap()
    }

    async fn list(&self) -> Vec<User> {
        let response = self.client.get(self.url("/users")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.json::<UsersResponse>().await.unwrap().users
    }

    async fn create(&self, email: &str, name: &str, age: u64) -> User {
        let response = self
            .client
            .post(self.url("/users/create"))
            .json(&json!({"email": email, "name": name, "age": age}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json::<UserResponse>().await.unwrap().user
    }

    async fn raw(&self, request: impl AsRef<[u8]>) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(request.as_ref()).await.unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    }
}

#[tokio::test]
async fn test_create_get_delete_lifecycle() {
    let server = TestServer::start().await;
    assert!(server.list().await.is_empty());

    let created = server.create("a@b.com", "Ann", 30).await;
    assert!(!created.id.is_empty());
    assert_eq!(created.email, "a@b.com");
    assert_eq!(created.name, "Ann");
    assert_eq!(created.age, 30);

    assert_eq!(server.list().await, vec![created.clone()]);

    let response = server
        .client
        .get(server.url(&format!("/users/{}", created.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response.json::<UserResponse>().await.unwrap();
    assert_eq!(fetched.message, "Request received successfully");
    assert_eq!(fetched.user, created);

    let response = server
        .client
        .delete(server.url(&format!("/users/remove/{}", created.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = response.json::<UserResponse>().await.unwrap();
    assert_eq!(deleted.message, "User deleted successfully");
    assert_eq!(deleted.user, created);

    assert!(server.list().await.is_empty());
    assert_eq!(server.data_file(), "[]");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_without_write() {
    let server = TestServer::start().await;
    server.create("a@b.com", "Ann", 30).await;
    let before = server.data_file();

    let response = server
        .client
        .post(server.url("/users/create"))
        .json(&json!({"email": "a@b.com", "name": "Other", "age": 41}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.json::<ErrorResponse>().await.unwrap();
    assert_eq!(body.error, "User with the email already exists");
    assert_eq!(server.data_file(), before);
}

#[tokio::test]
async fn test_update_age_keeping_email() {
    let server = TestServer::start().await;
    let first = server.create("a@b.com", "Ann", 30).await;
    let second = server.create("c@d.com", "Cy", 50).await;

    let response = server
        .client
        .put(server.url(&format!("/users/update/{}", first.id)))
        .json(&json!({"email": "a@b.com", "name": "Ann", "age": 31}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<UserResponse>().await.unwrap();
    assert_eq!(updated.message, "User updated successfully");
    assert_eq!(updated.user.id, first.id);
    assert_eq!(updated.user.age, 31);

    let users = server.list().await;
    assert_eq!(users.len(), 2);
    assert_eq!(users[0], updated.user);
    assert_eq!(users[1], second);
}

#[tokio::test]
async fn test_update_to_taken_email_conflicts() {
    let server = TestServer::start().await;
    let first = server.create("a@b.com", "Ann", 30).await;
    server.create("c@d.com", "Cy", 50).await;

    let response = server
        .client
        .put(server.url(&format!("/users/update/{}", first.id)))
        .json(&json!({"email": "c@d.com", "name": "Ann", "age": 30}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.json::<ErrorResponse>().await.unwrap();
    assert_eq!(body.error, "User with the same email already exists");
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let server = TestServer::start().await;
    server.create("a@b.com", "Ann", 30).await;
    let before = server.data_file();

    for request in [
        server.client.get(server.url("/users/unknown")),
        server.client.delete(server.url("/users/remove/unknown")),
        server
            .client
            .put(server.url("/users/update/unknown"))
            .json(&json!({"email": "z@z.com", "name": "Z", "age": 9})),
    ] {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.json::<ErrorResponse>().await.unwrap();
        assert_eq!(body.error, "User not found");
    }
    assert_eq!(server.data_file(), before);
}

#[tokio::test]
async fn test_validation_errors() {
    let server = TestServer::start().await;

    let cases = [
        (json!({"email": "a@b.com", "name": "A", "age": 1, "role": "x"}), "Request contains invalid fields"),
        (json!({"email": "a@b", "name": "A", "age": 1}), "Valid email is required"),
        (json!({"email": "a@b.com", "name": "  ", "age": 1}), "Name is required and must be a non-empty string"),
        (json!({"email": "a@b.com", "name": "A", "age": "1"}), "Age is required, must be a number, and greater than zero"),
    ];
    for (body, message) in cases {
        let response = server
            .client
            .post(server.url("/users/create"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().await.unwrap().error, message);
    }

    let response = server
        .client
        .delete(server.url("/users/remove/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<ErrorResponse>().await.unwrap().error,
        "Id parameter is required"
    );

    assert_eq!(server.data_file(), "[]");
}

#[tokio::test]
async fn test_unmatched_routes() {
    let server = TestServer::start().await;

    for request in [
        server.client.get(server.url("/")),
        server.client.get(server.url("/accounts")),
        server.client.post(server.url("/users")),
        server.client.delete(server.url("/users/abc")),
    ] {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.json::<RouteNotFoundResponse>().await.unwrap();
        assert_eq!(body.message, "Route not found");
    }
}

#[tokio::test]
async fn test_malformed_request_gets_bad_request() {
    let server = TestServer::start().await;
    let response = server.raw("NONSENSE\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(response.ends_with(r#"{"error":"Bad request"}"#));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = TestServer::start_with_limit(16).await;
    let response = server
        .raw("POST /users/create HTTP/1.1\r\nContent-Length: 1000\r\n\r\n")
        .await;
    assert!(response.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
}

#[tokio::test]
async fn test_non_utf8_header_gets_bad_request() {
    let server = TestServer::start().await;
    let response = server
        .raw(b"GET /users HTTP/1.1\r\nX-Name: caf\xe9\r\n\r\n".as_slice())
        .await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(response.ends_with(r#"{"error":"Bad request"}"#));
}

#[tokio::test]
async fn test_trailing_slash_routes() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/users/create/"))
        .json(&json!({"email": "t@s.io", "name": "Tess", "age": 41}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = response.json::<UserResponse>().await.unwrap().user;

    let response = server
        .client
        .get(server.url(&format!("/users/{}/", user.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<UserResponse>().await.unwrap().user, user);
}

#[tokio::test]
async fn test_concurrent_creates_never_corrupt_the_file() {
    let server = TestServer::start().await;

    let mut tasks = Vec::new();
    for i in 0..32 {
        let client = server.client.clone();
        let url = server.url("/users/create");
        tasks.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({"email": format!("u{i}@load.io"), "name": "Load", "age": 20}))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::CREATED);
    }

    // Last writer wins, so some records may be lost, but the file stays whole.
    let stored: Vec<User> = serde_json::from_str(&server.data_file()).unwrap();
    assert!(!stored.is_empty());
    assert!(!server.list().await.is_empty());
}
