use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use libcat_api::app::{self, AppServices};
use libcat_core::{Author, AuthorId, Book, BookId, NewAuthor, NewBook, NewUser, User};
use libcat_infra::config::{ServerConfig, ServerTls};
use libcat_infra::{
    AppConfig, ConfigError, InMemoryLibraryStore, LibraryStore, StoreError, StoreResult,
};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    /// Server plus a handle on its store for seeding rows directly.
    async fn spawn_with_store() -> (Self, Arc<InMemoryLibraryStore>) {
        let store = Arc::new(InMemoryLibraryStore::new());
        let srv = Self::spawn(AppServices::new(store.clone())).await;
        (srv, store)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Store whose every call fails with the same error.
struct FailingStore(StoreError);

#[async_trait]
impl LibraryStore for FailingStore {
    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Err(self.0.clone())
    }

    async fn get_book(&self, _id: BookId) -> StoreResult<Option<Book>> {
        Err(self.0.clone())
    }

    async fn search_books(&self, _query: &str) -> StoreResult<Vec<Book>> {
        Err(self.0.clone())
    }

    async fn create_book(&self, _book: NewBook) -> StoreResult<Book> {
        Err(self.0.clone())
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        Err(self.0.clone())
    }

    async fn get_author(&self, _id: AuthorId) -> StoreResult<Option<Author>> {
        Err(self.0.clone())
    }

    async fn create_author(&self, _author: NewAuthor) -> StoreResult<Author> {
        Err(self.0.clone())
    }

    async fn create_user(&self, _user: NewUser) -> StoreResult<User> {
        Err(self.0.clone())
    }

    async fn find_user_by_username(&self, _username: &str) -> StoreResult<Option<User>> {
        Err(self.0.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(self.0.clone())
    }
}

fn failing(err: StoreError) -> AppServices {
    AppServices::new(Arc::new(FailingStore(err)))
}

fn author(first: &str, last: &str) -> NewAuthor {
    NewAuthor {
        first_name: first.to_string(),
        last_name: last.to_string(),
        nationality_id: None,
    }
}

#[tokio::test]
async fn root_returns_welcome_payload() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;

    let res = reqwest::get(srv.url("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Witaj w API biblioteki!" }));
}

#[tokio::test]
async fn health_reports_ok_for_reachable_store() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unreachable_store_reports_service_unavailable() {
    let srv = TestServer::spawn(failing(StoreError::Unavailable("pool closed".to_string()))).await;
    let client = reqwest::Client::new();

    for path in ["/health", "/books/"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "store_unavailable", "{path}");
    }
}

#[tokio::test]
async fn database_failures_map_to_internal_error() {
    let srv = TestServer::spawn(failing(StoreError::Database("relation missing".to_string()))).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/authors/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_error");

    let res = client
        .post(srv.url("/authors/"))
        .json(&json!({ "first_name": "Olga", "last_name": "Tokarczuk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn created_book_is_listed_with_generated_id() {
    let (srv, store) = TestServer::spawn_with_store().await;
    let lem = store.create_author(author("Stanisław", "Lem")).await.unwrap();

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/books/"))
        .json(&json!({ "title": "Solaris", "author_id": lem.id, "published_year": 1961 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().expect("generated id");
    assert_eq!(created["title"], "Solaris");
    assert_eq!(created["published_year"], 1961);

    let res = client.get(srv.url("/books/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let books: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(books.iter().any(|b| b["id"] == id && b["title"] == "Solaris"));

    let res = client.get(srv.url(&format!("/books/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn authors_list_contains_every_inserted_author() {
    let (srv, store) = TestServer::spawn_with_store().await;
    store.create_author(author("Stanisław", "Lem")).await.unwrap();

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/authors/"))
        .json(&json!({ "first_name": "Olga", "last_name": "Tokarczuk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.get(srv.url("/authors/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let authors: Vec<serde_json::Value> = res.json().await.unwrap();

    let mut last_names: Vec<&str> = authors
        .iter()
        .map(|a| a["last_name"].as_str().unwrap())
        .collect();
    last_names.sort_unstable();
    assert_eq!(last_names, vec!["Lem", "Tokarczuk"]);
}

#[tokio::test]
async fn book_with_unknown_author_is_rejected_by_storage() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/books/"))
        .json(&json!({ "title": "Orphan", "author_id": 404 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_reference");

    let books: Vec<serde_json::Value> = client
        .get(srv.url("/books/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(books.is_empty());
}

#[tokio::test]
async fn overlong_isbn_fails_validation() {
    let (srv, store) = TestServer::spawn_with_store().await;
    let lem = store.create_author(author("Stanisław", "Lem")).await.unwrap();

    let res = reqwest::Client::new()
        .post(srv.url("/books/"))
        .json(&json!({ "title": "Solaris", "author_id": lem.id, "isbn": "x".repeat(21) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn lookups_by_id_report_missing_and_malformed_ids() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/books/17")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = client.get(srv.url("/authors/17")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/books/seventeen")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn search_matches_titles_case_insensitively() {
    let (srv, store) = TestServer::spawn_with_store().await;
    let lem = store.create_author(author("Stanisław", "Lem")).await.unwrap();

    let client = reqwest::Client::new();
    for title in ["Solaris", "Cyberiada", "Niezwyciężony"] {
        let res = client
            .post(srv.url("/books/"))
            .json(&json!({ "title": title, "author_id": lem.id }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let hits: Vec<serde_json::Value> = client
        .get(srv.url("/books/search/"))
        .query(&[("query", "CYBER")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Cyberiada");

    let none: Vec<serde_json::Value> = client
        .get(srv.url("/books/search/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn database_tls_without_certificates_prevents_startup() {
    let err = AppConfig::from_lookup(|key| match key {
        "USE_SSL" => Some("true".to_string()),
        "SSL_CA" => Some("/etc/libcat/ca.pem".to_string()),
        _ => None,
    })
    .unwrap_err();

    assert!(matches!(err, ConfigError::MissingDatabaseTls { .. }));
}

#[tokio::test]
async fn in_memory_configuration_bootstraps_without_database() {
    let config = AppConfig::from_lookup(|key| match key {
        "USE_PERSISTENT_STORES" => Some("false".to_string()),
        _ => None,
    })
    .unwrap();

    let app = app::bootstrap(&config).await.expect("in-memory bootstrap");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let res = reqwest::get(format!("http://{addr}/authors/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    handle.abort();
}

#[tokio::test]
async fn missing_server_certificate_files_abort_serving() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: Some(ServerTls {
            cert_file: PathBuf::from("/nonexistent/libcat-cert.pem"),
            key_file: PathBuf::from("/nonexistent/libcat-key.pem"),
        }),
    };

    let err = libcat_api::server::serve(app::build_app(AppServices::in_memory()), &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to load TLS certificate"));
}
