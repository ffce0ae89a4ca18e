use postbook::cache::ResponseCache;
use postbook::configuration::{get_configuration, DatabaseSettings};
use postbook::startup::run;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    // Local cache mode so the cache-aside read path is exercised.
    let server = run(
        listener,
        connection_pool.clone(),
        ResponseCache::local(),
        configuration.jwt.clone(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

async fn register_and_get_token(app: &TestApp, email: &str) -> String {
    let response = reqwest::Client::new()
        .post(&format!("{}/auth/register", &app.address))
        .json(&json!({ "email": email, "password": "SecurePass123" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_post(app: &TestApp, token: &str, name: &str, tags: &[&str]) -> Value {
    let response = reqwest::Client::new()
        .post(&format!("{}/api/posts", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": name, "tags": tags }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
async fn create_and_get_post() {
    let app = spawn_app().await;
    let token = register_and_get_token(&app, "author@example.com").await;

    let created = create_post(&app, &token, "My first post", &["intro", "hello"]).await;
    let post_id = created["id"].as_str().unwrap();

    // First read misses the cache and hits the database; the second is
    // served from the cache. Both must return the same payload.
    let client = reqwest::Client::new();
    for _ in 0..2 {
        let response = client
            .get(&format!("{}/api/posts/{}", &app.address, post_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["id"], created["id"]);
        assert_eq!(body["name"], "My first post");
        assert_eq!(body["tags"], json!(["intro", "hello"]));
    }
}

#[tokio::test]
async fn get_all_posts_lists_created_posts() {
    let app = spawn_app().await;
    let token = register_and_get_token(&app, "author@example.com").await;

    create_post(&app, &token, "first", &[]).await;
    create_post(&app, &token, "second", &[]).await;

    let response = reqwest::Client::new()
        .get(&format!("{}/api/posts", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_unknown_post_returns_404() {
    let app = spawn_app().await;
    let token = register_and_get_token(&app, "author@example.com").await;

    let response = reqwest::Client::new()
        .get(&format!(
            "{}/api/posts/{}",
            &app.address,
            uuid::Uuid::new_v4()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn owner_can_update_their_post() {
    let app = spawn_app().await;
    let token = register_and_get_token(&app, "author@example.com").await;

    let created = create_post(&app, &token, "draft", &[]).await;
    let post_id = created["id"].as_str().unwrap();

    let response = reqwest::Client::new()
        .put(&format!("{}/api/posts/{}", &app.address, post_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "published" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "published");

    let name = sqlx::query_as::<_, (String,)>("SELECT name FROM posts WHERE id = $1::uuid")
        .bind(post_id)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch post");
    assert_eq!(name.0, "published");
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete() {
    let app = spawn_app().await;
    let owner_token = register_and_get_token(&app, "owner@example.com").await;
    let other_token = register_and_get_token(&app, "other@example.com").await;

    let created = create_post(&app, &owner_token, "not yours", &[]).await;
    let post_id = created["id"].as_str().unwrap();

    let client = reqwest::Client::new();

    let response = client
        .put(&format!("{}/api/posts/{}", &app.address, post_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&json!({ "name": "hijacked" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());

    let response = client
        .delete(&format!("{}/api/posts/{}", &app.address, post_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn owner_can_delete_their_post() {
    let app = spawn_app().await;
    let token = register_and_get_token(&app, "author@example.com").await;

    let created = create_post(&app, &token, "temporary", &[]).await;
    let post_id = created["id"].as_str().unwrap();

    let client = reqwest::Client::new();
    let response = client
        .delete(&format!("{}/api/posts/{}", &app.address, post_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(204, response.status().as_u16());

    // Deleting again reports not found (the delete path is uncached).
    let response = client
        .delete(&format!("{}/api/posts/{}", &app.address, post_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, response.status().as_u16());

    let count = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM posts")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count posts");
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn posts_routes_require_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/posts", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());

    let response = client
        .post(&format!("{}/api/posts", &app.address))
        .json(&json!({ "name": "anonymous post" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}
