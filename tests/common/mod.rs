use std::net::TcpListener;
use std::sync::Arc;

use heroes_api::configuration::JwtSettings;
use heroes_api::startup::run;
use heroes_api::store::{InMemoryAccountStore, InMemoryHeroStore};
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub accounts: Arc<InMemoryAccountStore>,
    pub jwt_config: JwtSettings,
    pub client: reqwest::Client,
}

pub fn jwt_config() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret-at-least-32-bytes".to_string(),
        issuer: "heroes-api".to_string(),
        audience: "heroes-clients".to_string(),
        access_token_expiry_minutes: 15,
        refresh_token_expiry_days: 7,
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let accounts = Arc::new(InMemoryAccountStore::new());
    let heroes = Arc::new(InMemoryHeroStore::new());
    let jwt_config = jwt_config();

    let server = run(listener, accounts.clone(), heroes, jwt_config.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        accounts,
        jwt_config,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/register",
            &json!({"username": username, "password": password}),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/login",
            &json!({"username": username, "password": password}),
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post_json("/auth/refresh", &json!({"refreshToken": refresh_token}))
            .await
    }

    /// Registers `username` and logs in, returning the token response body
    pub async fn signed_in(&self, username: &str, password: &str) -> Value {
        assert_eq!(201, self.register(username, password).await.status().as_u16());
        let response = self.login(username, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}
