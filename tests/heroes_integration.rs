mod common;

use serde_json::{json, Value};

use common::{spawn_app, TestApp};

fn reinhardt() -> Value {
    json!({
        "name": "Reinhardt",
        "role": "tank",
        "portrait": "https://example.com/reinhardt.png",
        "health": 375,
        "armor": 250,
        "abilities": [
            {"name": "Barrier Field", "description": "Deploys a frontal barrier"},
            {"name": "Charge"}
        ]
    })
}

fn tracer() -> Value {
    json!({"name": "Tracer", "role": "damage", "health": 175, "abilities": [{"name": "Blink"}]})
}

async fn access_token(app: &TestApp) -> String {
    let tokens = app.signed_in("editor", "pw1").await;
    tokens["accessToken"].as_str().unwrap().to_string()
}

async fn create(app: &TestApp, token: &str, hero: &Value) -> Value {
    let response = app
        .client
        .post(&format!("{}/api/heroes", &app.address))
        .bearer_auth(token)
        .json(hero)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

async fn get(app: &TestApp, path: &str) -> reqwest::Response {
    app.client
        .get(&format!("{}{}", &app.address, path))
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn writes_require_a_token() {
    let app = spawn_app();

    let create = app
        .client
        .post(&format!("{}/api/heroes", &app.address))
        .json(&reinhardt())
        .send()
        .await
        .unwrap();
    let update = app
        .client
        .put(&format!("{}/api/heroes/1", &app.address))
        .json(&reinhardt())
        .send()
        .await
        .unwrap();
    let delete = app
        .client
        .delete(&format!("{}/api/heroes/1", &app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(401, create.status().as_u16());
    assert_eq!(401, update.status().as_u16());
    assert_eq!(401, delete.status().as_u16());
}

#[tokio::test]
async fn create_and_fetch_hero() {
    let app = spawn_app();
    let token = access_token(&app).await;

    let created = create(&app, &token, &reinhardt()).await;
    let id = created["id"].as_i64().expect("No id");
    assert_eq!(created["role"], "tank");
    assert_eq!(created["shields"], 0);
    assert_eq!(created["abilities"].as_array().unwrap().len(), 2);

    let response = get(&app, &format!("/api/heroes/{}", id)).await;
    assert_eq!(200, response.status().as_u16());
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_returns_400_for_invalid_hero() {
    let app = spawn_app();
    let token = access_token(&app).await;

    let test_cases = vec![
        (json!({"name": "Ana", "role": "healer"}), "unknown role"),
        (json!({"name": "", "role": "support"}), "empty name"),
        (json!({"role": "support"}), "missing name"),
        (json!({"name": "Ana", "role": "support", "health": -1}), "negative health"),
        (json!({"name": "Ana", "role": "support", "abilities": [{"name": ""}]}), "empty ability name"),
    ];

    for (body, reason) in test_cases {
        let response = app
            .client
            .post(&format!("{}/api/heroes", &app.address))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(400, response.status().as_u16(), "Should reject hero: {}", reason);
    }
}

#[tokio::test]
async fn list_filters_by_role_and_name() {
    let app = spawn_app();
    let token = access_token(&app).await;
    create(&app, &token, &reinhardt()).await;
    create(&app, &token, &tracer()).await;

    let all: Value = get(&app, "/api/heroes").await.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let tanks: Value = get(&app, "/api/heroes?role=TANK").await.json().await.unwrap();
    assert_eq!(tanks.as_array().unwrap().len(), 1);
    assert_eq!(tanks[0]["name"], "Reinhardt");

    let named: Value = get(&app, "/api/heroes?name=rac").await.json().await.unwrap();
    assert_eq!(named.as_array().unwrap().len(), 1);
    assert_eq!(named[0]["name"], "Tracer");

    let none: Value = get(&app, "/api/heroes?role=support&name=rac")
        .await
        .json()
        .await
        .unwrap();
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_returns_404_for_missing_hero() {
    let app = spawn_app();

    let response = get(&app, "/api/heroes/42").await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn get_returns_400_for_non_numeric_id() {
    let app = spawn_app();

    assert_eq!(400, get(&app, "/api/heroes/abc").await.status().as_u16());
}

#[tokio::test]
async fn update_replaces_hero_and_abilities() {
    let app = spawn_app();
    let token = access_token(&app).await;
    let created = create(&app, &token, &reinhardt()).await;
    let id = created["id"].as_i64().unwrap();

    let mut body = reinhardt();
    body["id"] = json!(id);
    body["armor"] = json!(300);
    body["abilities"] = json!([{"name": "Earthshatter", "icon": "https://example.com/shatter.png"}]);

    let response = app
        .client
        .put(&format!("{}/api/heroes/{}", &app.address, id))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(204, response.status().as_u16());

    let updated: Value = get(&app, &format!("/api/heroes/{}", id)).await.json().await.unwrap();
    assert_eq!(updated["armor"], 300);
    let abilities = updated["abilities"].as_array().unwrap();
    assert_eq!(abilities.len(), 1);
    assert_eq!(abilities[0]["name"], "Earthshatter");
}

#[tokio::test]
async fn update_rejects_mismatched_id_and_missing_hero() {
    let app = spawn_app();
    let token = access_token(&app).await;
    let created = create(&app, &token, &reinhardt()).await;
    let id = created["id"].as_i64().unwrap();

    let mut mismatched = reinhardt();
    mismatched["id"] = json!(id + 1);
    let response = app
        .client
        .put(&format!("{}/api/heroes/{}", &app.address, id))
        .bearer_auth(&token)
        .json(&mismatched)
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let response = app
        .client
        .put(&format!("{}/api/heroes/999", &app.address))
        .bearer_auth(&token)
        .json(&reinhardt())
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn delete_removes_hero() {
    let app = spawn_app();
    let token = access_token(&app).await;
    let created = create(&app, &token, &tracer()).await;
    let id = created["id"].as_i64().unwrap();

    let delete = |app: &TestApp| {
        app.client
            .delete(&format!("{}/api/heroes/{}", &app.address, id))
            .bearer_auth(&token)
            .send()
    };

    assert_eq!(204, delete(&app).await.unwrap().status().as_u16());
    assert_eq!(404, delete(&app).await.unwrap().status().as_u16());
    assert_eq!(404, get(&app, &format!("/api/heroes/{}", id)).await.status().as_u16());
}
