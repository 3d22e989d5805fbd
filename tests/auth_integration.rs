use std::net::TcpListener;
use std::sync::Arc;

use serde_json::{json, Value};
use trading_gateway::auth::{FixedClock, TokenCodec, TokenKind};
use trading_gateway::configuration::{ApplicationSettings, JwtSettings, ProfileSettings, Settings};
use trading_gateway::profile::InMemoryProfileStore;
use trading_gateway::startup::{build_session_service, run};

const SIGNING_KEY: &str = "integration-test-signing-key-0123456789";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn sign_up(&self, login: &str, password: &str) -> Value {
        let response = self
            .post_json(
                "/auth/signup",
                &json!({ "login": login, "password": password, "username": login }),
            )
            .await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    async fn login(&self, login: &str, password: &str) -> reqwest::Response {
        self.post_json("/auth/login", &json!({ "login": login, "password": password }))
            .await
    }

    async fn refresh(&self, session: &Value) -> reqwest::Response {
        self.post_json(
            "/auth/refresh",
            &json!({
                "id": session["id"],
                "access_token": session["access_token"],
                "refresh_token": session["refresh_token"],
            }),
        )
        .await
    }

    async fn me(&self, authorization: Option<String>) -> reqwest::Response {
        let mut request = self.client.get(&format!("{}/auth/me", self.address));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }
}

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: SIGNING_KEY.to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 259200,
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let settings = Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
        },
        jwt: jwt_settings(),
        profile: ProfileSettings::default(),
    };

    let sessions = build_session_service(&settings, Arc::new(InMemoryProfileStore::new()))
        .expect("Failed to build session service");
    let server = run(listener, sessions).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

async fn assert_unauthorized(response: reqwest::Response) {
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse error body");
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Unauthorized");
}

// --- Login ---

#[tokio::test]
async fn login_returns_pair_for_returned_subject() {
    let app = spawn_app().await;
    let created = app.sign_up("alice", "secret123").await;

    let response = app.login("alice", "secret123").await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let codec = TokenCodec::new(&jwt_settings(), Arc::new(trading_gateway::auth::SystemClock)).unwrap();
    let access = codec.verify(body["access_token"].as_str().unwrap()).unwrap();
    let refresh = codec.verify(body["refresh_token"].as_str().unwrap()).unwrap();
    assert_eq!(access.jti, body["id"].as_str().unwrap());
    assert_eq!(refresh.jti, body["id"].as_str().unwrap());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;

    let wrong_password = app.login("alice", "not-the-secret").await;
    let unknown_login = app.login("mallory", "secret123").await;

    assert_unauthorized(wrong_password).await;
    assert_unauthorized(unknown_login).await;
}

#[tokio::test]
async fn sign_up_rejects_duplicate_login() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;

    let response = app
        .post_json(
            "/auth/signup",
            &json!({ "login": "alice", "password": "another123", "username": "alice" }),
        )
        .await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn sign_up_rejects_short_password() {
    let app = spawn_app().await;

    let response = app
        .post_json(
            "/auth/signup",
            &json!({ "login": "alice", "password": "short", "username": "alice" }),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}

// --- Rotation ---

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;
    let first: Value = app.login("alice", "secret123").await.json().await.unwrap();

    let response = app.refresh(&first).await;
    assert_eq!(200, response.status().as_u16());
    let second: Value = response.json().await.unwrap();
    assert_eq!(second["id"], first["id"]);
    assert_ne!(second["refresh_token"], first["refresh_token"]);

    // The old pair is dead the moment the new digest is stored
    assert_unauthorized(app.refresh(&first).await).await;

    // The new pair still rotates
    assert_eq!(200, app.refresh(&second).await.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_cross_paired_tokens() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;
    app.sign_up("bob", "hunter2hunter2").await;
    let alice: Value = app.login("alice", "secret123").await.json().await.unwrap();
    let bob: Value = app.login("bob", "hunter2hunter2").await.json().await.unwrap();

    let mixed = json!({
        "id": alice["id"],
        "access_token": bob["access_token"],
        "refresh_token": alice["refresh_token"],
    });

    assert_unauthorized(app.refresh(&mixed).await).await;
}

#[tokio::test]
async fn refresh_rejects_unknown_subject() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;
    let session: Value = app.login("alice", "secret123").await.json().await.unwrap();

    let stranger = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "access_token": session["access_token"],
        "refresh_token": session["refresh_token"],
    });

    assert_unauthorized(app.refresh(&stranger).await).await;
}

// --- Authenticated routes ---

#[tokio::test]
async fn me_requires_authorization_header() {
    let app = spawn_app().await;

    assert_unauthorized(app.me(None).await).await;
}

#[tokio::test]
async fn me_rejects_malformed_header() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;
    let session: Value = app.login("alice", "secret123").await.json().await.unwrap();
    let token = session["access_token"].as_str().unwrap();

    for header in [
        token.to_string(),
        format!("notBearer {}", token),
        format!("Bearer {} extra", token),
        "Bearer".to_string(),
    ] {
        assert_unauthorized(app.me(Some(header)).await).await;
    }
}

#[tokio::test]
async fn me_rejects_expired_token() {
    let app = spawn_app().await;
    let an_hour_ago = chrono::Utc::now().timestamp() - 3600;
    let codec = TokenCodec::new(&jwt_settings(), Arc::new(FixedClock::new(an_hour_ago))).unwrap();
    let expired = codec
        .mint(uuid::Uuid::new_v4(), TokenKind::Access, 60)
        .unwrap();

    assert_unauthorized(app.me(Some(format!("Bearer {}", expired))).await).await;
}

#[tokio::test]
async fn me_rejects_token_signed_with_other_key() {
    let app = spawn_app().await;
    let mut other = jwt_settings();
    other.secret = "invalidSigningKey".to_string();
    let codec = TokenCodec::new(&other, Arc::new(trading_gateway::auth::SystemClock)).unwrap();
    let forged = codec
        .mint(uuid::Uuid::new_v4(), TokenKind::Access, 60)
        .unwrap();

    assert_unauthorized(app.me(Some(format!("Bearer {}", forged))).await).await;
}

#[tokio::test]
async fn me_returns_subject_for_valid_token() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;
    let session: Value = app.login("alice", "secret123").await.json().await.unwrap();

    let response = app
        .me(Some(format!("Bearer {}", session["access_token"].as_str().unwrap())))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], session["id"]);
}

#[tokio::test]
async fn delete_profile_ends_the_session() {
    let app = spawn_app().await;
    app.sign_up("alice", "secret123").await;
    let session: Value = app.login("alice", "secret123").await.json().await.unwrap();
    let bearer = format!("Bearer {}", session["access_token"].as_str().unwrap());

    let response = app
        .client
        .delete(&format!("{}/auth/profile", app.address))
        .header("Authorization", bearer)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    assert_unauthorized(app.refresh(&session).await).await;
    assert_unauthorized(app.login("alice", "secret123").await).await;
}

#[tokio::test]
async fn delete_profile_requires_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .delete(&format!("{}/auth/profile", app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_unauthorized(response).await;
}
