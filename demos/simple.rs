use std::{
    collections::HashMap,
    error::Error,
    net::SocketAddr,
    sync::{Arc, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use bearer_for_warp::{
    build_api_route_filter, handle_auth_errors, with_auth, Auth, AuthConfig, UserRecord,
    UserStore, Username,
};
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warp::{path, Filter};

fn init_logging() {
    let fmt_layer = fmt::layer().with_target(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let store = Arc::new(SimpleInMemoryStore::new());

    let config = AuthConfig {
        password_salt: std::env::var("AUTH_PASSWORD_SALT")
            .unwrap_or_else(|_| "development-only salt".into()),
        token_issuer: "bearer_for_warp demo".into(),
        token_secret: std::env::var("AUTH_TOKEN_SECRET")
            .unwrap_or_else(|_| "development-only secret".into()),
        token_lifetime: Duration::from_secs(30 * 60),
        user_store: store.clone(),
    };

    let auth = Auth::new(config).expect("unusable auth configuration");

    // one seeded account, standing in for a real user database
    store.insert(UserRecord {
        username: Username("testuser".into()),
        password_hash: auth
            .hash_password("testpassword")
            .expect("failed to hash the seeded password"),
        display_name: "Test User".into(),
        disabled: false,
    });

    let auth_routes = build_api_route_filter(&auth);

    let unsecured_homepage =
        warp::path::end().then(|| async move { warp::reply::html("hello, world!") });

    let profile_page = path!("users" / "me")
        .and(warp::get())
        .and(with_auth(&auth))
        .then(|user: UserRecord| async move {
            warp::reply::json(&json!({
                "username": user.username.0,
                "display_name": user.display_name,
            }))
        });

    let secret_page = path!("secret")
        .and(warp::get())
        .and(with_auth(&auth))
        .then(|user: UserRecord| async move {
            warp::reply::json(&json!({
                "message": format!("Hello, {}! This is a secret endpoint.", user.username.0),
            }))
        });

    let all_routes = unsecured_homepage
        .or(profile_page)
        .or(secret_page)
        .or(auth_routes)
        .recover(handle_auth_errors);

    tracing::info!("demo server listening on 127.0.0.1:4000");

    warp::serve(all_routes)
        .run("127.0.0.1:4000".parse::<SocketAddr>().unwrap())
        .await;
}

struct SimpleInMemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl SimpleInMemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, record: UserRecord) {
        self.users
            .write()
            .unwrap()
            .insert(record.username.0.clone(), record);
    }
}

#[async_trait]
impl UserStore for SimpleInMemoryStore {
    async fn lookup(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, Box<dyn Error + Send + Sync>> {
        Ok(self.users.read().unwrap().get(&username.0).cloned())
    }
}
