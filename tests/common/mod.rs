use axum_test::TestServer;
use sqlx::MySqlPool;
use std::sync::Arc;
use tastept::core::AppState;
use tastept::core::config::{Config, LlmConfig};

pub const TEST_JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

/// Configurazione di test: directory media e vector store usa-e-getta,
/// nessun webhook email
pub fn test_config() -> Config {
    let scratch = std::env::temp_dir().join(format!("tastept-test-{}", uuid::Uuid::new_v4()));

    Config {
        database_url: "unused-in-tests".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        max_connections: 5,
        connection_lifetime_secs: 30,
        app_env: "test".to_string(),
        front_domains: vec!["http://localhost:5173".to_string()],
        media_root: scratch.join("media").to_string_lossy().into_owned(),
        media_url: "/media/".to_string(),
        vector_store_path: scratch
            .join("vectors/vectors.json")
            .to_string_lossy()
            .into_owned(),
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
        },
        kakao_userinfo_url: "http://127.0.0.1:9/v2/user/me".to_string(),
        mail_webhook_url: None,
        domain: "http://localhost:3000".to_string(),
    }
}

/// Crea un AppState per i test
pub fn create_test_state(pool: MySqlPool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, test_config()))
}

/// Come create_test_state, ma con il provider LLM puntato a un mock
pub fn create_test_state_with_llm(pool: MySqlPool, llm_base_url: &str) -> Arc<AppState> {
    let mut config = test_config();
    config.llm.base_url = llm_base_url.to_string();
    Arc::new(AppState::new(pool, config))
}

/// Come create_test_state, ma con l'endpoint userinfo di Kakao su un mock
pub fn create_test_state_with_kakao(pool: MySqlPool, userinfo_url: &str) -> Arc<AppState> {
    let mut config = test_config();
    config.kakao_userinfo_url = userinfo_url.to_string();
    Arc::new(AppState::new(pool, config))
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = tastept::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT valido per un utente delle fixtures
pub fn create_test_jwt(user_id: i32, email: &str) -> String {
    tastept::core::auth::encode_jwt(email.to_string(), user_id, TEST_JWT_SECRET)
        .expect("Failed to create JWT token")
}

/// Valore pronto per l'header Authorization
pub fn bearer(user_id: i32, email: &str) -> String {
    format!("Bearer {}", create_test_jwt(user_id, email))
}
