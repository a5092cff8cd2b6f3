//! Integration tests per gli endpoints accounts
//!
//! Test per:
//! - POST /api/v1/accounts (signup)
//! - POST /api/v1/accounts/signin, /signout
//! - GET/PATCH /api/v1/accounts/profile
//! - POST /api/v1/accounts/password
//! - DELETE /api/v1/accounts/me
//! - GET /api/v1/accounts/verify-email/{token}
//! - POST /api/v1/accounts/emails
//!
//! Questi test usano `#[sqlx::test]` che:
//! - Crea automaticamente un database di test isolato
//! - Applica le migrations da `migrations/`
//! - Applica i fixtures specificati da `fixtures/`

mod common;

#[cfg(test)]
mod account_tests {
    use super::common::*;
    use serde_json::json;
    use sqlx::MySqlPool;

    // ============================================================
    // Test per POST /api/v1/accounts - signup
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_success(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "newuser@test.com",
            "password": "Password123",
            "password_confirm": "Password123",
            "nickname": "newuser",
            "age": 25,
            "gender": "F"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let user: serde_json::Value = response.json();

        assert!(user.get("id").is_some(), "User should have an id");
        assert_eq!(user["email"], "newuser@test.com");
        assert_eq!(user["nickname"], "newuser");
        // il ruolo esce nella forma leggibile
        assert_eq!(user["role"], "USER");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_duplicate_email(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "alice@test.com",
            "password": "Password123",
            "password_confirm": "Password123",
            "nickname": "anothernick"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_conflict();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_duplicate_nickname(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "unique@test.com",
            "password": "Password123",
            "password_confirm": "Password123",
            "nickname": "alice"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_conflict();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_password_mismatch(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "newuser@test.com",
            "password": "Password123",
            "password_confirm": "Password124",
            "nickname": "newuser"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_short_password(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "newuser@test.com",
            "password": "Pass1",
            "password_confirm": "Pass1",
            "nickname": "newuser"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_invalid_email(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "not-an-email",
            "password": "Password123",
            "password_confirm": "Password123",
            "nickname": "newuser"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_nickname_too_long(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "newuser@test.com",
            "password": "Password123",
            "password_confirm": "Password123",
            "nickname": "x".repeat(21)
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_nickname_invalid_characters(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "newuser@test.com",
            "password": "Password123",
            "password_confirm": "Password123",
            "nickname": "nick name"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_missing_fields(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "newuser@test.com"
        });

        let response = server.post("/api/v1/accounts").json(&body).await;

        // 422 Unprocessable Entity quando manca un campo obbligatorio
        response.assert_status_unprocessable_entity();
        Ok(())
    }

    // ============================================================
    // Test per POST /api/v1/accounts/signin - signin
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signup_then_signin(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let register_body = json!({
            "email": "login@test.com",
            "password": "TestLogin123",
            "password_confirm": "TestLogin123",
            "nickname": "logintest"
        });

        let register_response = server.post("/api/v1/accounts").json(&register_body).await;
        register_response.assert_status(axum::http::StatusCode::CREATED);

        let login_body = json!({
            "email": "login@test.com",
            "password": "TestLogin123"
        });

        let response = server.post("/api/v1/accounts/signin").json(&login_body).await;

        response.assert_status_ok();

        let headers = response.headers();
        assert!(
            headers.get("set-cookie").is_some(),
            "Set-Cookie header should be present"
        );
        let auth_header = headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth_header.starts_with("Bearer "));

        let body: serde_json::Value = response.json();
        assert_eq!(body["nickname"], "logintest");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signin_wrong_password(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "alice@test.com",
            "password": "wrongpassword"
        });

        let response = server.post("/api/v1/accounts/signin").json(&body).await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signin_nonexistent_user(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "email": "nobody@test.com",
            "password": "Password123"
        });

        let response = server.post("/api/v1/accounts/signin").json(&body).await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_signout_clears_cookie(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server.post("/api/v1/accounts/signout").await;

        response.assert_status_ok();
        let cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.contains("Max-Age=0"));

        Ok(())
    }

    // ============================================================
    // Test per POST /api/v1/accounts/kakao - login social
    // ============================================================

    async fn mock_kakao(body: serde_json::Value) -> wiremock::MockServer {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_kakao_signin_creates_then_reuses_account(pool: MySqlPool) -> sqlx::Result<()> {
        let kakao = mock_kakao(json!({
            "id": 12345,
            "kakao_account": {
                "email": "kakao@test.com",
                "profile": { "nickname": "kakaochef" }
            }
        }))
        .await;

        let state =
            create_test_state_with_kakao(pool, &format!("{}/v2/user/me", kakao.uri()));
        let server = create_test_server(state);

        let response = server
            .post("/api/v1/accounts/kakao")
            .json(&json!({ "access_token": "kakao-token" }))
            .await;

        response.assert_status_ok();
        assert!(response.headers().get("set-cookie").is_some());
        let body: serde_json::Value = response.json();
        assert_eq!(body["nickname"], "kakaochef");

        // la seconda chiamata ritrova l'account invece di crearne un altro
        let again = server
            .post("/api/v1/accounts/kakao")
            .json(&json!({ "access_token": "kakao-token" }))
            .await;
        again.assert_status_ok();
        let body: serde_json::Value = again.json();
        assert_eq!(body["nickname"], "kakaochef");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_kakao_signin_mints_nickname_on_collision(pool: MySqlPool) -> sqlx::Result<()> {
        // il nickname di Kakao è già preso da un utente delle fixtures
        let kakao = mock_kakao(json!({
            "id": 6789,
            "kakao_account": {
                "email": "another-kakao@test.com",
                "profile": { "nickname": "alice" }
            }
        }))
        .await;

        let state =
            create_test_state_with_kakao(pool, &format!("{}/v2/user/me", kakao.uri()));
        let server = create_test_server(state);

        let response = server
            .post("/api/v1/accounts/kakao")
            .json(&json!({ "access_token": "kakao-token" }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let nickname = body["nickname"].as_str().unwrap();

        // coniato dalle tabelle prefisso+suffisso, mai quello in conflitto
        assert_ne!(nickname, "alice");
        assert!(nickname.contains('-'), "unexpected nickname: {nickname}");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_kakao_signin_rejected_token(pool: MySqlPool) -> sqlx::Result<()> {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let kakao = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&kakao)
            .await;

        let state =
            create_test_state_with_kakao(pool, &format!("{}/v2/user/me", kakao.uri()));
        let server = create_test_server(state);

        let response = server
            .post("/api/v1/accounts/kakao")
            .json(&json!({ "access_token": "expired" }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_kakao_signin_without_email_consent(pool: MySqlPool) -> sqlx::Result<()> {
        // senza email condivisa non possiamo creare l'account
        let kakao = mock_kakao(json!({
            "id": 111,
            "kakao_account": { "profile": { "nickname": "noemail" } }
        }))
        .await;

        let state =
            create_test_state_with_kakao(pool, &format!("{}/v2/user/me", kakao.uri()));
        let server = create_test_server(state);

        let response = server
            .post("/api/v1/accounts/kakao")
            .json(&json!({ "access_token": "kakao-token" }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    // ============================================================
    // Test per GET/PATCH /api/v1/accounts/profile
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_profile_requires_auth(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server.get("/api/v1/accounts/profile").await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_get_profile_with_food_preferences(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/api/v1/accounts/profile")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .await;

        response.assert_status_ok();
        let profile: serde_json::Value = response.json();

        assert_eq!(profile["nickname"], "alice");
        assert_eq!(profile["role"], "USER");
        // alice ha peanut + gluten nelle fixtures, in ordine alfabetico
        assert_eq!(profile["allergies"], json!(["gluten", "peanut"]));
        assert_eq!(profile["preferred_cuisines"], json!(["korean"]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_profile(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "age": 29,
            "is_vegan": true,
            "allergy_ids": [2],
            "preferred_cuisine_ids": [2, 3]
        });

        let response = server
            .patch("/api/v1/accounts/profile")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .json(&body)
            .await;

        response.assert_status_ok();
        let profile: serde_json::Value = response.json();

        assert_eq!(profile["age"], 29);
        assert_eq!(profile["is_vegan"], true);
        // il nickname non era nel body e resta invariato
        assert_eq!(profile["nickname"], "alice");
        assert_eq!(profile["allergies"], json!(["shellfish"]));
        assert_eq!(profile["preferred_cuisines"], json!(["italian", "japanese"]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_profile_nickname_conflict(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({ "nickname": "bob" });

        let response = server
            .patch("/api/v1/accounts/profile")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .json(&body)
            .await;

        response.assert_status_conflict();
        Ok(())
    }

    // ============================================================
    // Test per POST /api/v1/accounts/password
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_change_password_roundtrip(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        // registrazione (serve un hash reale per verificare la vecchia password)
        let register_body = json!({
            "email": "pw@test.com",
            "password": "OldPassword1",
            "password_confirm": "OldPassword1",
            "nickname": "pwtester"
        });
        let register_response = server.post("/api/v1/accounts").json(&register_body).await;
        register_response.assert_status(axum::http::StatusCode::CREATED);
        let created: serde_json::Value = register_response.json();
        let user_id = created["id"].as_i64().unwrap() as i32;

        let change_body = json!({
            "old_password": "OldPassword1",
            "new_password": "NewPassword1",
            "new_password_confirm": "NewPassword1"
        });

        let response = server
            .post("/api/v1/accounts/password")
            .add_header("authorization", bearer(user_id, "pw@test.com"))
            .json(&change_body)
            .await;

        response.assert_status_ok();

        // la vecchia password non funziona più
        let old_login = server
            .post("/api/v1/accounts/signin")
            .json(&json!({ "email": "pw@test.com", "password": "OldPassword1" }))
            .await;
        old_login.assert_status_unauthorized();

        // quella nuova sì
        let new_login = server
            .post("/api/v1/accounts/signin")
            .json(&json!({ "email": "pw@test.com", "password": "NewPassword1" }))
            .await;
        new_login.assert_status_ok();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_change_password_wrong_old(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "old_password": "not-the-password",
            "new_password": "NewPassword1",
            "new_password_confirm": "NewPassword1"
        });

        let response = server
            .post("/api/v1/accounts/password")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .json(&body)
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    // ============================================================
    // Test per DELETE /api/v1/accounts/me
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_delete_account_deactivates(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let token = bearer(1, "alice@test.com");

        let response = server
            .delete("/api/v1/accounts/me")
            .add_header("authorization", token.clone())
            .await;

        response.assert_status_ok();

        // lo stesso token non passa più il middleware: account disattivato
        let profile = server
            .get("/api/v1/accounts/profile")
            .add_header("authorization", token)
            .await;
        profile.assert_status_unauthorized();

        Ok(())
    }

    // ============================================================
    // Test per GET /api/v1/accounts/verify-email/{token}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_verify_email_token_single_use(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        // bob non è verificato nelle fixtures
        state.email.create_token("test-token-1", &2).await.unwrap();

        let response = server
            .get("/api/v1/accounts/verify-email/test-token-1")
            .await;
        response.assert_status_ok();

        let profile = server
            .get("/api/v1/accounts/profile")
            .add_header("authorization", bearer(2, "bob@test.com"))
            .await;
        let body: serde_json::Value = profile.json();
        assert_eq!(body["email_verified"], true);

        // il token è monouso
        let second = server
            .get("/api/v1/accounts/verify-email/test-token-1")
            .await;
        second.assert_status_not_found();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_verify_email_unknown_token(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server.get("/api/v1/accounts/verify-email/nope").await;

        response.assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // Test per POST /api/v1/accounts/emails - email amministrative
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_bulk_email_requires_admin(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "subject": "Hello",
            "message": "Monthly news",
            "recipient_ids": [1, 2]
        });

        let response = server
            .post("/api/v1/accounts/emails")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .json(&body)
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_bulk_email_as_admin(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "subject": "Hello",
            "message": "Monthly news",
            "recipient_ids": [1, 2]
        });

        let response = server
            .post("/api/v1/accounts/emails")
            .add_header("authorization", bearer(3, "admin@test.com"))
            .json(&body)
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let created: serde_json::Value = response.json();
        assert_eq!(created["recipients"], 2);

        Ok(())
    }
}
