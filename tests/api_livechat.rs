//! Integration tests per il livechat: REST e WebSocket
//!
//! Test per:
//! - GET/POST /api/v1/livechat/chatrooms
//! - DELETE /api/v1/livechat/chatrooms/{room_id}
//! - GET/POST /api/v1/livechat/chatrooms/{room_id}/messages
//! - WS /ws/chat/{room_id} (broadcast e isolamento tra stanze)
//!
//! I test WebSocket avviano un server axum vero su una porta effimera e
//! si collegano con tokio-tungstenite passando il token nel cookie, come
//! farebbe un browser.

mod common;

#[cfg(test)]
mod livechat_tests {
    use super::common::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use sqlx::MySqlPool;
    use std::sync::Arc;
    use tastept::core::AppState;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::Message;

    // ============================================================
    // REST
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_list_rooms_anonymous(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server.get("/api/v1/livechat/chatrooms").await;

        response.assert_status_ok();
        let rooms: serde_json::Value = response.json();
        assert_eq!(rooms.as_array().unwrap().len(), 2);
        assert_eq!(rooms[0]["title"], "Weeknight dinners");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_create_room(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "title": "Noodle lovers",
            "content": "Everything noodles",
            "hashtags": "#noodles"
        });

        let response = server
            .post("/api/v1/livechat/chatrooms")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .json(&body)
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let room: serde_json::Value = response.json();
        assert_eq!(room["title"], "Noodle lovers");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_create_room_without_authentication(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({ "title": "Anonymous room", "content": "nope" });

        let response = server.post("/api/v1/livechat/chatrooms").json(&body).await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_delete_room(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .delete("/api/v1/livechat/chatrooms/2")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .await;

        response.assert_status(axum::http::StatusCode::NO_CONTENT);

        let missing = server
            .delete("/api/v1/livechat/chatrooms/2")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .await;
        missing.assert_status_not_found();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_list_messages(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/api/v1/livechat/chatrooms/1/messages")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .await;

        response.assert_status_ok();
        let messages: serde_json::Value = response.json();
        let list = messages.as_array().unwrap();
        assert_eq!(list.len(), 2);
        // ordine cronologico, con il nickname del mittente
        assert_eq!(list[0]["nickname"], "alice");
        assert_eq!(list[1]["nickname"], "bob");
        assert_eq!(list[1]["content"], "Yes! Double the gochujang.");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_list_messages_requires_auth(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server.get("/api/v1/livechat/chatrooms/1/messages").await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_post_message(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({ "content": "Fresh tip: use day-old rice" });

        let response = server
            .post("/api/v1/livechat/chatrooms/1/messages")
            .add_header("authorization", bearer(2, "bob@test.com"))
            .json(&body)
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let message: serde_json::Value = response.json();
        assert_eq!(message["nickname"], "bob");
        assert_eq!(message["content"], "Fresh tip: use day-old rice");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_post_message_missing_room(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({ "content": "hello?" });

        let response = server
            .post("/api/v1/livechat/chatrooms/999/messages")
            .add_header("authorization", bearer(1, "alice@test.com"))
            .json(&body)
            .await;

        response.assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // WebSocket
    // ============================================================

    /// Avvia il server su una porta effimera e ritorna l'indirizzo
    async fn spawn_server(state: Arc<AppState>) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = tastept::create_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        addr
    }

    /// Connessione WebSocket autenticata via cookie, come un browser
    async fn connect_ws(
        addr: std::net::SocketAddr,
        path: &str,
        user_id: i32,
        email: &str,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let url = format!("ws://{}{}", addr, path);
        let mut request = url.into_client_request().unwrap();
        request.headers_mut().insert(
            "Cookie",
            format!("token={}", create_test_jwt(user_id, email))
                .parse()
                .unwrap(),
        );

        let (socket, _) = tokio_tungstenite::connect_async(request)
            .await
            .expect("WebSocket handshake failed");
        socket
    }

    async fn next_text(
        socket: &mut tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> serde_json::Value {
        loop {
            let msg = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .expect("socket error");

            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_ws_broadcast_within_room(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let addr = spawn_server(state).await;

        let mut alice = connect_ws(addr, "/ws/chat/1", 1, "alice@test.com").await;
        let mut bob = connect_ws(addr, "/ws/chat/1", 2, "bob@test.com").await;

        // lascia il tempo ai task di iscriversi al canale della stanza
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        alice
            .send(Message::Text(
                json!({ "message": "Dinner is ready" }).to_string().into(),
            ))
            .await
            .unwrap();

        // entrambi i connessi ricevono il frame con il nickname del mittente
        let frame_bob = next_text(&mut bob).await;
        assert_eq!(frame_bob["sender"], "alice");
        assert_eq!(frame_bob["message"], "Dinner is ready");

        let frame_alice = next_text(&mut alice).await;
        assert_eq!(frame_alice["sender"], "alice");

        // il messaggio è stato persistito prima del broadcast
        let stored = sqlx::query!(
            "SELECT COUNT(*) as total FROM chat_messages WHERE room_id = 1 AND content = 'Dinner is ready'"
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(stored.total, 1);

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_ws_rooms_are_isolated(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state).await;

        let mut alice = connect_ws(addr, "/ws/chat/1", 1, "alice@test.com").await;
        let mut bob_other_room = connect_ws(addr, "/ws/chat/2", 2, "bob@test.com").await;

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        alice
            .send(Message::Text(
                json!({ "message": "Room 1 only" }).to_string().into(),
            ))
            .await
            .unwrap();

        // alice (stanza 1) riceve il proprio frame
        let frame = next_text(&mut alice).await;
        assert_eq!(frame["message"], "Room 1 only");

        // bob (stanza 2) non deve ricevere nulla
        let nothing = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            bob_other_room.next(),
        )
        .await;
        assert!(nothing.is_err(), "room 2 received a frame from room 1");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_ws_empty_message_gets_error_frame(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state).await;

        let mut alice = connect_ws(addr, "/ws/chat/1", 1, "alice@test.com").await;
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        alice
            .send(Message::Text(json!({ "message": "  " }).to_string().into()))
            .await
            .unwrap();

        let frame = next_text(&mut alice).await;
        assert_eq!(frame["sender"], "system");
        assert!(frame["error"].as_str().unwrap().contains("empty"));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_ws_requires_authentication(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state).await;

        // nessun cookie: l'handshake deve essere rifiutato
        let url = format!("ws://{}/ws/chat/1", addr);
        let request = url.into_client_request().unwrap();
        let result = tokio_tungstenite::connect_async(request).await;

        assert!(result.is_err(), "handshake should fail without a token");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "rooms")))]
    async fn test_ws_unknown_room_rejected(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state).await;

        let url = format!("ws://{}/ws/chat/999", addr);
        let mut request = url.into_client_request().unwrap();
        request.headers_mut().insert(
            "Cookie",
            format!("token={}", create_test_jwt(1, "alice@test.com"))
                .parse()
                .unwrap(),
        );

        let result = tokio_tungstenite::connect_async(request).await;
        assert!(result.is_err(), "handshake should fail for a missing room");

        Ok(())
    }
}
