//! End-to-end checks over the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn requests_without_session_are_unauthorized() {
    let app = spawn_app().await;
    let (status, _, body) = app.request(Method::GET, "/conversations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_and_me() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;

    let (status, me) = app.get("/me", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["profileComplete"], false);

    let (status, _, _) = app
        .request(
            Method::POST,
            "/login",
            Some(json!({ "username": "alice", "password": "wrong password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, body) = app
        .request(
            Method::POST,
            "/login",
            Some(json!({ "username": "alice", "password": "correct horse" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], alice.user_id);
    assert!(cookie.is_some());
}

#[tokio::test]
async fn chat_polling_round_trip() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;

    let (status, started) = app.post("/chats", json!({ "userId": b.user_id }), &a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["chat"]["user1Id"], a.user_id.min(b.user_id));
    let chat_id = started["chat"]["id"].as_i64().unwrap();
    let path = format!("/conversations/chat/{chat_id}/messages");

    let (status, _) = app.post(&path, json!({ "text": "hi" }), &a).await;
    assert_eq!(status, StatusCode::OK);

    let (status, polled) = app.get(&path, &b).await;
    assert_eq!(status, StatusCode::OK);
    let messages = polled["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hi");
    assert_eq!(messages[0]["isMe"], false);
    let hi_id = messages[0]["id"].as_i64().unwrap();

    app.post(&path, json!({ "text": "hey" }), &b).await;
    let (_, polled) = app.get(&format!("{path}?lastId={hi_id}"), &a).await;
    let messages = polled["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hey");

    // nothing new since the last message
    let last = messages[0]["id"].as_i64().unwrap();
    let (_, polled) = app.get(&format!("{path}?lastId={last}"), &a).await;
    assert!(polled["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn message_errors_map_to_status_codes() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;
    let c = app.register("c").await;

    let (_, started) = app.post("/chats", json!({ "userId": b.user_id }), &a).await;
    let chat_id = started["chat"]["id"].as_i64().unwrap();
    let path = format!("/conversations/chat/{chat_id}/messages");

    let (status, body) = app.post(&path, json!({ "text": "   " }), &a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = app.post(&path, json!({ "text": "intrude" }), &c).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&path, &c).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/conversations/chat/9999/messages", &a).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/conversations/channel/1/messages", &a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/chats", json!({ "userId": a.user_id }), &a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_OPERATION");
}

#[tokio::test]
async fn group_settings_are_creator_only() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;

    let (status, created) = app.post("/groups", json!({ "name": "Devs" }), &a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["group"]["icon"], "👥");
    let group_id = created["group"]["id"].as_i64().unwrap();

    let (status, body) = app
        .post(&format!("/groups/{group_id}/icon"), json!({ "value": "🔥" }), &a)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "value": "🔥" }));

    let (status, _) = app
        .post(&format!("/groups/{group_id}/icon"), json!({ "value": "🔥" }), &b)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(&format!("/groups/{group_id}/icon"), json!({ "value": "x" }), &a)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/groups", json!({ "name": "" }), &a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn group_membership_lifecycle() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;

    let (_, created) = app.post("/groups", json!({ "name": "Devs" }), &a).await;
    let group_id = created["group"]["id"].as_i64().unwrap();
    let path = format!("/conversations/group/{group_id}/messages");

    // readable before joining, writable only after
    let (status, _) = app.get(&path, &b).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&path, json!({ "text": "hello?" }), &b).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&format!("/groups/{group_id}/join"), json!({}), &b).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&path, json!({ "text": "hello!" }), &b).await;
    assert_eq!(status, StatusCode::OK);

    let (_, details) = app.get(&format!("/groups/{group_id}"), &b).await;
    assert_eq!(details["memberCount"], 2);
    assert_eq!(details["isMember"], true);
    assert_eq!(details["isCreator"], false);

    let (status, _) = app.post(&format!("/groups/{group_id}/leave"), json!({}), &a).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post(&format!("/groups/{group_id}/leave"), json!({}), &b).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&path, json!({ "text": "still here?" }), &b).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&format!("/groups/{group_id}/delete"), json!({}), &b).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post(&format!("/groups/{group_id}/delete"), json!({}), &a).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&path, &a).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_lists_only_active_conversations() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;
    let c = app.register("c").await;

    app.post("/chats", json!({ "userId": b.user_id }), &a).await;
    let (_, started) = app.post("/chats", json!({ "userId": c.user_id }), &a).await;
    let active_id = started["chat"]["id"].as_i64().unwrap();
    app.post(
        &format!("/conversations/chat/{active_id}/messages"),
        json!({ "text": "only one" }),
        &c,
    )
    .await;

    let (status, feed) = app.get("/conversations", &a).await;
    assert_eq!(status, StatusCode::OK);
    let conversations = feed["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["type"], "chat");
    assert_eq!(conversations[0]["id"], active_id);
    assert_eq!(conversations[0]["lastMessage"]["text"], "only one");

    let (status, feed) = app.get("/conversations?filter=favorited", &a).await;
    assert_eq!(status, StatusCode::OK);
    assert!(feed["conversations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn favorite_toggle_alternates() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;
    let c = app.register("c").await;

    let (_, started) = app.post("/chats", json!({ "userId": b.user_id }), &a).await;
    let chat_id = started["chat"]["id"].as_i64().unwrap();
    let toggle = json!({ "targetId": chat_id, "targetType": "chat" });

    let (_, first) = app.post("/favorites", toggle.clone(), &a).await;
    assert_eq!(first["favorited"], true);
    let (_, second) = app.post("/favorites", toggle.clone(), &a).await;
    assert_eq!(second["favorited"], false);

    let (status, _) = app.post("/favorites", toggle, &c).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_a_chat_removes_its_favorites() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;

    let (_, started) = app.post("/chats", json!({ "userId": b.user_id }), &a).await;
    let chat_id = started["chat"]["id"].as_i64().unwrap();
    app.post(&format!("/conversations/chat/{chat_id}/messages"), json!({ "text": "bye" }), &a)
        .await;
    app.post("/favorites", json!({ "targetId": chat_id, "targetType": "chat" }), &b)
        .await;

    let (status, _) = app.post(&format!("/chats/{chat_id}/delete"), json!({}), &b).await;
    assert_eq!(status, StatusCode::OK);

    let (favorites,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    let (messages,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!((favorites, messages), (0, 0));
}

#[tokio::test]
async fn message_color_validation() {
    let app = spawn_app().await;
    let a = app.register("a").await;

    let (status, _) = app.post("/profile/color", json!({ "color": "#00ff00" }), &a).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post("/profile/color", json!({ "color": "green" }), &a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, profile) = app.get("/profile", &a).await;
    assert_eq!(profile["profile"]["messageColor"], "#00ff00");
    assert_eq!(profile["complete"], false);
}

#[tokio::test]
async fn unprovisioned_storage_rejects_writes_as_unavailable() {
    let app = spawn_app().await;
    let a = app.register("a").await;
    let b = app.register("b").await;

    let (_, started) = app.post("/chats", json!({ "userId": b.user_id }), &a).await;
    let chat_id = started["chat"]["id"].as_i64().unwrap();
    let (_, created) = app.post("/groups", json!({ "name": "Devs" }), &a).await;
    let group_id = created["group"]["id"].as_i64().unwrap();

    sqlx::raw_sql("DROP TABLE favorites; DROP TABLE group_members; DROP TABLE groups;")
        .execute(&app.db_pool)
        .await
        .unwrap();

    let writes = [
        (format!("/groups/{group_id}/join"), json!({}), &b),
        (format!("/groups/{group_id}/leave"), json!({}), &b),
        (format!("/groups/{group_id}/name"), json!({ "value": "Ops" }), &a),
        (format!("/groups/{group_id}/delete"), json!({}), &a),
        ("/groups".to_owned(), json!({ "name": "Ops" }), &a),
        (
            format!("/conversations/group/{group_id}/messages"),
            json!({ "text": "hi" }),
            &a,
        ),
        (
            "/favorites".to_owned(),
            json!({ "targetId": group_id, "targetType": "group" }),
            &a,
        ),
        (
            "/favorites".to_owned(),
            json!({ "targetId": chat_id, "targetType": "chat" }),
            &a,
        ),
        (format!("/chats/{chat_id}/delete"), json!({}), &a),
    ];
    for (path, body, user) in writes {
        let (status, reply) = app.post(&path, body, user).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "POST {path}: {reply}");
        assert_eq!(reply["error"], "SERVICE_UNAVAILABLE");
    }

    // chats still list
    let (status, _) = app.get("/conversations", &a).await;
    assert_eq!(status, StatusCode::OK);
}
