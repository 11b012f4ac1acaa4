use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use storyboard_api::{app, AppState, MemoryStore, TokenIssuer};
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

struct TestApp {
    router: Router,
}

struct Response {
    status: StatusCode,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl Response {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).expect("json body")
    }
}

impl TestApp {
    fn new() -> Self {
        Self::with_limit(BODY_LIMIT)
    }

    fn with_limit(limit: usize) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), TokenIssuer::new("test-secret", 3600));
        TestApp {
            router: app(state, limit),
        }
    }

    async fn send(&self, req: Request<Body>) -> Response {
        let resp = self.router.clone().oneshot(req).await.expect("oneshot");
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body").to_vec();
        Response { status, content_type, bytes }
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = self.send(req).await;
        let value = if resp.bytes.is_empty() { Value::Null } else { resp.json() };
        (resp.status, value)
    }

    async fn upload(&self, uri: &str, token: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: {ct}\r\n\r\n",
                b = boundary,
                ct = content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let resp = self.send(req).await;
        (resp.status, resp.json())
    }

    /// Registers and logs in; returns (user id, token).
    async fn login(&self, username: &str) -> (String, String) {
        let (status, _) = self
            .call(
                "POST",
                "/api/users",
                None,
                Some(json!({ "name": "Ada", "surname": "Lovelace", "username": username, "password": "p4ss" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self
            .call("POST", "/api/auth", None, Some(json!({ "username": username, "password": "p4ss" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }
}

#[tokio::test]
async fn health_and_version_are_public() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = app.call("GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");
    let (_, body) = app.call("GET", "/version", None, None).await;
    assert_eq!(body["name"], "storyboard-api");
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let app = TestApp::new();

    let (status, body) = app
        .call("POST", "/api/users", None, Some(json!({ "name": "Ada", "surname": "L", "password": "p" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username is not a string");

    let (status, body) = app
        .call(
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "Ada", "surname": "L", "username": "   ", "password": "p" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username is empty or blank");

    let (status, _) = app
        .call("POST", "/api/users", None, Some(json!({ "name": 7, "surname": "L", "username": "ada", "password": "p" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.login("ada").await;
    let (status, body) = app
        .call(
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "Other", "surname": "O", "username": "ada", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn user_routes_need_the_matching_token() {
    let app = TestApp::new();
    let (ada, ada_token) = app.login("ada").await;
    let (_, eve_token) = app.login("eve").await;

    let (status, body) = app.call("GET", &format!("/api/users/{}", ada), Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "ada");
    assert!(body["data"].get("passwordHash").is_none());

    let (status, _) = app.call("GET", &format!("/api/users/{}", ada), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.call("GET", &format!("/api/users/{}", ada), Some(&eve_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.call("GET", &format!("/api/users/{}", ada), Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("POST", "/api/auth", None, Some(json!({ "username": "ada", "password": "wrong" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_keeps_other_fields() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;
    let uri = format!("/api/users/{}", ada);

    let (status, _) = app.call("PATCH", &uri, Some(&token), Some(json!({ "surname": "King" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("PATCH", &uri, Some(&token), Some(json!({ "surname": "King", "password": "p4ss" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user updated");

    let (_, body) = app.call("GET", &uri, Some(&token), None).await;
    assert_eq!(body["data"]["name"], "Ada");
    assert_eq!(body["data"]["surname"], "King");
}

#[tokio::test]
async fn story_and_page_lifecycle() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;
    let t = Some(token.as_str());

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/users/{}/stories", ada),
            t,
            Some(json!({ "title": "The Engine", "audience": "kids", "initLang": "en" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let story = body["data"]["id"].as_str().unwrap().to_string();
    let story_uri = format!("/api/users/{}/stories/{}", ada, story);

    let (status, body) = app
        .call("POST", &format!("{}/pages", story_uri), t, Some(json!({ "text": "Once upon a time" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let page = body["data"]["id"].as_str().unwrap().to_string();
    let page_uri = format!("{}/pages/{}", story_uri, page);

    let (status, _) = app
        .call(
            "PATCH",
            &page_uri,
            t,
            Some(json!({ "vectors": [{ "x": 1.0, "y": 2.0, "color": "#123", "lineWidth": 3.0 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("GET", &page_uri, t, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "Once upon a time");
    assert_eq!(body["data"]["vectors"][0]["lineWidth"], 3.0);
    assert_eq!(body["data"]["vectors"][0]["dragging"], false);

    let (status, _) = app.call("PATCH", &story_uri, t, Some(json!({ "title": "The Analytical Engine" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call("GET", &story_uri, t, None).await;
    assert_eq!(body["data"]["title"], "The Analytical Engine");
    assert_eq!(body["data"]["audience"], "kids");
    assert_eq!(body["data"]["initLang"], "en");
    assert_eq!(body["data"]["inProcess"], true);
    assert_eq!(body["data"]["pages"].as_array().unwrap().len(), 1);

    let (status, body) = app.call("GET", "/api/stories?query=analytical", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app.call("PATCH", &format!("{}/finish", story_uri), t, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call("GET", "/api/stories?query=analytical", None, None).await;
    assert_eq!(body["data"][0]["id"], story.as_str());

    let (status, _) = app.call("GET", "/api/stories", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("DELETE", &page_uri, t, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("GET", &page_uri, t, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("DELETE", &story_uri, t, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.call("GET", &story_uri, t, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn cover_upload_and_public_read() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;
    let (_, body) = app
        .call(
            "POST",
            &format!("/api/users/{}/stories", ada),
            Some(&token),
            Some(json!({ "title": "Covers", "audience": "all" })),
        )
        .await;
    let story = body["data"]["id"].as_str().unwrap().to_string();
    let cover_uri = format!("/api/users/{}/stories/{}/cover", ada, story);

    let (status, _) = app.upload(&cover_uri, &token, "text/plain", b"not an image").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    let (status, body) = app.upload(&cover_uri, &token, "image/png", &png).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "cover saved");

    let resp = app
        .send(Request::builder().uri(&cover_uri).body(Body::empty()).unwrap())
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type.as_deref(), Some("image/png"));
    assert_eq!(resp.bytes, png.to_vec());
}

#[tokio::test]
async fn favourites_over_http() {
    let app = TestApp::new();
    let (ada, ada_token) = app.login("ada").await;
    let (grace, grace_token) = app.login("grace").await;

    let (_, body) = app
        .call(
            "POST",
            &format!("/api/users/{}/stories", ada),
            Some(&ada_token),
            Some(json!({ "title": "Shared", "audience": "all" })),
        )
        .await;
    let story = body["data"]["id"].as_str().unwrap().to_string();
    app.call("PATCH", &format!("/api/users/{}/stories/{}/finish", ada, story), Some(&ada_token), None)
        .await;

    let fav_uri = format!("/api/users/{}/favourites/{}", grace, story);
    let (status, _) = app.call("POST", &fav_uri, Some(&grace_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("POST", &fav_uri, Some(&grace_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app
        .call("GET", &format!("/api/users/{}/favourites", grace), Some(&grace_token), None)
        .await;
    assert_eq!(body["data"][0]["title"], "Shared");

    let (status, _) = app.call("DELETE", &fav_uri, Some(&grace_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("DELETE", &fav_uri, Some(&grace_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn postits_assign_and_unassign_over_http() {
    let app = TestApp::new();
    let (ada, ada_token) = app.login("ada").await;
    let (grace, grace_token) = app.login("grace").await;
    let a = Some(ada_token.as_str());

    let (status, body) = app
        .call("POST", &format!("/api/users/{}/postits", ada), a, Some(json!({ "text": "draft chapter" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let postit = body["data"]["id"].as_str().unwrap().to_string();
    let postit_uri = format!("/api/users/{}/postits/{}", ada, postit);

    let (_, body) = app.call("GET", &format!("/api/users/{}/postits", ada), a, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["text"], "draft chapter");
    assert_eq!(body["data"][0]["status"], "TODO");

    let (status, _) = app
        .call("PATCH", &format!("{}/assign", postit_uri), a, Some(json!({ "assignee": grace })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("POST", &format!("/api/users/{}/collaborators", ada), a, Some(json!({ "username": "grace" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .call("PATCH", &format!("{}/assign", postit_uri), a, Some(json!({ "assignee": grace })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call("GET", &format!("/api/users/{}/postits", grace), Some(&grace_token), None)
        .await;
    assert_eq!(body["data"][0]["assignee"], grace.as_str());

    let (status, _) = app.call("PATCH", &format!("{}/unassign", postit_uri), a, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .call("GET", &format!("/api/users/{}/postits", grace), Some(&grace_token), None)
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app.call("PATCH", &postit_uri, a, Some(json!({ "status": "SOMEDAY" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.call("PATCH", &postit_uri, a, Some(json!({ "status": "DONE" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("DELETE", &postit_uri, a, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("DELETE", &postit_uri, a, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_and_bodies_are_bad_requests() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;

    let (status, _) = app
        .call("GET", &format!("/api/users/{}/stories/not-a-uuid", ada), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/users/{}/postits", ada))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"].is_string());
}

#[tokio::test]
async fn non_multipart_upload_gets_the_error_envelope() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;
    let (_, body) = app
        .call(
            "POST",
            &format!("/api/users/{}/stories", ada),
            Some(&token),
            Some(json!({ "title": "Plain", "audience": "all" })),
        )
        .await;
    let story = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/users/{}/stories/{}/cover", ada, story),
            Some(&token),
            Some(json!({ "cover": "inline" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn oversized_json_body_is_payload_too_large() {
    let app = TestApp::with_limit(64);
    let (status, body) = app
        .call(
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "A".repeat(200), "surname": "B", "username": "big", "password": "p" })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn page_attachments_and_process_toggle_over_http() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;
    let (_, body) = app
        .call(
            "POST",
            &format!("/api/users/{}/stories", ada),
            Some(&token),
            Some(json!({ "title": "Sounds", "audience": "kids" })),
        )
        .await;
    let story = body["data"]["id"].as_str().unwrap().to_string();
    let story_uri = format!("/api/users/{}/stories/{}", ada, story);
    let (status, body) = app
        .call("POST", &format!("{}/pages", story_uri), Some(&token), Some(json!({ "text": "once" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let page_uri = format!("{}/pages/{}", story_uri, body["data"]["id"].as_str().unwrap());

    let (status, _) = app
        .upload(&format!("{}/picture", page_uri), &token, "audio/mpeg", b"ID3")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .upload(&format!("{}/picture", page_uri), &token, "image/jpeg", b"\xff\xd8")
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .upload(&format!("{}/audio", page_uri), &token, "audio/mpeg", b"ID3")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call("GET", &page_uri, Some(&token), None).await;
    assert_eq!(body["data"]["hasImage"], true);
    assert_eq!(body["data"]["hasAudio"], true);

    let authed = |uri: String| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };
    let resp = app.send(authed(format!("{}/audio", page_uri))).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(resp.bytes, b"ID3".to_vec());
    let resp = app.send(authed(format!("{}/picture", page_uri))).await;
    assert_eq!(resp.content_type.as_deref(), Some("image/jpeg"));

    let (status, _) = app.call("GET", &format!("{}/picture", page_uri), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("PATCH", &format!("{}/finish", story_uri), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call("GET", &story_uri, Some(&token), None).await;
    assert_eq!(body["data"]["inProcess"], false);
    let (status, _) = app.call("PATCH", &format!("{}/process", story_uri), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call("GET", &story_uri, Some(&token), None).await;
    assert_eq!(body["data"]["inProcess"], true);
}

#[tokio::test]
async fn collaborators_over_http() {
    let app = TestApp::new();
    let (ada, token) = app.login("ada").await;
    let (grace, _) = app.login("grace").await;
    let uri = format!("/api/users/{}/collaborators", ada);

    let (status, _) = app.call("POST", &uri, Some(&token), Some(json!({ "username": "grace" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("POST", &uri, Some(&token), Some(json!({ "username": "grace" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.call("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], grace.as_str());
    assert!(list[0].get("passwordHash").is_none());
}
