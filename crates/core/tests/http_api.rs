//! HTTP auth and REST client against a local axum backend.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{Multipart, Path};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;
use zombload::protocol::api::{MediaKind, Profile, TextPool};
use zombload::{AuthCollaborator, Credentials, Error, HttpAuth, HttpBackend, PanelApi};

const SESSION: &str = "session=tok123";

async fn multipart_fields(mut multipart: Multipart) -> HashMap<String, (Option<String>, Vec<u8>)> {
	let mut fields = HashMap::new();
	while let Some(field) = multipart.next_field().await.unwrap() {
		let name = field.name().unwrap_or_default().to_string();
		let file_name = field.file_name().map(str::to_owned);
		let bytes = field.bytes().await.unwrap().to_vec();
		fields.insert(name, (file_name, bytes));
	}
	fields
}

fn text(fields: &HashMap<String, (Option<String>, Vec<u8>)>, name: &str) -> String {
	fields
		.get(name)
		.map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
		.unwrap_or_default()
}

fn has_session(headers: &HeaderMap) -> bool {
	headers
		.get(COOKIE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|cookie| cookie.contains(SESSION))
}

fn envelope(status: &str, message: impl Into<String>) -> Json<Value> {
	Json(json!({ "status": status, "message": message.into() }))
}

async fn login(multipart: Multipart) -> Response {
	let fields = multipart_fields(multipart).await;
	if text(&fields, "username") == "admin" && text(&fields, "password") == "admin" {
		([(SET_COOKIE, format!("{SESSION}; Path=/; HttpOnly"))], envelope("success", "Logged in")).into_response()
	} else {
		(StatusCode::UNAUTHORIZED, envelope("error", "Invalid credentials")).into_response()
	}
}

async fn get_profile(Path(name): Path<String>) -> Response {
	if name != "Contoh Profil" {
		return (StatusCode::NOT_FOUND, envelope("error", "Profile not found")).into_response();
	}
	Json(json!({
		"name": name,
		"video_folder": "profiles/contoh/videos",
		"num_video": "2",
		"monetization": false,
		"auth_status": "Not Authenticated"
	}))
	.into_response()
}

async fn save_profile(Json(body): Json<Value>) -> Json<Value> {
	envelope(
		"success",
		format!("{} saved with category {}", body["profile_name"].as_str().unwrap_or(""), body["category"].as_str().unwrap_or("")),
	)
}

async fn upload_file(multipart: Multipart) -> Json<Value> {
	let fields = multipart_fields(multipart).await;
	let (file_name, bytes) = fields.get("file").cloned().unwrap_or_default();
	envelope(
		"success",
		format!(
			"{}:{}:{}:{}",
			text(&fields, "profile_name"),
			text(&fields, "file_type"),
			file_name.unwrap_or_default(),
			bytes.len()
		),
	)
}

async fn delete_file(Json(body): Json<Value>) -> Json<Value> {
	envelope("error", format!("{} not found in {}", body["file_name"].as_str().unwrap_or(""), body["file_type"].as_str().unwrap_or("")))
}

async fn get_text_file(headers: HeaderMap, Path((name, kind)): Path<(String, String)>) -> Response {
	if !has_session(&headers) {
		return (StatusCode::UNAUTHORIZED, envelope("error", "Login required")).into_response();
	}
	Json(json!({ "content": format!("{kind} for {name}\nsecond line") })).into_response()
}

async fn serve() -> SocketAddr {
	let app = Router::new()
		.route("/login", post(login))
		.route("/logout", get(|| async { StatusCode::OK }))
		.route("/get_profile/{name}", get(get_profile))
		.route("/save_profile", post(save_profile))
		.route("/upload_file", post(upload_file))
		.route("/delete_file", post(delete_file))
		.route("/get_text_file/{name}/{kind}", get(get_text_file));

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	addr
}

fn backend(addr: SocketAddr) -> HttpBackend {
	HttpBackend::new(Url::parse(&format!("http://{addr}")).unwrap()).unwrap()
}

#[tokio::test]
async fn login_captures_session_cookie() {
	let addr = serve().await;
	let auth = HttpAuth::new(backend(addr));

	let credentials = auth.login("admin", "admin").await.unwrap();
	assert_eq!(credentials.cookie.as_deref(), Some(SESSION));
	auth.logout(&credentials).await.unwrap();
}

#[tokio::test]
async fn rejected_login_is_reported() {
	let addr = serve().await;
	let err = HttpAuth::new(backend(addr)).login("admin", "nope").await.unwrap_err();
	assert!(matches!(err, Error::AuthRejected(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_login_is_a_transport_failure() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let err = HttpAuth::new(backend(addr)).login("admin", "admin").await.unwrap_err();
	assert!(matches!(err, Error::AuthTransport(_)), "{err:?}");
}

#[tokio::test]
async fn api_shares_login_cookie() {
	let addr = serve().await;
	let backend = backend(addr);
	let api = PanelApi::new(backend.clone());

	let err = api.get_text_file("main", TextPool::Titles).await.unwrap_err();
	assert!(matches!(err, Error::Api(ref message) if message == "Login required"));

	HttpAuth::new(backend).login("admin", "admin").await.unwrap();
	let content = api.get_text_file("main", TextPool::Titles).await.unwrap();
	assert_eq!(content, "titles for main\nsecond line");
}

#[tokio::test]
async fn persisted_credentials_are_presented() {
	let addr = serve().await;
	let api = PanelApi::new(backend(addr));
	api.use_credentials(&Credentials {
		cookie: Some(SESSION.to_string()),
	});

	let content = api.get_text_file("main", TextPool::Descriptions).await.unwrap();
	assert!(content.starts_with("descriptions for main"));
}

#[tokio::test]
async fn profile_round_trip() {
	let addr = serve().await;
	let api = PanelApi::new(backend(addr));

	let mut profile = api.get_profile("Contoh Profil").await.unwrap();
	assert_eq!(profile.video_folder, "profiles/contoh/videos");
	assert!(!profile.is_authenticated());

	profile.category = "Music".to_string();
	let saved = api.save_profile("Contoh Profil", &profile).await.unwrap();
	assert_eq!(saved.message, "Contoh Profil saved with category Music");

	let err = api.get_profile("missing").await.unwrap_err();
	assert!(matches!(err, Error::Api(ref message) if message == "Profile not found"));

	let empty = Profile::default();
	assert!(api.save_profile("x", &empty).await.is_ok());
}

#[tokio::test]
async fn upload_sends_file_and_kind() {
	let addr = serve().await;
	let api = PanelApi::new(backend(addr));
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("clip.mp4");
	std::fs::write(&path, b"video").unwrap();

	let response = api.upload_file("main", MediaKind::Video, &path).await.unwrap();
	assert_eq!(response.message, "main:videos:clip.mp4:5");
}

#[tokio::test]
async fn error_envelope_fails_the_call() {
	let addr = serve().await;
	let api = PanelApi::new(backend(addr));

	let err = api.delete_file("main", "gone.png", MediaKind::Thumbnail).await.unwrap_err();
	assert!(matches!(err, Error::Api(ref message) if message == "gone.png not found in thumbs"));
}
