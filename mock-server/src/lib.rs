//! HTTP service that the restcheck integration tests talk to.
//!
//! Serves greeting and lotto JSON, a fixed 409 error, XML documents with and
//! without namespaces, a form login that hands out a session cookie, and an
//! `/echo` route that returns the request body for any method.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "JSESSIONID";
pub const VALID_USERNAME: &str = "John";
pub const VALID_PASSWORD: &str = "Doe";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullName {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub j_username: String,
    pub j_password: String,
}

pub type Sessions = Arc<RwLock<HashSet<Uuid>>>;

pub const NAMESPACED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<x:response xmlns:x="http://something.com/test" note="something">
    <x:container cont_id="some_id">
        <x:item id="i_1"><x:name>first</x:name></x:item>
        <x:item id="i_2"><x:name>second</x:name></x:item>
        <item id="i_3"><name>third</name></item>
    </x:container>
</x:response>"#;

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashSet::new()));
    Router::new()
        .route("/greetJSON", get(greet_json))
        .route("/greet", post(greet_form))
        .route("/greetXML", get(greet_xml))
        .route("/namespaceXML", get(namespace_xml))
        .route("/lotto", get(lotto))
        .route("/409", get(conflict))
        .route("/echo", any(echo))
        .route("/j_spring_security_check", post(login))
        .route("/formAuth", get(form_auth))
        .route("/{firstName}/{lastName}", get(full_name))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn greet_json(Query(name): Query<Name>) -> Json<Value> {
    Json(json!({ "greeting": name }))
}

async fn greet_form(Form(name): Form<Name>) -> Json<Value> {
    Json(json!({
        "greeting": format!("Greetings {} {}", name.first_name, name.last_name)
    }))
}

async fn greet_xml(Query(name): Query<Name>) -> Response {
    let body = format!(
        "<greeting><firstName>{}</firstName><lastName>{}</lastName></greeting>",
        escape_xml(&name.first_name),
        escape_xml(&name.last_name)
    );
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

async fn namespace_xml() -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], NAMESPACED_XML).into_response()
}

async fn lotto() -> Json<Value> {
    Json(json!({
        "lotto": {
            "lottoId": 5,
            "winning-numbers": [2, 45, 34, 23, 7, 5, 3],
            "winners": [
                { "winnerId": 23, "numbers": [2, 45, 34, 23, 3, 5] },
                { "winnerId": 54, "numbers": [52, 3, 12, 11, 18, 22] }
            ]
        }
    }))
}

async fn echo(body: String) -> String {
    body
}

async fn conflict() -> Response {
    (
        StatusCode::CONFLICT,
        [(header::CONTENT_TYPE, "text/plain;charset=utf-8")],
        "ERROR",
    )
        .into_response()
}

async fn full_name(Path((first_name, last_name)): Path<(String, String)>) -> Json<FullName> {
    Json(FullName {
        full_name: format!("{first_name} {last_name}"),
        first_name,
        last_name,
    })
}

async fn login(State(sessions): State<Sessions>, Form(login): Form<Login>) -> Response {
    if login.j_username != VALID_USERNAME || login.j_password != VALID_PASSWORD {
        debug!(user = %login.j_username, "rejected login");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let session = Uuid::new_v4();
    sessions.write().await.insert(session);
    debug!(%session, "opened session");
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly"))],
        "OK",
    )
        .into_response()
}

async fn form_auth(State(sessions): State<Sessions>, headers: HeaderMap) -> Response {
    let sessions = sessions.read().await;
    let authenticated = session_ids(&headers).any(|id| sessions.contains(&id));
    if authenticated {
        "OK".into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// Session ids carried in the request's `Cookie` headers.
fn session_ids(headers: &HeaderMap) -> impl Iterator<Item = Uuid> + '_ {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .filter_map(|(_, value)| Uuid::parse_str(value).ok())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
