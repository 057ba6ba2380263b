use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::{
    borrow::Cow,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;

const EMAILS_PATH: &str = "/emails";

/// An email as it arrived at the fake provider, together with the credentials
/// it was sent with.
#[derive(Clone, Debug)]
pub struct ReceivedEmail {
    pub authorization: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

#[derive(Deserialize)]
struct SendEmailPayload {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
    #[serde(default)]
    reply_to: Option<String>,
}

/// Stand-in for the Resend HTTP API. Every request is recorded, whether or
/// not it is accepted.
#[derive(Clone)]
pub struct FakeResend {
    required_api_key: Cow<'static, str>,
    failure_status: Option<u16>,
    accepted_before_failure: usize,
    return_invalid_response: bool,
    received: Arc<Mutex<Vec<ReceivedEmail>>>,
}

impl FakeResend {
    pub fn new(required_api_key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            required_api_key: required_api_key.into(),
            failure_status: None,
            accepted_before_failure: 0,
            return_invalid_response: false,
            received: Default::default(),
        }
    }

    pub fn fail_with(self, status: u16) -> Self {
        Self {
            failure_status: Some(status),
            ..self
        }
    }

    /// Lets the first `accepted` emails through before failing.
    pub fn fail_after(self, accepted: usize) -> Self {
        Self {
            accepted_before_failure: accepted,
            ..self
        }
    }

    pub fn return_invalid_response(self) -> Self {
        Self {
            return_invalid_response: true,
            ..self
        }
    }

    /// Serves the fake on an ephemeral local port and returns its base URL.
    pub async fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let app = Router::new()
            .route(EMAILS_PATH, post(send_email))
            .with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        url
    }

    pub fn received_emails(&self) -> Vec<ReceivedEmail> {
        self.received.lock().unwrap().clone()
    }
}

async fn send_email(
    State(state): State<FakeResend>,
    headers: HeaderMap,
    Json(payload): Json<SendEmailPayload>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    debug!("Fake Resend got email {:?}", payload.subject);
    let email_number = {
        let mut received = state.received.lock().unwrap();
        received.push(ReceivedEmail {
            authorization: authorization.clone(),
            from: payload.from,
            to: payload.to,
            subject: payload.subject,
            html: payload.html,
            reply_to: payload.reply_to,
        });
        received.len()
    };

    if authorization.as_deref() != Some(format!("Bearer {}", state.required_api_key).as_str()) {
        (
            StatusCode::FORBIDDEN,
            Json(json!({
                "statusCode": 403,
                "message": "API key is invalid",
                "name": "invalid_api_key",
            })),
        )
            .into_response()
    } else if let Some(status) = state
        .failure_status
        .filter(|_| email_number > state.accepted_before_failure)
    {
        let status = StatusCode::from_u16(status).unwrap();
        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": "Simulated failure",
                "name": "application_error",
            })),
        )
            .into_response()
    } else if state.return_invalid_response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            "Invalid response",
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            Json(json!({ "id": format!("fake-email-{email_number}") })),
        )
            .into_response()
    }
}
