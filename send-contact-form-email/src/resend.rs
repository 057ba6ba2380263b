use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const RESEND_API_KEY_NAME: &str = "RESEND_API_KEY";
pub const RESEND_API_URL: &str = "https://api.resend.com";

const EMAILS_PATH: &str = "/emails";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client for the Resend transactional email API.
pub struct ResendClient {
    client: Client,
    emails_url: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Result<Self, ResendError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ResendError::Transport)?;
        Ok(Self {
            client,
            emails_url: format!("{}{EMAILS_PATH}", api_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    pub async fn send(&self, email: &OutboundEmail<'_>) -> Result<SentEmail, ResendError> {
        let response = self
            .client
            .post(&self.emails_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(ResendError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ResendErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => String::new(),
            };
            return Err(ResendError::Rejected { status, message });
        }
        response.json().await.map_err(ResendError::InvalidResponse)
    }
}

#[derive(Serialize, Debug)]
pub struct OutboundEmail<'a> {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<&'a str>,
}

/// Acknowledgement returned by Resend for an accepted email.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub id: String,
}

#[derive(Deserialize)]
struct ResendErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
pub enum ResendError {
    Transport(reqwest::Error),
    Rejected { status: StatusCode, message: String },
    InvalidResponse(reqwest::Error),
}

impl std::fmt::Display for ResendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResendError::Transport(error) => write!(f, "Transport error: {error}"),
            ResendError::Rejected { status, message } if message.is_empty() => {
                write!(f, "Rejected with status {status}")
            }
            ResendError::Rejected { status, message } => {
                write!(f, "Rejected with status {status}: {message}")
            }
            ResendError::InvalidResponse(error) => {
                write!(f, "Could not read acknowledgement: {error}")
            }
        }
    }
}

impl std::error::Error for ResendError {}

#[cfg(test)]
mod tests {
    use super::{OutboundEmail, ResendClient, ResendError, SentEmail};
    use googletest::prelude::*;
    use reqwest::StatusCode;
    use test_support::fake_resend::FakeResend;

    const API_KEY: &str = "re_test_key";

    fn arbitrary_email() -> OutboundEmail<'static> {
        OutboundEmail {
            from: "Contact form <noreply@example.com>".into(),
            to: vec!["owner@example.com".into()],
            subject: "Nouveau message de Jeanne".into(),
            html: "<p>Bonjour</p>".into(),
            reply_to: Some("jeanne@example.com"),
        }
    }

    #[googletest::test]
    #[tokio::test]
    async fn posts_email_with_bearer_token() {
        let fake_resend = FakeResend::new(API_KEY);
        let url = fake_resend.start().await;
        let client = ResendClient::new(&url, API_KEY).unwrap();

        let result = client.send(&arbitrary_email()).await;

        expect_that!(result, ok(anything()));
        let received = fake_resend.received_emails();
        expect_that!(received.len(), eq(1));
        expect_that!(received[0].authorization, some(eq("Bearer re_test_key")));
        expect_that!(received[0].to, eq(vec!["owner@example.com".to_string()]));
        expect_that!(received[0].subject, eq("Nouveau message de Jeanne"));
        expect_that!(received[0].reply_to, some(eq("jeanne@example.com")));
    }

    #[tokio::test]
    async fn returns_acknowledgement_from_provider() -> Result<()> {
        let fake_resend = FakeResend::new(API_KEY);
        let url = fake_resend.start().await;
        let client = ResendClient::new(&url, API_KEY).unwrap();

        let result = client.send(&arbitrary_email()).await;

        verify_that!(
            result,
            ok(eq(SentEmail {
                id: "fake-email-1".into()
            }))
        )
    }

    #[tokio::test]
    async fn omits_reply_to_when_absent() -> Result<()> {
        let fake_resend = FakeResend::new(API_KEY);
        let url = fake_resend.start().await;
        let client = ResendClient::new(&url, API_KEY).unwrap();

        client
            .send(&OutboundEmail {
                reply_to: None,
                ..arbitrary_email()
            })
            .await
            .unwrap();

        verify_that!(fake_resend.received_emails()[0].reply_to, none())
    }

    #[tokio::test]
    async fn tolerates_trailing_slash_in_api_url() -> Result<()> {
        let fake_resend = FakeResend::new(API_KEY);
        let url = fake_resend.start().await;
        let client = ResendClient::new(&format!("{url}/"), API_KEY).unwrap();

        verify_that!(client.send(&arbitrary_email()).await, ok(anything()))
    }

    #[tokio::test]
    async fn reports_rejection_with_provider_message() -> Result<()> {
        let fake_resend = FakeResend::new("a different key");
        let url = fake_resend.start().await;
        let client = ResendClient::new(&url, API_KEY).unwrap();

        let result = client.send(&arbitrary_email()).await;

        verify_that!(
            result.as_ref().map_err(|e| e.to_string()),
            err(contains_substring("API key is invalid"))
        )?;
        verify_that!(
            matches!(
                result,
                Err(ResendError::Rejected { status, .. }) if status == StatusCode::FORBIDDEN
            ),
            eq(true)
        )
    }

    #[tokio::test]
    async fn reports_server_error_as_rejection() -> Result<()> {
        let fake_resend = FakeResend::new(API_KEY).fail_with(500);
        let url = fake_resend.start().await;
        let client = ResendClient::new(&url, API_KEY).unwrap();

        let result = client.send(&arbitrary_email()).await;

        verify_that!(
            matches!(
                result,
                Err(ResendError::Rejected { status, .. }) if status == StatusCode::INTERNAL_SERVER_ERROR
            ),
            eq(true)
        )
    }

    #[tokio::test]
    async fn reports_unreadable_acknowledgement() -> Result<()> {
        let fake_resend = FakeResend::new(API_KEY).return_invalid_response();
        let url = fake_resend.start().await;
        let client = ResendClient::new(&url, API_KEY).unwrap();

        let result = client.send(&arbitrary_email()).await;

        verify_that!(
            matches!(result, Err(ResendError::InvalidResponse(_))),
            eq(true)
        )
    }

    #[tokio::test]
    async fn reports_unreachable_provider() -> Result<()> {
        let client = ResendClient::new("http://127.0.0.1:1", API_KEY).unwrap();

        let result = client.send(&arbitrary_email()).await;

        verify_that!(matches!(result, Err(ResendError::Transport(_))), eq(true))
    }
}
