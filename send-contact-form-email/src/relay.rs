use crate::{
    config::RelayConfig,
    email_templates::{render_confirmation, render_notification},
    resend::{OutboundEmail, ResendClient, SentEmail, RESEND_API_KEY_NAME},
    secrets::SecretRepository,
    submission::{ContactSubmission, ValidatedSubmission, ValidationError},
};
use async_once_cell::OnceCell;
use lambda_http::{
    http::{header, Method, StatusCode},
    Body, Error, Request, RequestPayloadExt, Response,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

const GENERIC_FAILURE_MESSAGE: &str = "Erreur lors de l'envoi du message";

/// Relays contact form submissions to the business owner by email.
pub struct ContactFormRelay<SecretRepositoryT: SecretRepository> {
    config: RelayConfig,
    secrets_repository: SecretRepositoryT,
    resend: OnceCell<ResendClient>,
}

enum Delivery {
    Discarded,
    Forwarded(SentEmail),
}

impl<SecretRepositoryT: SecretRepository> ContactFormRelay<SecretRepositoryT> {
    pub fn new(config: RelayConfig, secrets_repository: SecretRepositoryT) -> Self {
        Self {
            config,
            secrets_repository,
            resend: Default::default(),
        }
    }

    pub async fn handle(&self, event: Request) -> Result<Response<Body>, Error> {
        match self.process_request(&event).await {
            Ok(delivery) => self.success_response(delivery),
            Err(error) => {
                error.log();
                error.into_response()
            }
        }
    }

    async fn process_request(&self, event: &Request) -> Result<Delivery, ContactFormError> {
        if event.method() != Method::POST {
            return Err(ContactFormError::MethodNotAllowed(event.method().clone()));
        }
        let submission = Self::parse_submission(event);
        if submission.is_spam() {
            info!("Honeypot field is filled in, discarding submission");
            return Ok(Delivery::Discarded);
        }
        let validated_submission = submission.validate()?;
        self.dispatch(&validated_submission).await
    }

    fn parse_submission(event: &Request) -> ContactSubmission {
        match event.payload() {
            Ok(Some(submission)) => submission,
            Ok(None) => ContactSubmission::default(),
            Err(error) => {
                warn!("Could not parse request payload: {error}");
                ContactSubmission::default()
            }
        }
    }

    async fn dispatch(
        &self,
        submission: &ValidatedSubmission<'_>,
    ) -> Result<Delivery, ContactFormError> {
        let resend = self.resend_client().await?;
        let notification = self.construct_notification(submission)?;
        let sent = resend.send(&notification).await.map_err(|e| {
            ContactFormError::ProviderError(format!("Error sending notification: {e}"))
        })?;
        info!("Forwarded contact form submission as email {}", sent.id);

        if self.config.send_confirmation {
            let confirmation = self.construct_confirmation(submission)?;
            let confirmation_sent = resend.send(&confirmation).await.map_err(|e| {
                ContactFormError::ProviderError(format!("Error sending confirmation: {e}"))
            })?;
            info!("Sent confirmation as email {}", confirmation_sent.id);
        }

        Ok(Delivery::Forwarded(sent))
    }

    fn construct_notification<'a>(
        &self,
        submission: &ValidatedSubmission<'a>,
    ) -> Result<OutboundEmail<'a>, ContactFormError> {
        let html = render_notification(submission).map_err(|e| {
            ContactFormError::ProviderError(format!("Error rendering notification: {e}"))
        })?;
        Ok(OutboundEmail {
            from: self.config.from_address.to_string(),
            to: vec![self.config.recipient_address.to_string()],
            subject: format!("Nouveau message de {}", submission.name),
            html,
            reply_to: Some(submission.email),
        })
    }

    fn construct_confirmation<'a>(
        &self,
        submission: &ValidatedSubmission<'a>,
    ) -> Result<OutboundEmail<'a>, ContactFormError> {
        let html = render_confirmation(
            submission,
            &self.config.business_name,
            &self.config.recipient_address.email.to_string(),
        )
        .map_err(|e| {
            ContactFormError::ProviderError(format!("Error rendering confirmation: {e}"))
        })?;
        Ok(OutboundEmail {
            from: self.config.from_address.to_string(),
            to: vec![submission.email.into()],
            subject: format!(
                "Confirmation de votre message - {}",
                self.config.business_name
            ),
            html,
            reply_to: None,
        })
    }

    async fn resend_client(&self) -> Result<&ResendClient, ContactFormError> {
        self.resend
            .get_or_try_init(self.initialise_resend_client())
            .await
            .map_err(|e| ContactFormError::ProviderError(format!("Unable to set up Resend: {e}")))
    }

    async fn initialise_resend_client(&self) -> Result<ResendClient, Error> {
        let api_key = self.secrets_repository.get_secret(RESEND_API_KEY_NAME)?;
        Ok(ResendClient::new(&self.config.resend_api_url, api_key)?)
    }

    fn success_response(&self, delivery: Delivery) -> Result<Response<Body>, Error> {
        let body = match delivery {
            Delivery::Forwarded(sent) if self.config.include_provider_response => {
                json!({ "success": true, "data": sent })
            }
            _ => json!({ "success": true }),
        };
        json_response(StatusCode::OK, body)
    }
}

#[derive(Debug)]
pub enum ContactFormError {
    MethodNotAllowed(Method),
    ValidationError(ValidationError),
    ProviderError(String),
}

impl ContactFormError {
    fn log(&self) {
        match self {
            ContactFormError::MethodNotAllowed(method) => {
                warn!("Rejected contact form request with method {method}");
            }
            ContactFormError::ValidationError(error) => {
                warn!("Rejected invalid contact form submission: {error}");
            }
            ContactFormError::ProviderError(description) => {
                error!("Provider error sending contact form email: {description}");
            }
        }
    }

    fn into_response(self) -> Result<Response<Body>, Error> {
        match self {
            ContactFormError::MethodNotAllowed(_) => {
                let mut response = json_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    json!({ "error": "Method not allowed" }),
                )?;
                response
                    .headers_mut()
                    .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
                Ok(response)
            }
            ContactFormError::ValidationError(error) => json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": error.client_message() }),
            ),
            ContactFormError::ProviderError(_) => json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": GENERIC_FAILURE_MESSAGE }),
            ),
        }
    }
}

impl From<ValidationError> for ContactFormError {
    fn from(error: ValidationError) -> Self {
        ContactFormError::ValidationError(error)
    }
}

impl std::fmt::Display for ContactFormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactFormError::MethodNotAllowed(method) => {
                write!(f, "Method not allowed: {method}")
            }
            ContactFormError::ValidationError(error) => write!(f, "Validation error: {error}"),
            ContactFormError::ProviderError(description) => {
                write!(f, "Provider error: {description}")
            }
        }
    }
}

impl std::error::Error for ContactFormError {}

fn json_response(status: StatusCode, body: Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::Text(body.to_string()))?)
}
