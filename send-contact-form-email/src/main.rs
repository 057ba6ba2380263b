use lambda_http::{run, service_fn, Error};
use send_contact_form_email::{
    secrets::{EnvironmentSecretRepository, SecretRepository},
    ContactFormRelay, RelayConfig,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = RelayConfig::from_env()?;
    let relay = ContactFormRelay::new(config, EnvironmentSecretRepository::open());
    run(service_fn(|event| relay.handle(event))).await
}
