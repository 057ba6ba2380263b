use crate::submission::ValidatedSubmission;
use serde::Serialize;
use serde_json::Value;
use tinytemplate::{error::Error, format, TinyTemplate};

const NOTIFICATION_TEMPLATE_NAME: &str = "notification";
const CONFIRMATION_TEMPLATE_NAME: &str = "confirmation";
const NOTIFICATION_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/notification.html"
));
const CONFIRMATION_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/confirmation.html"
));

const PHONE_NOT_PROVIDED: &str = "Non fourni";
const ANIMAL_NOT_SPECIFIED: &str = "Non spécifié";

#[derive(Serialize)]
struct NotificationContext<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    animal: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ConfirmationContext<'a> {
    name: &'a str,
    animal: &'a str,
    message: &'a str,
    business_name: &'a str,
    contact_email: &'a str,
}

/// Renders the HTML body of the email sent to the business owner.
pub fn render_notification(submission: &ValidatedSubmission) -> Result<String, Error> {
    let context = NotificationContext {
        name: submission.name,
        email: submission.email,
        phone: submission.phone.unwrap_or(PHONE_NOT_PROVIDED),
        animal: submission.animal.unwrap_or(ANIMAL_NOT_SPECIFIED),
        message: submission.message,
    };
    templates()?.render(NOTIFICATION_TEMPLATE_NAME, &context)
}

/// Renders the HTML body of the acknowledgement sent back to the visitor.
pub fn render_confirmation(
    submission: &ValidatedSubmission,
    business_name: &str,
    contact_email: &str,
) -> Result<String, Error> {
    let context = ConfirmationContext {
        name: submission.name,
        animal: submission.animal.unwrap_or(ANIMAL_NOT_SPECIFIED),
        message: submission.message,
        business_name,
        contact_email,
    };
    templates()?.render(CONFIRMATION_TEMPLATE_NAME, &context)
}

fn templates() -> Result<TinyTemplate<'static>, Error> {
    let mut tt = TinyTemplate::new();
    tt.add_formatter("render_paragraphs", render_paragraphs);
    tt.add_template(NOTIFICATION_TEMPLATE_NAME, NOTIFICATION_TEMPLATE)?;
    tt.add_template(CONFIRMATION_TEMPLATE_NAME, CONFIRMATION_TEMPLATE)?;
    Ok(tt)
}

fn render_paragraphs(value: &Value, output: &mut String) -> Result<(), Error> {
    output.push_str("<p>");
    let mut formatted = String::new();
    format(value, &mut formatted)?;
    output.push_str(
        &formatted
            .replace("\r\n", "\n")
            .replace("\n\n", "</p><p>")
            .replace('\n', "<br>"),
    );
    output.push_str("</p>");
    Ok(())
}
