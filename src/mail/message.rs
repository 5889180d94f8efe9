//! Message composition

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;

use super::error::MailError;

/// Parse a mailbox such as `ops@example.com` or `Ops <ops@example.com>`
pub fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Build a `text/plain` message
pub fn compose_plain(subject: &str, body: &str, from: &str, to: &str) -> Result<Message, MailError> {
    compose(subject, body, ContentType::TEXT_PLAIN, from, to)
}

/// Build a `text/html` message
pub fn compose_html(subject: &str, html_body: &str, from: &str, to: &str) -> Result<Message, MailError> {
    compose(subject, html_body, ContentType::TEXT_HTML, from, to)
}

fn compose(
    subject: &str,
    body: &str,
    content_type: ContentType,
    from: &str,
    to: &str,
) -> Result<Message, MailError> {
    let message = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(to)?)
        .subject(subject)
        .header(content_type)
        .body(body.to_string())?;

    Ok(message)
}
