use crate::error::{mailbox_error, SyncResult};
use mail_parser::MessageParser;

/// A decoded email: subject plus plain text body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    /// IMAP UID, used to mark the message read once it has been handled
    pub uid: u32,
    pub subject: String,
    pub body: String,
}

/// Decode a raw RFC822 message.
///
/// Multipart messages yield their first text part; single part messages
/// yield their whole (transfer-decoded) body.
pub fn decode_message(uid: u32, raw: &[u8]) -> SyncResult<MailMessage> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| mailbox_error("Could not parse email"))?;

    let subject = message.subject().unwrap_or_default().to_string();
    let body = message
        .body_text(0)
        .map(|text| text.into_owned())
        .unwrap_or_default();

    Ok(MailMessage { uid, subject, body })
}
