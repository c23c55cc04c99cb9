//! MIME message parsing.

use mail_parser::{MessageParser, MimeHeaders};
use mailimage_core::{AppError, Sender};
use regex::Regex;
use std::sync::LazyLock;

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s<>]+@[^@\s<>]+\.[^@\s<>]+$").expect("address pattern is valid")
});

/// One leaf part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Lowercased `type/subtype`
    pub content_type: String,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// A submission after MIME decoding.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub sender: Sender,
    pub subject: String,
    pub text: String,
    pub parts: Vec<Attachment>,
}

/// Parse raw message bytes and extract the sender.
///
/// An unparseable message or a missing/invalid `From` address is `InvalidInput`.
pub fn parse_message(raw: &[u8]) -> Result<ParsedMessage, AppError> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| AppError::InvalidInput("Message could not be parsed".to_string()))?;

    let from = message
        .from()
        .and_then(|address| address.first())
        .ok_or_else(|| AppError::InvalidInput("Message has no From address".to_string()))?;

    let address = from
        .address()
        .map(str::trim)
        .filter(|a| ADDRESS_RE.is_match(a))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Sender address {:?} is not a valid mail address",
                from.address().unwrap_or_default()
            ))
        })?;

    let sender = Sender::new(from.name().unwrap_or_default().trim(), address);

    let parts = message
        .parts
        .iter()
        .filter_map(|part| {
            let content_type = part.content_type()?;
            let subtype = content_type.subtype()?;
            Some(Attachment {
                content_type: format!("{}/{}", content_type.ctype(), subtype).to_lowercase(),
                filename: part.attachment_name().map(str::to_string),
                data: part.contents().to_vec(),
            })
        })
        .collect();

    Ok(ParsedMessage {
        sender,
        subject: message.subject().unwrap_or_default().to_string(),
        text: message
            .body_text(0)
            .map(|text| text.into_owned())
            .unwrap_or_default(),
        parts,
    })
}
