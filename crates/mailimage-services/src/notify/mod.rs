//! Replies to submitters
//!
//! The pipeline reports outcomes through the `Notifier` trait. `ReplyComposer` renders
//! the plain-text replies shared by every notifier.

mod smtp;
mod stdout;

pub use smtp::SmtpNotifier;
pub use stdout::StdoutNotifier;

use async_trait::async_trait;
use mailimage_core::{AppError, Config, Sender};
use std::sync::Arc;

/// Subject used when a submission failed for internal reasons.
pub const INTERNAL_ERROR_SUBJECT: &str = "Error";

/// The only message a submitter sees for an internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Your image could not be saved because of an internal error. Please try again later.";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the submitter the image was saved and how to delete it.
    async fn notify_success(
        &self,
        recipient: &Sender,
        subject: &str,
        delete_link: &str,
    ) -> Result<(), AppError>;

    /// Tell the submitter why the image was not saved.
    async fn notify_errors(
        &self,
        recipient: &Sender,
        subject: &str,
        messages: &[String],
    ) -> Result<(), AppError>;
}

/// A rendered reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub to: Sender,
    pub subject: String,
    pub body: String,
}

/// Renders reply texts.
#[derive(Debug, Clone)]
pub struct ReplyComposer {
    regards: String,
    validity: String,
}

impl ReplyComposer {
    pub fn new(regards: impl Into<String>, validity: impl Into<String>) -> Self {
        Self {
            regards: regards.into(),
            validity: validity.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.response_regards.clone(), config.token_validity_text())
    }

    fn greeting(to: &Sender) -> String {
        if to.name.is_empty() {
            "Hello,".to_string()
        } else {
            format!("Hello {},", to.name)
        }
    }

    fn reply_subject(subject: &str) -> String {
        format!("Re: {}", subject)
    }

    pub fn success(&self, to: &Sender, subject: &str, delete_link: &str) -> Reply {
        let body = format!(
            "{}\n\nyour image was saved successfully. Within the next {} you can delete it\nby following this link:\n\n{}\n\n{}\n",
            Self::greeting(to),
            self.validity,
            delete_link,
            self.regards
        );
        Reply {
            to: to.clone(),
            subject: Self::reply_subject(subject),
            body,
        }
    }

    pub fn errors(&self, to: &Sender, subject: &str, messages: &[String]) -> Reply {
        let intro = if messages.len() > 1 {
            "Please fix the following problems:"
        } else {
            "Please fix the following problem:"
        };
        let list: String = messages.iter().map(|m| format!("* {}\n", m)).collect();
        let body = format!(
            "{}\n\nyour image could not be saved. {}\n{}\n{}\n",
            Self::greeting(to),
            intro,
            list,
            self.regards
        );
        Reply {
            to: to.clone(),
            subject: Self::reply_subject(subject),
            body,
        }
    }
}

/// Stdout in debug mode, SMTP otherwise
pub fn create_notifier(config: &Config) -> Result<Arc<dyn Notifier>, AppError> {
    if config.debug {
        tracing::info!("Debug mode: replies are printed to stdout");
        Ok(Arc::new(StdoutNotifier::new(ReplyComposer::from_config(config))))
    } else {
        Ok(Arc::new(SmtpNotifier::from_config(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> ReplyComposer {
        ReplyComposer::new("Regards\nThe gallery", "24 hours")
    }

    #[test]
    fn success_reply_carries_link_and_validity() {
        let reply = composer().success(
            &Sender::new("Alice", "a@example.com"),
            "Sunset",
            "http://localhost:5000/delete/AbCdEfGh",
        );
        assert_eq!(reply.subject, "Re: Sunset");
        assert!(reply.body.starts_with("Hello Alice,"));
        assert!(reply.body.contains("24 hours"));
        assert!(reply.body.contains("http://localhost:5000/delete/AbCdEfGh"));
        assert!(reply.body.trim_end().ends_with("The gallery"));
    }

    #[test]
    fn error_reply_lists_every_message() {
        let messages = vec!["first".to_string(), "second".to_string()];
        let reply = composer().errors(&Sender::new("", "a@example.com"), "Hi", &messages);
        assert!(reply.body.starts_with("Hello,"));
        assert!(reply.body.contains("* first\n* second\n"));
        assert!(reply.body.contains("problems:"));
    }
}
