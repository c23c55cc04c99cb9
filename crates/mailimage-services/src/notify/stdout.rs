use async_trait::async_trait;
use mailimage_core::{AppError, Sender};
use std::io::Write;

use super::{Notifier, Reply, ReplyComposer};

/// Prints replies instead of sending them.
#[derive(Debug, Clone)]
pub struct StdoutNotifier {
    composer: ReplyComposer,
}

impl StdoutNotifier {
    pub fn new(composer: ReplyComposer) -> Self {
        Self { composer }
    }

    fn print(&self, reply: &Reply) -> Result<(), AppError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "To: {}", reply.to.address)?;
        writeln!(out, "Subject: {}", reply.subject)?;
        writeln!(out)?;
        write!(out, "{}", reply.body)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify_success(
        &self,
        recipient: &Sender,
        subject: &str,
        delete_link: &str,
    ) -> Result<(), AppError> {
        self.print(&self.composer.success(recipient, subject, delete_link))
    }

    async fn notify_errors(
        &self,
        recipient: &Sender,
        subject: &str,
        messages: &[String],
    ) -> Result<(), AppError> {
        self.print(&self.composer.errors(recipient, subject, messages))
    }
}
