use mailimage_core::Config;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::image::ImageProcessor;
use crate::message::ParsedMessage;

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n").expect("line break pattern is valid"));

/// A reason a submission is rejected.
///
/// `Display` carries internal detail for logs; `user_message` is what the submitter sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionProblem {
    #[error("subject exceeds {max} characters")]
    SubjectTooLong { max: usize },

    #[error("text exceeds {max} characters")]
    TextTooLong { max: usize },

    #[error("no image attachment found")]
    NoImage,

    #[error("{count} image attachments found")]
    MultipleImages { count: usize },

    #[error("image could not be decoded: {detail}")]
    UnreadableImage { detail: String },
}

impl SubmissionProblem {
    pub fn user_message(&self) -> String {
        match self {
            SubmissionProblem::SubjectTooLong { max } => format!(
                "The subject is too long. At most {} characters are allowed.",
                max
            ),
            SubmissionProblem::TextTooLong { max } => format!(
                "The text of the email may be at most {} characters long.",
                max
            ),
            SubmissionProblem::NoImage => "No image was found in the email.".to_string(),
            SubmissionProblem::MultipleImages { .. } => {
                "Multiple images were found. The email may contain at most one image.".to_string()
            }
            SubmissionProblem::UnreadableImage { .. } => {
                "The image could not be read.".to_string()
            }
        }
    }
}

/// A submission that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub subject: String,
    pub text: String,
    pub image: Vec<u8>,
    /// Without the leading dot
    pub extension: String,
}

/// A submission with at least one problem.
#[derive(Debug, Clone)]
pub struct RejectedSubmission {
    /// Cleaned subject, used for the reply
    pub subject: String,
    pub problems: Vec<SubmissionProblem>,
}

impl RejectedSubmission {
    pub fn user_messages(&self) -> Vec<String> {
        self.problems.iter().map(|p| p.user_message()).collect()
    }
}

/// Submission validator
///
/// Bounds and the content-type allow-list come from configuration.
#[derive(Debug, Clone)]
pub struct SubmissionValidator {
    subject_max_chars: usize,
    text_max_chars: usize,
    allowed_content_types: Vec<String>,
    spam_prefix: String,
}

impl SubmissionValidator {
    pub fn new(
        subject_max_chars: usize,
        text_max_chars: usize,
        allowed_content_types: Vec<String>,
        spam_prefix: String,
    ) -> Self {
        Self {
            subject_max_chars,
            text_max_chars,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|t| t.to_lowercase())
                .collect(),
            spam_prefix,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.subject_max_chars,
            config.text_max_chars,
            config.allowed_content_types.clone(),
            config.spam_prefix.clone(),
        )
    }

    /// Strip the spam marker and surrounding whitespace.
    pub fn clean_subject(&self, subject: &str) -> String {
        let subject = subject.trim();
        let subject = if self.spam_prefix.is_empty() {
            subject
        } else {
            subject.strip_prefix(&self.spam_prefix).unwrap_or(subject)
        };
        subject.trim().to_string()
    }

    /// Collapse line breaks to spaces and trim.
    pub fn clean_text(&self, text: &str) -> String {
        LINE_BREAK_RE.replace_all(text, " ").trim().to_string()
    }

    fn is_allowed(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed == content_type)
    }

    /// Extension to store the image under, derived from the content type. The filename's
    /// spelling is kept only when it names the same format.
    fn extension_for(&self, content_type: &str, filename: Option<&str>) -> String {
        let from_type =
            canonical_extension(content_type.strip_prefix("image/").unwrap_or(content_type));

        match filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
        {
            Some(ext) if canonical_extension(&ext) == from_type => ext,
            _ => from_type.to_string(),
        }
    }

    /// Run every check and collect all problems.
    ///
    /// Decoding the image is CPU-bound.
    pub fn validate(&self, message: &ParsedMessage) -> Result<ValidatedSubmission, RejectedSubmission> {
        let mut problems = Vec::new();

        let subject = self.clean_subject(&message.subject);
        if subject.chars().count() > self.subject_max_chars {
            problems.push(SubmissionProblem::SubjectTooLong {
                max: self.subject_max_chars,
            });
        }

        let text = self.clean_text(&message.text);
        if text.chars().count() > self.text_max_chars {
            problems.push(SubmissionProblem::TextTooLong {
                max: self.text_max_chars,
            });
        }

        let images: Vec<_> = message
            .parts
            .iter()
            .filter(|part| self.is_allowed(&part.content_type))
            .collect();

        let mut accepted = None;
        match images.as_slice() {
            [] => problems.push(SubmissionProblem::NoImage),
            [image] => match ImageProcessor::validate(&image.data) {
                Ok(()) => {
                    accepted = Some((
                        image.data.clone(),
                        self.extension_for(&image.content_type, image.filename.as_deref()),
                    ));
                }
                Err(e) => {
                    tracing::info!(
                        content_type = %image.content_type,
                        size_bytes = image.data.len(),
                        error = %e,
                        "Attached image could not be decoded"
                    );
                    problems.push(SubmissionProblem::UnreadableImage {
                        detail: e.to_string(),
                    });
                }
            },
            more => problems.push(SubmissionProblem::MultipleImages { count: more.len() }),
        }

        match accepted {
            Some((image, extension)) if problems.is_empty() => Ok(ValidatedSubmission {
                subject,
                text,
                image,
                extension,
            }),
            _ => Err(RejectedSubmission { subject, problems }),
        }
    }
}

fn canonical_extension(ext: &str) -> &str {
    match ext {
        "jpeg" | "jpg" | "pjpeg" => "jpg",
        other => other,
    }
}
