use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketField {
    Subject,
    Description,
}

impl TicketField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Description => "description",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TicketRequestError {
    #[error("required ticket field `{}` is missing", .0.key())]
    MissingField(TicketField),
    #[error("required ticket field `{}` is empty", .0.key())]
    EmptyField(TicketField),
}

/// A validated ticket submission. Both fields are guaranteed non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketRequest {
    subject: String,
    description: String,
}

impl TicketRequest {
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, TicketRequestError> {
        let subject = required(subject.into(), TicketField::Subject)?;
        let description = required(description.into(), TicketField::Description)?;
        Ok(Self { subject, description })
    }

    /// Builds a request from optional form values, distinguishing absent fields from blank ones.
    pub fn from_parts(
        subject: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, TicketRequestError> {
        let subject = subject.ok_or(TicketRequestError::MissingField(TicketField::Subject))?;
        let description =
            description.ok_or(TicketRequestError::MissingField(TicketField::Description))?;
        Self::new(subject, description)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn required(value: String, field: TicketField) -> Result<String, TicketRequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TicketRequestError::EmptyField(field));
    }
    Ok(trimmed.to_owned())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketResult {
    Created { ticket_id: String },
    Failed { reason: String },
}

impl TicketResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed { reason: reason.into() }
    }
}

/// Creates tickets in an external system.
///
/// Implementations must fold every failure (transport, status, body shape) into
/// [`TicketResult::Failed`]; callers only ever branch on the two variants.
#[async_trait]
pub trait TicketSubmitter: Send + Sync {
    async fn submit(&self, request: &TicketRequest) -> TicketResult;
}
