use crate::error::AnalyticsError;
use rollcall_derive::api_model;
use rollcall_kernel::{now_millis, safe_nanoid};
use std::fmt::Debug;
use tracing::info;

/// A rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Receipt of a dispatched report.
#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct ReportDispatch {
    pub dispatch_id: String,
    pub recipient: String,
    pub subject: String,
    /// Unix milliseconds
    pub sent_at: i64,
    /// `false` when the transport only recorded the message
    pub delivered: bool,
    pub transport: String,
}

/// Outbound transport for reports.
pub trait ReportMailer: Debug + Send + Sync {
    /// # Errors
    /// [`AnalyticsError::Delivery`] when the transport refuses the message.
    fn deliver(&self, message: &ReportMessage) -> Result<ReportDispatch, AnalyticsError>;
}

/// Writes reports to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl LogMailer {
    pub const TRANSPORT: &'static str = "log";
}

impl ReportMailer for LogMailer {
    fn deliver(&self, message: &ReportMessage) -> Result<ReportDispatch, AnalyticsError> {
        let dispatch_id = safe_nanoid!();
        info!(
            %dispatch_id,
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Report recorded (not delivered)"
        );
        Ok(ReportDispatch {
            dispatch_id,
            recipient: message.to.clone(),
            subject: message.subject.clone(),
            sent_at: now_millis(),
            delivered: false,
            transport: Self::TRANSPORT.to_owned(),
        })
    }
}
