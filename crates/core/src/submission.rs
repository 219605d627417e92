//! Sinks that receive the final quote payload.
//!
//! Delivery is fire-and-forget: the wizard hands over exactly one payload per
//! successful submission and never waits for, retries, or inspects the
//! outcome. Sinks own their failure handling.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::domain::submission::QuoteSubmission;

pub trait SubmissionSink: Send + Sync {
    fn deliver(&self, submission: QuoteSubmission);
}

#[derive(Clone, Default)]
pub struct InMemorySubmissionSink {
    submissions: Arc<Mutex<Vec<QuoteSubmission>>>,
}

impl InMemorySubmissionSink {
    pub fn submissions(&self) -> Vec<QuoteSubmission> {
        match self.submissions.lock() {
            Ok(submissions) => submissions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SubmissionSink for InMemorySubmissionSink {
    fn deliver(&self, submission: QuoteSubmission) {
        match self.submissions.lock() {
            Ok(mut submissions) => submissions.push(submission),
            Err(poisoned) => poisoned.into_inner().push(submission),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TracingSubmissionSink;

impl SubmissionSink for TracingSubmissionSink {
    fn deliver(&self, submission: QuoteSubmission) {
        let draft = &submission.draft;
        tracing::info!(
            event_name = "quote.submission.received",
            submission_id = %submission.submission_id.0,
            session_id = %submission.session_id.0,
            service = draft.service.as_ref().map(|id| id.as_str()).unwrap_or("unknown"),
            technologies = draft.technologies.len(),
            scope = draft.scope.get(),
            infra = draft.infra.as_ref().map(|id| id.as_str()).unwrap_or("none"),
            company = %draft.company,
            estimated_price = %submission.estimated_price,
            "quote request submitted"
        );
    }
}

/// Writes each payload as one JSON object per line.
pub struct JsonLineSubmissionSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLineSubmissionSink<W>
where
    W: Write + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W> SubmissionSink for JsonLineSubmissionSink<W>
where
    W: Write + Send,
{
    fn deliver(&self, submission: QuoteSubmission) {
        let line = match serde_json::to_string(&submission) {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(
                    event_name = "quote.submission.serialize_failed",
                    submission_id = %submission.submission_id.0,
                    error = %error,
                    "could not serialize quote submission"
                );
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(error) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::warn!(
                event_name = "quote.submission.write_failed",
                submission_id = %submission.submission_id.0,
                error = %error,
                "could not write quote submission"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rust_decimal::Decimal;

    use super::{InMemorySubmissionSink, JsonLineSubmissionSink, SubmissionSink};
    use crate::domain::draft::QuoteDraft;
    use crate::domain::submission::{QuoteSubmission, SessionId};

    fn submission() -> QuoteSubmission {
        QuoteSubmission::new(
            SessionId("s-1".to_owned()),
            QuoteDraft::default().with_service("db").with_contact("Ada", "ada@example.com", "AE"),
            Decimal::from(4_000),
        )
    }

    #[test]
    fn in_memory_sink_keeps_every_payload() {
        let sink = InMemorySubmissionSink::default();
        sink.deliver(submission());
        assert_eq!(sink.submissions().len(), 1);
        assert_eq!(sink.submissions()[0].estimated_price, Decimal::from(4_000));
    }

    #[test]
    fn json_line_sink_writes_one_line_per_payload() {
        let sink = JsonLineSubmissionSink::new(Vec::new());
        sink.deliver(submission());
        sink.deliver(submission());

        let written = String::from_utf8(sink.into_inner()).expect("utf8 output");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let payload: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(payload["draft"]["service"], "db");
        assert_eq!(payload["estimated_price"], "4000");
        assert_eq!(payload["session_id"], "s-1");
    }

    #[test]
    fn json_line_sink_swallows_writer_failures() {
        struct BrokenPipe;

        impl io::Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        JsonLineSubmissionSink::new(BrokenPipe).deliver(submission());
    }
}
