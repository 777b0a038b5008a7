//! Job event stream and the observer boundary.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

/// One event emitted by a running job.
///
/// Within a job, `Progress` values never decrease and exactly one
/// `Terminal` event is emitted last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// Human-readable log line.
    LogLine { text: String },
    /// Overall progress, 0..=100.
    Progress { percent: u8 },
    /// End of the job.
    Terminal { success: bool, message: String },
}

impl JobEvent {
    /// Whether this is the final event of a job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Terminal { .. })
    }

    /// Single-line JSON encoding, tagged by `event`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Consumer of a job's event stream (the presentation layer).
///
/// Events are delivered on the worker thread in emission order.
pub trait JobObserver: Send + Sync {
    fn on_event(&self, event: JobEvent);
}

impl<F> JobObserver for F
where
    F: Fn(JobEvent) + Send + Sync,
{
    fn on_event(&self, event: JobEvent) {
        self(event)
    }
}

/// Observer that forwards every event into a channel.
///
/// Send errors are ignored: a dropped receiver means nobody is listening.
pub fn channel_observer(tx: Sender<JobEvent>) -> impl JobObserver {
    move |event: JobEvent| {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn channel_observer_forwards_in_order() {
        let (tx, rx) = mpsc::channel();
        let observer = channel_observer(tx);
        observer.on_event(JobEvent::Progress { percent: 10 });
        observer.on_event(JobEvent::Terminal {
            success: true,
            message: "done".into(),
        });

        let events: Vec<JobEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_terminal());
        assert!(events[1].is_terminal());
    }

    #[test]
    fn events_serialize_tagged() {
        let json = JobEvent::Progress { percent: 72 }.to_json().unwrap();
        assert_eq!(json, r#"{"event":"progress","percent":72}"#);

        let json = JobEvent::Terminal {
            success: false,
            message: "Error: boom".into(),
        }
        .to_json()
        .unwrap();
        assert_eq!(
            json,
            r#"{"event":"terminal","success":false,"message":"Error: boom"}"#
        );
    }
}
