//! Completion notices.
//!
//! Delivering a notice is best effort: [`notify_best_effort`] logs a failed delivery instead
//! of returning it, so a notice can never fail a run.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GeoVectorizeError, Result};

/// Somewhere to send a short message once a run finishes.
pub trait Notifier {
    /// Deliver `message` on behalf of `source`, the name of the run or tool sending it.
    fn notify(&self, source: &str, message: &str) -> Result<()>;
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, source: &str, message: &str) -> Result<()> {
        info!(source, "{message}");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts notices as `{"text": "<source>: <message>"}` to a chat webhook, the payload Slack
/// incoming webhooks accept.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, source: &str, message: &str) -> Result<()> {
        let text = format!("{source}: {message}");
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookMessage { text: &text })
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoVectorizeError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        debug!(source, "Delivered notification");
        Ok(())
    }
}

/// Send a notice, logging instead of failing when delivery does not work.
pub fn notify_best_effort(notifier: &dyn Notifier, source: &str, message: &str) {
    if let Err(err) = notifier.notify(source, message) {
        warn!(source, %err, "Could not deliver notification");
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::*;
    use crate::test::http::serve_once;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(String, String)>>);

    impl Notifier for Recorder {
        fn notify(&self, source: &str, message: &str) -> Result<()> {
            self.0
                .borrow_mut()
                .push((source.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct Unreachable;

    impl Notifier for Unreachable {
        fn notify(&self, _source: &str, _message: &str) -> Result<()> {
            Err(GeoVectorizeError::IOError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    #[test]
    fn delivers() {
        let recorder = Recorder::default();
        notify_best_effort(&recorder, "vectorize", "no errors");
        assert_eq!(
            recorder.0.into_inner(),
            vec![("vectorize".to_string(), "no errors".to_string())]
        );
        LogNotifier.notify("vectorize", "no errors").unwrap();
    }

    #[test]
    fn failure_is_swallowed() {
        notify_best_effort(&Unreachable, "vectorize", "no errors");
    }

    #[test]
    fn posts_to_webhook() {
        let (url, server) = serve_once("200 OK", "ok");
        let notifier = WebhookNotifier::new(format!("{url}/hooks/run"), Duration::from_secs(10))
            .unwrap();
        notifier.notify("vectorize", "no errors").unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /hooks/run HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"text":"vectorize: no errors"}"#));
    }

    #[test]
    fn webhook_error_status() {
        let (url, server) = serve_once("500 Internal Server Error", "");
        let notifier = WebhookNotifier::new(url, Duration::from_secs(10)).unwrap();
        let result = notifier.notify("vectorize", "no errors");
        let _ = server.join();
        assert!(matches!(
            result,
            Err(GeoVectorizeError::HttpStatus { status: 500, .. })
        ));
    }
}
