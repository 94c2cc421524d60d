//! Weather news reports: generation, storage and email delivery

use serde::{Deserialize, Serialize};
use shared::{
    find_us_state, validate_email, weather_report_prompt, DispatchReport, StepOutcome,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{MailTransport, ObjectStore, OutgoingEmail, TextGenerationClient};
use crate::middleware::AuthUser;

/// Unique object name for a report; collision-free across concurrent calls
pub fn report_object_name() -> String {
    format!("weather_report_{}.txt", Uuid::new_v4().simple())
}

/// Stores a report and emails it. The two steps are independent: both are
/// always attempted and each outcome is reported on its own.
#[derive(Clone)]
pub struct ReportDispatcher<S, M> {
    store: S,
    mailer: M,
    subject: String,
}

impl<S: ObjectStore, M: MailTransport> ReportDispatcher<S, M> {
    pub fn new(store: S, mailer: M, subject: String) -> Self {
        Self {
            store,
            mailer,
            subject,
        }
    }

    pub async fn dispatch(&self, text: &str, recipient: &str) -> DispatchReport {
        let object_name = report_object_name();

        let storage = match self.store.put_text(&object_name, text).await {
            Ok(stored) => {
                tracing::info!("Weather report saved to {}", stored);
                StepOutcome::Succeeded {
                    detail: stored.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to store report {}: {}", object_name, e);
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let email = match self.send_email(text, recipient).await {
            Ok(()) => StepOutcome::Succeeded {
                detail: format!("emailed to {}", recipient),
            },
            Err(e) => {
                tracing::warn!("Failed to email report to {}: {}", recipient, e);
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        DispatchReport {
            object_name,
            storage,
            email,
        }
    }

    async fn send_email(&self, text: &str, recipient: &str) -> AppResult<()> {
        validate_email(recipient).map_err(|e| AppError::Email(e.to_string()))?;
        self.mailer
            .send(&OutgoingEmail {
                to: recipient.to_string(),
                subject: self.subject.clone(),
                body: text.to_string(),
            })
            .await
    }
}

/// Request for a weather report
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReportInput {
    pub location: String,
}

/// Generated report plus delivery outcome
#[derive(Debug, Clone, Serialize)]
pub struct WeatherReportResponse {
    pub location: String,
    pub report: String,
    pub dispatch: DispatchReport,
}

/// Generates weather reports and hands them to the dispatcher
#[derive(Clone)]
pub struct WeatherReportService<S, M> {
    generator: TextGenerationClient,
    temperature: f32,
    dispatcher: ReportDispatcher<S, M>,
}

impl<S: ObjectStore, M: MailTransport> WeatherReportService<S, M> {
    pub fn new(
        generator: TextGenerationClient,
        temperature: f32,
        dispatcher: ReportDispatcher<S, M>,
    ) -> Self {
        Self {
            generator,
            temperature,
            dispatcher,
        }
    }

    /// Generate a report for a US state and deliver it to the caller's email.
    /// Nothing is stored or sent when generation fails.
    pub async fn generate_and_dispatch(
        &self,
        user: &AuthUser,
        input: &WeatherReportInput,
    ) -> AppResult<WeatherReportResponse> {
        let location = find_us_state(&input.location).ok_or_else(|| {
            AppError::validation("location", format!("{} is not a US state", input.location))
        })?;

        let report = self
            .generator
            .generate(&weather_report_prompt(location), self.temperature)
            .await?;

        let dispatch = self.dispatcher.dispatch(&report, &user.email).await;

        Ok(WeatherReportResponse {
            location: location.to_string(),
            report,
            dispatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::StoredObject;
    use std::sync::Mutex;

    struct MemoryStore {
        fail: bool,
        written: Mutex<Vec<(String, String)>>,
    }

    #[axum::async_trait]
    impl ObjectStore for MemoryStore {
        async fn put_text(&self, name: &str, body: &str) -> AppResult<StoredObject> {
            if self.fail {
                return Err(AppError::Storage("API returned 403 Forbidden".to_string()));
            }
            self.written
                .lock()
                .unwrap()
                .push((name.to_string(), body.to_string()));
            Ok(StoredObject {
                bucket: "reports".to_string(),
                name: name.to_string(),
            })
        }
    }

    struct RecordingMailer {
        fail: bool,
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[axum::async_trait]
    impl MailTransport for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Email("SMTP send failed: connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn dispatcher(
        store_fails: bool,
        mail_fails: bool,
    ) -> ReportDispatcher<MemoryStore, RecordingMailer> {
        ReportDispatcher::new(
            MemoryStore {
                fail: store_fails,
                written: Mutex::new(Vec::new()),
            },
            RecordingMailer {
                fail: mail_fails,
                sent: Mutex::new(Vec::new()),
            },
            "Your AI Weather Report".to_string(),
        )
    }

    #[test]
    fn test_object_names_are_unique() {
        let a = report_object_name();
        let b = report_object_name();
        assert_ne!(a, b);
        assert!(a.starts_with("weather_report_"));
        assert!(a.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_both_steps_succeed() {
        let dispatcher = dispatcher(false, false);
        let report = dispatcher.dispatch("Sunny.", "ranger@example.com").await;

        assert!(report.fully_delivered());
        let written = dispatcher.store.written.lock().unwrap();
        assert_eq!(written[0], (report.object_name.clone(), "Sunny.".to_string()));
        let sent = dispatcher.mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "ranger@example.com");
        assert_eq!(sent[0].body, "Sunny.");
    }

    #[tokio::test]
    async fn test_storage_success_email_failure_reported_separately() {
        let dispatcher = dispatcher(false, true);
        let report = dispatcher.dispatch("Sunny.", "ranger@example.com").await;

        assert!(report.storage.is_success());
        assert!(matches!(report.email, StepOutcome::Failed { .. }));
        assert_eq!(dispatcher.store.written.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_still_emails() {
        let dispatcher = dispatcher(true, false);
        let report = dispatcher.dispatch("Sunny.", "ranger@example.com").await;

        assert!(!report.storage.is_success());
        assert!(report.email.is_success());
        assert_eq!(dispatcher.mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_email_only() {
        let dispatcher = dispatcher(false, false);
        let report = dispatcher.dispatch("Sunny.", "sender mail").await;

        assert!(report.storage.is_success());
        assert!(!report.email.is_success());
        assert!(dispatcher.mailer.sent.lock().unwrap().is_empty());
    }
}
