//! Reminder job: select approved bookings starting soon and email their owners

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use super::template::reminder_email;
use crate::application::ports::Mailer;
use crate::domain::{DomainResult, ReminderWindow, RepositoryProvider};

#[derive(Debug, Clone, Copy)]
pub struct ReminderOptions {
    /// Look-ahead in hours; bookings starting `hours ± 1` from now are selected
    pub hours: i64,
    /// Select and report, but never call the mailer
    pub dry_run: bool,
}

impl Default for ReminderOptions {
    fn default() -> Self {
        Self {
            hours: 24,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Sent,
    DryRun,
    Failed(String),
}

/// Result for one selected booking
#[derive(Debug, Clone)]
pub struct ReminderEntry {
    pub booking_id: i32,
    pub email: String,
    pub start_datetime: DateTime<Utc>,
    pub outcome: ReminderOutcome,
}

#[derive(Debug, Clone)]
pub struct ReminderReport {
    pub window: ReminderWindow,
    pub dry_run: bool,
    pub entries: Vec<ReminderEntry>,
}

impl ReminderReport {
    pub fn found(&self) -> usize {
        self.entries.len()
    }

    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, ReminderOutcome::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ReminderOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&ReminderOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

pub struct ReminderJob {
    repos: Arc<dyn RepositoryProvider>,
    mailer: Arc<dyn Mailer>,
}

impl ReminderJob {
    pub fn new(repos: Arc<dyn RepositoryProvider>, mailer: Arc<dyn Mailer>) -> Self {
        Self { repos, mailer }
    }

    /// Run one pass. Mail failures are recorded per booking and never abort
    /// the batch; a failing query does.
    pub async fn run(
        &self,
        now: DateTime<Utc>,
        options: ReminderOptions,
    ) -> DomainResult<ReminderReport> {
        let window = ReminderWindow::new(now, options.hours)?;
        let bookings = self
            .repos
            .bookings()
            .find_approved_starting_between(window.query_from(), window.query_to())
            .await?;

        info!(
            found = bookings.len(),
            hours = options.hours,
            dry_run = options.dry_run,
            from = %window.query_from(),
            to = %window.query_to(),
            "⏰ Booking reminder pass"
        );

        let mut entries = Vec::with_capacity(bookings.len());
        for details in bookings {
            let outcome = if options.dry_run {
                ReminderOutcome::DryRun
            } else {
                match self.mailer.send(&reminder_email(&details)).await {
                    Ok(()) => {
                        metrics::counter!("booking_reminders_sent_total").increment(1);
                        ReminderOutcome::Sent
                    }
                    Err(e) => {
                        metrics::counter!("booking_reminders_failed_total").increment(1);
                        error!(
                            booking_id = details.booking.id,
                            error = %e,
                            "Failed to send reminder"
                        );
                        ReminderOutcome::Failed(e.to_string())
                    }
                }
            };

            entries.push(ReminderEntry {
                booking_id: details.booking.id,
                email: details.owner.email,
                start_datetime: details.booking.start_datetime,
                outcome,
            });
        }

        Ok(ReminderReport {
            window,
            dry_run: options.dry_run,
            entries,
        })
    }
}
