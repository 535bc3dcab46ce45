//! Booking reminder emails
//!
//! A single batch pass, invoked on a schedule by the management CLI.

pub mod service;
pub mod template;

pub use service::{ReminderEntry, ReminderJob, ReminderOptions, ReminderOutcome, ReminderReport};
pub use template::{format_datetime, reminder_email};
