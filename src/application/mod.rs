pub mod booking;
pub mod caller;
pub mod identity;
pub mod ports;
pub mod reminders;

// Re-export key types for convenience
pub use booking::{BookingRequest, BookingService};
pub use caller::Caller;
pub use identity::{
    AuthResult, IdentityService, PasswordResetSettings, RefreshedToken, RegisterUser,
};
pub use ports::{Mailer, OutgoingEmail};
pub use reminders::{
    format_datetime, ReminderEntry, ReminderJob, ReminderOptions, ReminderOutcome, ReminderReport,
};
