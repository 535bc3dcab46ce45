//! Reminder email rendering

use chrono::{DateTime, Utc};

use crate::application::ports::OutgoingEmail;
use crate::domain::BookingDetails;

/// `2024-01-02 00:30:00+00:00`
pub fn format_datetime(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

pub fn reminder_email(details: &BookingDetails) -> OutgoingEmail {
    let booking = &details.booking;
    let start = format_datetime(booking.start_datetime);

    let rooms = details
        .rooms
        .iter()
        .map(|r| format!("  - {} ({})", r.name, r.floor_name))
        .collect::<Vec<_>>()
        .join("\n");

    let purpose = booking.purpose.as_deref().unwrap_or("-");

    let body = format!(
        "Hello {username},\n\n\
         This is a reminder of your upcoming booking #{id}.\n\n\
         Rooms:\n{rooms}\n\n\
         Start: {start}\n\
         End:   {end}\n\
         Purpose: {purpose}\n\n\
         If you no longer need the rooms, please cancel the booking so others can use them.\n",
        username = details.owner.username,
        id = booking.id,
        rooms = rooms,
        start = start,
        end = format_datetime(booking.end_datetime),
        purpose = purpose,
    );

    OutgoingEmail {
        to: details.owner.email.clone(),
        subject: format!("Reminder: your booking #{} starts at {}", booking.id, start),
        body,
    }
}
