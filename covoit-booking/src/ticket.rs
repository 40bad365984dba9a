use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Ticket code handed to the passenger once the driver confirms.
///
/// Format: `T-{millis}-{reservation id}`. The reservation id alone makes it
/// unique; the timestamp keeps codes readable in order of issue.
pub fn generate_ticket_code(reservation_id: Uuid, issued_at: DateTime<Utc>) -> String {
    format!(
        "T-{}-{}",
        issued_at.timestamp_millis(),
        reservation_id.simple().to_string().to_uppercase()
    )
}
