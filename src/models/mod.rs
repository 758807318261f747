//! Data models for the front desk store

pub mod audit_log;
pub mod dependent;
pub mod visit;
pub mod visitor;

use chrono::{DateTime, SecondsFormat, Utc};

// Re-export commonly used types
pub use audit_log::{AuditLogEntry, AuditStatus, ClientErrorReport};
pub use dependent::DependentDetails;
pub use visit::{HistoryEntry, VisitDetails};
pub use visitor::{ActiveVisitor, Visitor, VisitorSearchResult};

/// Format a timestamp the way the store keeps it: `2024-05-01T09:30:00.000Z`.
///
/// All stored timestamps share this shape so SQL string comparison is
/// chronological.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_iso() -> String {
    iso_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_use_millisecond_zulu_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(iso_timestamp(at), "2024-05-01T09:30:00.000Z");
    }
}
