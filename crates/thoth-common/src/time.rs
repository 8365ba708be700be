//! Timestamp helpers shared by the tracker ledger, decision log, and
//! coordination substrate — all three require monotonic-per-writer,
//! ISO-8601 timestamps (spec §4.7).

use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn format_iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}
