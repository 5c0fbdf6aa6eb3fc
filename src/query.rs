use bson::{doc, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Duration, Utc};

use crate::models::Result;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Build the `$match` stage selecting records for one part within the
/// look-back window, evaluated against the wall clock, and serialize it into
/// the binary form the query API accepts.
pub fn build_match_stage(part_id: &str, sync_back_n_days: f64) -> Result<Vec<u8>> {
    let stage = match_stage_at(part_id, sync_back_n_days, Utc::now());
    let bytes = bson::to_vec(&stage)?;
    Ok(bytes)
}

/// The un-encoded form of the match stage for a fixed `now`. The window may be
/// fractional; it is applied at millisecond resolution.
pub fn match_stage_at(part_id: &str, sync_back_n_days: f64, now: DateTime<Utc>) -> Document {
    let window = Duration::milliseconds((sync_back_n_days * MILLIS_PER_DAY) as i64);
    let cutoff = BsonDateTime::from_chrono(now - window);
    doc! {
        "$match": {
            "part_id": part_id,
            "time_received": { "$gte": cutoff },
        }
    }
}
