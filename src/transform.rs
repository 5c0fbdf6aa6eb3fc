use bson::{Bson, Document};

use crate::config::DataDestination;
use crate::models::{RawRecord, Result, TabularRecord};

/// Decode one raw BSON document from the source. Any decode failure is fatal
/// for the whole run; there is no partial-success path.
pub fn decode_raw(raw: &RawRecord) -> Result<Document> {
    let doc: Document = bson::from_slice(raw)?;
    Ok(doc)
}

/// Stamp the destination identifiers onto a record. Existing fields with the
/// same names are overwritten on purpose: the destination collection must be
/// self-describing regardless of what the source payload carried.
pub fn enrich(record: &mut Document, destination: &DataDestination) {
    record.insert("organization_id", destination.organization_id.clone());
    record.insert("robot_id", destination.machine_id.clone());
    record.insert("location_id", destination.location_id.clone());
    record.insert("part_id", destination.part_id.clone());
}

/// Decode and enrich the whole fetched set, in order. Each transformed record
/// is echoed pretty-printed to the log stream for operator inspection.
pub fn transform_all(raw_data: &[RawRecord], destination: &DataDestination) -> Result<Vec<TabularRecord>> {
    let mut records = Vec::with_capacity(raw_data.len());
    for raw in raw_data {
        let mut record = decode_raw(raw)?;
        enrich(&mut record, destination);
        match serde_json::to_string_pretty(&Bson::Document(record.clone()).into_relaxed_extjson()) {
            Ok(rendered) => tracing::info!("{}", rendered),
            Err(e) => tracing::warn!(error = %e, "could not render transformed record"),
        }
        records.push(record);
    }
    Ok(records)
}
