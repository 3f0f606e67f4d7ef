//! Translation from raw stored snapshots to records.
//!
//! Reference fields are stored as the identity string of their target. On the way in
//! they become [`Reference`] handles; every other stored field is copied through as a
//! scalar, registered or not.

use bson::Bson;

use crate::{
    backend::Snapshot,
    document::ClassMetadata,
    record::{Record, Reference, Value},
};

/// Translates a snapshot into a record of the class described by `metadata`.
///
/// Returns `None` if the snapshot records a missing document.
pub fn translate(metadata: &ClassMetadata, snapshot: Snapshot) -> Option<Record> {
    let (id, data) = snapshot.into_parts();
    let data = data?;

    let mut record = Record::new(id, metadata.name());

    for (field, value) in data {
        let value = match (metadata.reference_target(&field), value) {
            (Some(target), Bson::String(target_id)) => Value::Reference(Reference::new(target_id, target)),
            (_, value) => Value::Scalar(value),
        };

        record.set(field, value);
    }

    Some(record)
}

/// Translates a batch of snapshots, dropping the missing ones and keeping order.
pub fn translate_all(
    metadata: &ClassMetadata,
    snapshots: impl IntoIterator<Item = Snapshot>,
) -> Vec<Record> {
    snapshots
        .into_iter()
        .filter_map(|snapshot| translate(metadata, snapshot))
        .collect()
}
