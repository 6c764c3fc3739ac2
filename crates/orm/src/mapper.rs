//! Entity to column/value encoding for writes.

use chrono::{DateTime, Utc};
use sea_query::Value;

use crate::descriptor::Mode;
use crate::entity::{Record, is_zero, value_to_datatype};
use crate::error::{Error, Result};

/// Ordered column/value pairs to write for `record`.
///
/// Columns not writable in `mode` are dropped. Timestamp columns are stamped
/// with `now` (create-time columns on create when zero, update-time columns
/// on every update) and the stamped value is written back onto `record`.
/// Create-time columns are never part of an update. When `omit_key` is set,
/// auto-increment key columns are left for the database to generate.
///
/// # Errors
///
/// Returns [`Error::Mapping`] if a stamped value cannot be written back.
pub fn encode(
    record: &mut dyn Record, mode: Mode, now: DateTime<Utc>, omit_key: bool,
) -> Result<Vec<(&'static str, Value)>> {
    let descriptor = record.descriptor();
    let mut encoded = Vec::new();

    for (name, value) in record.values() {
        let Some(column) = descriptor.column(name) else {
            continue;
        };
        if !column.access.writable(mode) || (omit_key && column.auto_increment) {
            continue;
        }

        let stamp = match mode {
            Mode::Create => column.auto_create_time && is_zero(&value),
            Mode::Update if column.auto_create_time && !column.auto_update_time => continue,
            Mode::Update => column.auto_update_time,
        };

        if stamp {
            assign(record, name, Value::from(now))?;
            encoded.push((name, Value::from(now)));
        } else {
            encoded.push((name, value));
        }
    }

    Ok(encoded)
}

/// Current value of `column` on `record`.
pub fn value_of(record: &dyn Record, column: &str) -> Option<Value> {
    record.values().into_iter().find(|(name, _)| *name == column).map(|(_, value)| value)
}

/// Overwrite `column` on `record` with an outbound `value`.
///
/// # Errors
///
/// Returns [`Error::Mapping`] if the field rejects the value.
pub fn assign(record: &mut dyn Record, column: &str, value: Value) -> Result<()> {
    let table = record.descriptor().table;
    let data_type = value_to_datatype(value).map_err(|e| Error::mapping(table, &e))?;
    record.assign(column, &data_type).map_err(|e| Error::mapping(table, &e))
}
