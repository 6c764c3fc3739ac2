//! Entity-level writes: create, batch create and save.

use chrono::Utc;

use crate::association::{write_children, write_parents};
use crate::db::Executor;
use crate::descriptor::{Descriptor, Mode};
use crate::entity::{Entity, Record, is_zero};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::insert::Insert;
use crate::mapper::{encode, value_of};
use crate::update::UpdateBuilder;

/// What an insert does when it hits an existing primary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conflict {
    /// Fail with [`Error::Constraint`].
    #[default]
    Reject,
    /// Overwrite every written column except the key and create-time columns.
    UpdateAll,
    /// Overwrite only the listed columns.
    Update(&'static [&'static str]),
    /// Keep the existing row.
    DoNothing,
}

/// Options for entity writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub conflict: Conflict,
    /// Skip cascading writes of associated records.
    pub omit_associations: bool,
}

impl WriteOptions {
    /// Sets the conflict behaviour.
    #[must_use]
    pub const fn conflict(mut self, conflict: Conflict) -> Self {
        self.conflict = conflict;
        self
    }

    /// Do not write associated records.
    #[must_use]
    pub const fn omit_associations(mut self) -> Self {
        self.omit_associations = true;
        self
    }
}

/// Insert `record` (and, unless omitted, its associations).
pub(crate) fn create(
    db: &dyn Executor, record: &mut dyn Record, options: WriteOptions,
) -> Result<u64> {
    insert_records(db, &mut [record], options)
}

/// Insert `entities` with one statement per chunk of `batch_size` rows
/// (`0` means a single chunk). The first failing chunk aborts the call.
pub(crate) fn create_batch<M: Entity>(
    db: &dyn Executor, entities: &mut [M], batch_size: usize, options: WriteOptions,
) -> Result<u64> {
    let size = if batch_size == 0 { entities.len().max(1) } else { batch_size };
    let mut total = 0;
    for chunk in entities.chunks_mut(size) {
        let mut records: Vec<&mut dyn Record> =
            chunk.iter_mut().map(|entity| entity as &mut dyn Record).collect();
        total += insert_records(db, &mut records, options)?;
    }
    Ok(total)
}

/// Create when the primary key is zero, otherwise update every column by
/// primary key, falling back to an upserting create when no row matched.
pub(crate) fn save<M: Entity>(
    db: &dyn Executor, entity: &mut M, options: WriteOptions,
) -> Result<u64> {
    let descriptor = M::schema();
    let Some(keys) = key_filter(descriptor, entity) else {
        return create(db, entity, options);
    };

    if !options.omit_associations {
        write_parents(db, entity)?;
    }

    let primary_key = descriptor.primary_key();
    let columns: Vec<_> = encode(entity, Mode::Update, Utc::now(), false)?
        .into_iter()
        .filter(|(name, _)| !primary_key.contains(name))
        .collect();

    let mut affected = 0;
    if !columns.is_empty() {
        affected = UpdateBuilder::<M>::new().set_map(columns).r#where(keys).exec(db)?;
    }

    if affected == 0 {
        let fallback = WriteOptions::default().conflict(Conflict::UpdateAll).omit_associations();
        affected = create(db, entity, fallback)?;
    }

    if !options.omit_associations {
        write_children(db, entity)?;
    }
    Ok(affected)
}

// Equality on every primary-key column, or `None` while any part is zero.
fn key_filter(descriptor: &Descriptor, record: &dyn Record) -> Option<Filter> {
    let primary_key = descriptor.primary_key();
    if primary_key.is_empty() {
        return None;
    }

    let mut filters = Vec::with_capacity(primary_key.len());
    for column in primary_key {
        let value = value_of(record, column).filter(|value| !is_zero(value))?;
        filters.push(Filter::eq(column, value));
    }
    Some(Filter::And(filters))
}

fn insert_records(
    db: &dyn Executor, records: &mut [&mut dyn Record], options: WriteOptions,
) -> Result<u64> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let descriptor = first.descriptor();

    if !options.omit_associations {
        for record in records.iter_mut() {
            write_parents(db, &mut **record)?;
        }
    }

    // generated keys are omitted only when no row supplies one
    let generated: Vec<&'static str> = descriptor
        .columns
        .iter()
        .filter(|column| column.auto_increment)
        .map(|column| column.name)
        .filter(|name| {
            records.iter().all(|record| value_of(&**record, name).is_none_or(|v| is_zero(&v)))
        })
        .collect();

    let now = Utc::now();
    let omit_key = !generated.is_empty();
    let mut insert = Insert::new(descriptor.table);
    for record in records.iter_mut() {
        insert.row(encode(&mut **record, Mode::Create, now, omit_key)?)?;
    }

    let primary_key = descriptor.primary_key();
    match options.conflict {
        Conflict::Reject => {}
        Conflict::DoNothing => insert.on_conflict_do_nothing(primary_key),
        Conflict::Update(columns) => insert.on_conflict_update(primary_key, columns.to_vec()),
        Conflict::UpdateAll => {
            let columns = insert
                .columns()
                .iter()
                .copied()
                .filter(|name| {
                    descriptor.column(name).is_some_and(|column| {
                        !column.primary_key
                            && column.access.writable(Mode::Update)
                            && !(column.auto_create_time && !column.auto_update_time)
                    })
                })
                .collect();
            insert.on_conflict_update(primary_key, columns);
        }
    }

    let affected = if generated.is_empty() {
        let query = insert.build(db.dialect())?;
        db.execute(&query)?
    } else {
        insert.returning(&generated);
        let query = insert.build(db.dialect())?;
        let rows = db.fetch(&query)?;

        // rows skipped by a conflict return nothing, so keys can only be
        // matched back when every row came back
        if rows.len() == records.len() {
            for (record, row) in records.iter_mut().zip(&rows) {
                for column in &generated {
                    if let Some(value) = row.get(column) {
                        record
                            .assign(column, value)
                            .map_err(|e| Error::mapping(descriptor.table, &e))?;
                    }
                }
            }
        }
        rows.len() as u64
    };

    if !options.omit_associations {
        for record in records.iter_mut() {
            write_children(db, &mut **record)?;
        }
    }
    Ok(affected)
}
