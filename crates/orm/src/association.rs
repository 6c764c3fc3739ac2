//! Association loading (preload and join) and cascading association writes.

use sea_query::Value;

use crate::Row;
use crate::db::Executor;
use crate::descriptor::{Descriptor, Relation, RelationKind};
use crate::entity::{Entity, Record, RowView, is_zero};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::mapper::{assign, value_of};
use crate::mutation::{self, Conflict, WriteOptions};
use crate::select::SelectBuilder;

/// Connects an owner entity to the related entity `R` through one of the
/// owner's declared relations.
///
/// ```ignore
/// impl Related<Wallet> for User {
///     const RELATION: &'static str = "wallet";
///
///     fn attach(&mut self, related: Vec<Wallet>) {
///         self.wallet = related.into_iter().next();
///     }
/// }
/// ```
pub trait Related<R: Entity>: Entity {
    /// Name of the relation on the owner's descriptor.
    const RELATION: &'static str;

    /// Store the related values found for this owner (possibly none).
    fn attach(&mut self, related: Vec<R>);
}

fn relation_of<M: Related<R>, R: Entity>() -> Result<&'static Relation> {
    M::schema().relation(M::RELATION).ok_or_else(|| {
        Error::Query(format!("{}: unknown relation '{}'", M::TABLE, M::RELATION))
    })
}

/// Decode the `R` columns joined under the relation prefix and attach them.
/// A NULL related key means no related row.
pub(crate) fn attach_joined<M: Related<R>, R: Entity>(owner: &mut M, row: &Row) -> Result<()> {
    let relation = relation_of::<M, R>()?;
    let view = RowView::prefixed(row, relation.join_prefix());

    let target = R::schema();
    let mut keys = target.primary_key();
    if keys.is_empty() {
        keys = target.readable().collect();
    }

    if keys.iter().all(|key| view.is_null(key)) {
        owner.attach(Vec::new());
        return Ok(());
    }

    let related = R::from_row(&view).map_err(|e| Error::mapping(R::TABLE, &e))?;
    owner.attach(vec![related]);
    Ok(())
}

/// Load `R` for every owner with a single `IN` query over the distinct
/// owner keys, then hand each owner its matches.
pub(crate) fn preload<M: Related<R>, R: Entity + Clone>(
    db: &dyn Executor, owners: &mut [M],
) -> Result<()> {
    if owners.is_empty() {
        return Ok(());
    }

    let relation = relation_of::<M, R>()?;
    let owner_keys: Vec<Option<Value>> = owners
        .iter()
        .map(|owner| value_of(owner, relation.owner_key()).filter(|key| !is_zero(key)))
        .collect();

    let mut distinct: Vec<Value> = Vec::new();
    for key in owner_keys.iter().flatten() {
        if !distinct.contains(key) {
            distinct.push(key.clone());
        }
    }

    let related = if distinct.is_empty() {
        Vec::new()
    } else {
        SelectBuilder::<R>::new().r#where(Filter::r#in(relation.target_key(), distinct)).find(db)?
    };

    let related_keys: Vec<Option<Value>> =
        related.iter().map(|record| value_of(record, relation.target_key())).collect();

    for (owner, key) in owners.iter_mut().zip(owner_keys) {
        let matches = key.map_or_else(Vec::new, |key| {
            related
                .iter()
                .zip(&related_keys)
                .filter(|(_, related_key)| related_key.as_ref() == Some(&key))
                .map(|(record, _)| record.clone())
                .collect()
        });
        owner.attach(matches);
    }
    Ok(())
}

/// Write belongs-to targets before their owner (`ON CONFLICT DO NOTHING`)
/// and copy each target's key into the owner's foreign key.
pub(crate) fn write_parents(db: &dyn Executor, record: &mut dyn Record) -> Result<()> {
    let descriptor = record.descriptor();
    let mut keys = Vec::new();

    for association in record.associations() {
        let relation = declared(descriptor, association.relation)?;
        if relation.kind != RelationKind::BelongsTo {
            continue;
        }

        for target in association.records {
            let options = WriteOptions::default().conflict(Conflict::DoNothing);
            mutation::create(db, &mut *target, options)?;
            if let Some(key) = value_of(target, relation.references) {
                keys.push((relation.foreign_key, key));
            }
        }
    }

    for (foreign_key, key) in keys {
        assign(record, foreign_key, key)?;
    }
    Ok(())
}

/// Write has-one and has-many children after their owner, pointing their
/// foreign key at the owner. A child that already exists has its foreign key
/// updated.
pub(crate) fn write_children(db: &dyn Executor, record: &mut dyn Record) -> Result<()> {
    let descriptor = record.descriptor();
    let values = record.values();

    for association in record.associations() {
        let relation = declared(descriptor, association.relation)?;
        if relation.kind == RelationKind::BelongsTo {
            continue;
        }

        let key = values
            .iter()
            .find(|(name, _)| *name == relation.references)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                Error::Query(format!(
                    "{}: relation '{}' references unmapped column '{}'",
                    descriptor.table, relation.name, relation.references
                ))
            })?;

        for child in association.records {
            assign(&mut *child, relation.foreign_key, key.clone())?;
            let conflict = Conflict::Update(std::slice::from_ref(&relation.foreign_key));
            mutation::create(db, child, WriteOptions::default().conflict(conflict))?;
        }
    }
    Ok(())
}

fn declared(descriptor: &'static Descriptor, name: &str) -> Result<&'static Relation> {
    descriptor
        .relation(name)
        .ok_or_else(|| Error::Query(format!("{}: unknown relation '{name}'", descriptor.table)))
}
