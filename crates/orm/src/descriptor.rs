//! Static mapping metadata for entities.
//!
//! A [`Descriptor`] is built once per entity type (typically inside a
//! `LazyLock`) and never changes afterwards.

use crate::entity::Embedded;

/// Write/read permission of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Read, written on create and update.
    #[default]
    ReadWrite,
    /// Read, written on create only.
    CreateOnly,
    /// Read, written on update only.
    UpdateOnly,
    /// Read, never written.
    ReadOnly,
    /// Neither read nor written.
    Ignored,
}

/// Which kind of write a column is being encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Inserting a new row.
    Create,
    /// Updating an existing row.
    Update,
}

impl Access {
    /// Whether the column is part of the select projection.
    #[must_use]
    pub const fn readable(self) -> bool {
        !matches!(self, Self::Ignored)
    }

    /// Whether the column is written for the given mode.
    #[must_use]
    pub const fn writable(self, mode: Mode) -> bool {
        match self {
            Self::ReadWrite => true,
            Self::CreateOnly => matches!(mode, Mode::Create),
            Self::UpdateOnly => matches!(mode, Mode::Update),
            Self::ReadOnly | Self::Ignored => false,
        }
    }
}

/// A mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Database column name.
    pub name: &'static str,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub access: Access,
    pub auto_create_time: bool,
    pub auto_update_time: bool,
    /// Field holding the embedded struct this column was flattened from.
    pub embedded_in: Option<&'static str>,
}

impl Column {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            primary_key: false,
            auto_increment: false,
            access: Access::ReadWrite,
            auto_create_time: false,
            auto_update_time: false,
            embedded_in: None,
        }
    }
}

/// Direction of a declared relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The owner holds the foreign key; it references the target's key.
    BelongsTo,
    /// The target holds a foreign key referencing the owner; at most one row.
    HasOne,
    /// The target holds a foreign key referencing the owner; any number of rows.
    HasMany,
}

/// A declared association between an owner entity and a target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Relation name, also used as the join alias.
    pub name: &'static str,
    pub kind: RelationKind,
    /// Table of the related entity.
    pub table: &'static str,
    /// Column holding the foreign key (on the owner for belongs-to, on the
    /// target otherwise).
    pub foreign_key: &'static str,
    /// Column the foreign key points at.
    pub references: &'static str,
}

impl Relation {
    /// Declare a belongs-to relation. Defaults: `foreign_key = "<name>_id"`,
    /// `references = "id"`.
    #[must_use]
    pub fn belongs_to(name: &'static str, table: &'static str) -> Self {
        Self::new(name, RelationKind::BelongsTo, table)
    }

    /// Declare a has-one relation. Defaults: `references = "id"`.
    #[must_use]
    pub fn has_one(name: &'static str, table: &'static str) -> Self {
        Self::new(name, RelationKind::HasOne, table)
    }

    /// Declare a has-many relation. Defaults: `references = "id"`.
    #[must_use]
    pub fn has_many(name: &'static str, table: &'static str) -> Self {
        Self::new(name, RelationKind::HasMany, table)
    }

    fn new(name: &'static str, kind: RelationKind, table: &'static str) -> Self {
        Self {
            name,
            kind,
            table,
            foreign_key: "",
            references: "id",
        }
    }

    /// Sets the foreign key column.
    #[must_use]
    pub const fn foreign_key(mut self, column: &'static str) -> Self {
        self.foreign_key = column;
        self
    }

    /// Sets the referenced column.
    #[must_use]
    pub const fn references(mut self, column: &'static str) -> Self {
        self.references = column;
        self
    }

    /// Column read from the owner to match related rows.
    #[must_use]
    pub const fn owner_key(&self) -> &'static str {
        match self.kind {
            RelationKind::BelongsTo => self.foreign_key,
            RelationKind::HasOne | RelationKind::HasMany => self.references,
        }
    }

    /// Column on the related table matched against [`Relation::owner_key`].
    #[must_use]
    pub const fn target_key(&self) -> &'static str {
        match self.kind {
            RelationKind::BelongsTo => self.references,
            RelationKind::HasOne | RelationKind::HasMany => self.foreign_key,
        }
    }

    /// Prefix given to the related columns when the relation is joined.
    #[must_use]
    pub fn join_prefix(&self) -> String {
        format!("{}__", self.name)
    }
}

/// Static metadata for one mapped entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub table: &'static str,
    pub columns: Vec<Column>,
    /// Nullable timestamp column marking soft-deleted rows.
    pub soft_delete: Option<&'static str>,
    pub relations: Vec<Relation>,
}

impl Descriptor {
    /// Start declaring the descriptor for `table`.
    #[must_use]
    pub const fn builder(table: &'static str) -> DescriptorBuilder {
        DescriptorBuilder {
            descriptor: Self {
                table,
                columns: Vec::new(),
                soft_delete: None,
                relations: Vec::new(),
            },
        }
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Columns read by a default projection.
    pub fn readable(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().filter(|column| column.access.readable()).map(|column| column.name)
    }

    /// Primary-key column names in declaration order.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&'static str> {
        self.columns.iter().filter(|column| column.primary_key).map(|column| column.name).collect()
    }

    /// Look up a relation by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }
}

/// Builder for [`Descriptor`].
///
/// Column modifiers such as [`DescriptorBuilder::primary_key`] declare the
/// column if it has not been declared yet.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: Descriptor,
}

impl DescriptorBuilder {
    /// Declare a plain read/write column.
    #[must_use]
    pub fn column(mut self, name: &'static str) -> Self {
        self.column_mut(name);
        self
    }

    /// Declare several plain columns in order.
    #[must_use]
    pub fn columns(mut self, names: &[&'static str]) -> Self {
        for name in names {
            self.column_mut(name);
        }
        self
    }

    /// Flatten the columns of an [`Embedded`] struct stored in `field`.
    #[must_use]
    pub fn embed<E: Embedded>(mut self, field: &'static str) -> Self {
        for name in E::columns() {
            self.column_mut(name).embedded_in = Some(field);
        }
        self
    }

    /// Mark `name` as (part of) the primary key.
    #[must_use]
    pub fn primary_key(mut self, name: &'static str) -> Self {
        self.column_mut(name).primary_key = true;
        self
    }

    /// Mark `name` as a database-generated key, read back after insert.
    #[must_use]
    pub fn auto_increment(mut self, name: &'static str) -> Self {
        self.column_mut(name).auto_increment = true;
        self
    }

    /// Set the read/write permission of `name`.
    #[must_use]
    pub fn access(mut self, name: &'static str, access: Access) -> Self {
        self.column_mut(name).access = access;
        self
    }

    /// Stamp `name` with the current time on create.
    #[must_use]
    pub fn auto_create_time(mut self, name: &'static str) -> Self {
        self.column_mut(name).auto_create_time = true;
        self
    }

    /// Stamp `name` with the current time on create and update.
    #[must_use]
    pub fn auto_update_time(mut self, name: &'static str) -> Self {
        self.column_mut(name).auto_update_time = true;
        self
    }

    /// Use `name` as the soft-delete marker.
    #[must_use]
    pub fn soft_delete(mut self, name: &'static str) -> Self {
        self.column_mut(name);
        self.descriptor.soft_delete = Some(name);
        self
    }

    /// Declare a relation.
    #[must_use]
    pub fn relation(mut self, mut relation: Relation) -> Self {
        if relation.foreign_key.is_empty() {
            relation.foreign_key = match relation.kind {
                RelationKind::BelongsTo => leak(format!("{}_id", relation.name)),
                RelationKind::HasOne | RelationKind::HasMany => {
                    leak(format!("{}_id", singular(self.descriptor.table)))
                }
            };
        }
        self.descriptor.relations.push(relation);
        self
    }

    /// Apply a customisation closure, as used by the `entity!` macro.
    #[must_use]
    pub fn with(self, configure: impl FnOnce(Self) -> Self) -> Self {
        configure(self)
    }

    /// Finish the descriptor, applying naming conventions: `id` is the
    /// primary key when none was declared, and `created_at`/`updated_at`
    /// are auto-stamped when no column carries a timestamp flag.
    #[must_use]
    pub fn build(mut self) -> Descriptor {
        let columns = &mut self.descriptor.columns;

        if !columns.iter().any(|column| column.primary_key)
            && let Some(id) = columns.iter_mut().find(|column| column.name == "id")
        {
            id.primary_key = true;
        }

        if !columns.iter().any(|column| column.auto_create_time || column.auto_update_time) {
            for column in columns.iter_mut() {
                match column.name {
                    "created_at" => column.auto_create_time = true,
                    "updated_at" => {
                        column.auto_create_time = true;
                        column.auto_update_time = true;
                    }
                    _ => {}
                }
            }
        }

        self.descriptor
    }

    fn column_mut(&mut self, name: &'static str) -> &mut Column {
        let columns = &mut self.descriptor.columns;
        let pos = columns.iter().position(|column| column.name == name).unwrap_or_else(|| {
            columns.push(Column::new(name));
            columns.len() - 1
        });
        &mut columns[pos]
    }
}

// Descriptors live for the whole process, so derived names may too.
fn leak(name: String) -> &'static str {
    Box::leak(name.into_boxed_str())
}

fn singular(table: &str) -> &str {
    table.strip_suffix('s').unwrap_or(table)
}
