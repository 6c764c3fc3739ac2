use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_query::{Value, Values};

use crate::descriptor::Descriptor;
use crate::{DataType, Row};

/// Trait for types that can be extracted from a database value.
///
/// This trait is implemented for all standard Rust types that can be
/// fetched from a database row (`i32`, `String`, `DateTime`, etc.). Drivers
/// differ in the representation they return (`SQLite` reports every integer
/// as `i64` and timestamps as text), so conversions accept any lossless
/// source representation.
pub trait FetchValue: Sized {
    /// Convert a single column value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted to the target type.
    fn decode(value: &DataType) -> Result<Self>;
}

/// Read access to one result row, optionally through a join prefix.
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    row: &'a Row,
    prefix: Option<String>,
    partial: bool,
}

impl<'a> RowView<'a> {
    /// View every column of `row`; absent columns are an error.
    #[must_use]
    pub const fn new(row: &'a Row) -> Self {
        Self {
            row,
            prefix: None,
            partial: false,
        }
    }

    /// Absent columns decode to the type's default (explicit projections).
    #[must_use]
    pub const fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// View the columns of `row` named `<prefix><column>`.
    #[must_use]
    pub fn prefixed(row: &'a Row, prefix: String) -> Self {
        Self {
            row,
            prefix: Some(prefix),
            partial: false,
        }
    }

    /// The underlying row.
    #[must_use]
    pub const fn row(&self) -> &'a Row {
        self.row
    }

    /// Raw value of `column`, if present.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&'a DataType> {
        match &self.prefix {
            Some(prefix) => self.row.get(&format!("{prefix}{column}")),
            None => self.row.get(column),
        }
    }

    /// `true` when `column` is absent or `NULL`.
    #[must_use]
    pub fn is_null(&self, column: &str) -> bool {
        self.value(column).is_none_or(DataType::is_null)
    }

    /// Decode `column`.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing from a full projection or its
    /// value cannot be converted.
    pub fn get<T: FetchValue + Default>(&self, column: &str) -> Result<T> {
        match self.value(column) {
            Some(value) => T::decode(value).with_context(|| format!("column '{column}'")),
            None if self.partial => Ok(T::default()),
            None => bail!("missing column '{column}'"),
        }
    }

    /// Decode `column`, taking the type's default when it is absent. Used for
    /// columns a default projection never selects.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted.
    pub fn get_or_default<T: FetchValue + Default>(&self, column: &str) -> Result<T> {
        self.value(column).map_or_else(
            || Ok(T::default()),
            |value| T::decode(value).with_context(|| format!("column '{column}'")),
        )
    }
}

/// Types that can be built from a result row, whether or not they are
/// mapped entities.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    ///
    /// # Errors
    ///
    /// Returns an error if any required column is missing or cannot be converted to the expected type.
    fn from_row(row: &RowView<'_>) -> Result<Self>;
}

/// Object-safe view of a mapped value, used wherever the concrete entity
/// type is not known (cascading writes, write-back of generated values).
pub trait Record {
    /// Mapping metadata for this value's type.
    fn descriptor(&self) -> &'static Descriptor;

    /// Every mapped column with its current value, embedded structs flattened.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Overwrite the field mapped to `column`.
    ///
    /// # Errors
    ///
    /// Returns an error if `column` is not mapped or `value` cannot be converted.
    fn assign(&mut self, column: &str, value: &DataType) -> Result<()>;

    /// Related values held by this record, for cascading writes.
    fn associations(&mut self) -> Vec<Association<'_>> {
        Vec::new()
    }
}

/// Trait for database entities with metadata for query building.
///
/// Typically implemented via the `entity!` macro rather than manually.
pub trait Entity: Record + FromRow {
    /// The database table name for this entity.
    const TABLE: &'static str;

    /// Mapping metadata, built once and cached.
    fn schema() -> &'static Descriptor;
}

/// A struct whose fields are flattened into the columns of its owner.
pub trait Embedded: Sized {
    /// Column names contributed to the owner.
    fn columns() -> &'static [&'static str];

    /// Decode from the owner's row.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or cannot be converted.
    fn from_row(row: &RowView<'_>) -> Result<Self>;

    /// Current column values.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Overwrite `column` if it belongs to this struct; `Ok(false)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be converted.
    fn assign(&mut self, column: &str, value: &DataType) -> Result<bool>;
}

/// Related records reachable from an owner through one declared relation.
pub struct Association<'a> {
    /// Name of the relation on the owner's descriptor.
    pub relation: &'static str,
    pub records: Vec<&'a mut dyn Record>,
}

impl<'a> Association<'a> {
    /// Collect `records` (an `Option` or slice iterator) under `relation`.
    pub fn of<R: Record + 'a>(
        relation: &'static str, records: impl IntoIterator<Item = &'a mut R>,
    ) -> Self {
        Self {
            relation,
            records: records.into_iter().map(|record| record as &mut dyn Record).collect(),
        }
    }
}

/// Declares an ORM entity with automatic `Entity` trait implementation.
///
/// Field names are column names. An optional `descriptor` closure refines the
/// generated [`Descriptor`](crate::Descriptor).
///
/// # Examples
///
/// ```ignore
/// entity! {
///     table = "user_logs",
///     descriptor = |d| d.auto_increment("id"),
///     #[derive(Debug, Clone, Default)]
///     pub struct UserLog {
///         pub id: i64,
///         pub user_id: String,
///         pub action: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (
        table = $table:literal,
        descriptor = $configure:expr,
        $(#[$meta:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field_name:ident : $field_type:ty
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $struct_name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type
            ),*
        }

        impl $crate::FromRow for $struct_name {
            fn from_row(row: &$crate::RowView<'_>) -> $crate::__private::anyhow::Result<Self> {
                Ok(Self {
                    $(
                        $field_name: if <Self as $crate::Entity>::schema()
                            .column(stringify!($field_name))
                            .is_some_and(|column| !column.access.readable())
                        {
                            row.get_or_default::<$field_type>(stringify!($field_name))?
                        } else {
                            row.get::<$field_type>(stringify!($field_name))?
                        },
                    )*
                })
            }
        }

        impl $crate::Record for $struct_name {
            fn descriptor(&self) -> &'static $crate::Descriptor {
                <Self as $crate::Entity>::schema()
            }

            fn values(&self) -> Vec<(&'static str, $crate::__private::Value)> {
                vec![
                    $(
                        (stringify!($field_name), self.$field_name.clone().into()),
                    )*
                ]
            }

            fn assign(
                &mut self, column: &str, value: &$crate::DataType,
            ) -> $crate::__private::anyhow::Result<()> {
                $(
                    if column == stringify!($field_name) {
                        self.$field_name = <$field_type as $crate::FetchValue>::decode(value)?;
                        return Ok(());
                    }
                )*
                $crate::__private::anyhow::bail!("unknown column '{column}'")
            }
        }

        impl $crate::Entity for $struct_name {
            const TABLE: &'static str = $table;

            fn schema() -> &'static $crate::Descriptor {
                static SCHEMA: ::std::sync::LazyLock<$crate::Descriptor> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::Descriptor::builder($table)
                            .columns(&[$( stringify!($field_name) ),*])
                            .with($configure)
                            .build()
                    });
                &SCHEMA
            }
        }
    };

    // Bare table → forward with an identity descriptor closure
    (
        table = $table:literal,
        $($rest:tt)*
    ) => {
        $crate::entity! {
            table = $table,
            descriptor = |descriptor| descriptor,
            $($rest)*
        }
    };
}

/// Declares a struct whose fields are flattened into an owning entity.
///
/// # Examples
///
/// ```ignore
/// embedded! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Name {
///         pub first_name: String,
///         pub last_name: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! embedded {
    (
        $(#[$meta:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field_name:ident : $field_type:ty
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $struct_name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type
            ),*
        }

        impl $crate::Embedded for $struct_name {
            fn columns() -> &'static [&'static str] {
                &[ $( stringify!($field_name) ),* ]
            }

            fn from_row(row: &$crate::RowView<'_>) -> $crate::__private::anyhow::Result<Self> {
                Ok(Self {
                    $(
                        $field_name: row.get::<$field_type>(stringify!($field_name))?,
                    )*
                })
            }

            fn values(&self) -> Vec<(&'static str, $crate::__private::Value)> {
                vec![
                    $(
                        (stringify!($field_name), self.$field_name.clone().into()),
                    )*
                ]
            }

            fn assign(
                &mut self, column: &str, value: &$crate::DataType,
            ) -> $crate::__private::anyhow::Result<bool> {
                $(
                    if column == stringify!($field_name) {
                        self.$field_name = <$field_type as $crate::FetchValue>::decode(value)?;
                        return Ok(true);
                    }
                )*
                Ok(false)
            }
        }
    };
}

/// Whether `value` is the zero value of its type (`0`, `""`, `false`, the
/// Unix epoch, `NULL`). Zero-valued fields are skipped by struct conditions
/// and struct updates, and a zero primary key means "not yet persisted".
#[must_use]
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Bool(v) => v.is_none_or(|v| !v),
        Value::TinyInt(v) => v.is_none_or(|v| v == 0),
        Value::SmallInt(v) => v.is_none_or(|v| v == 0),
        Value::Int(v) => v.is_none_or(|v| v == 0),
        Value::BigInt(v) => v.is_none_or(|v| v == 0),
        Value::TinyUnsigned(v) => v.is_none_or(|v| v == 0),
        Value::SmallUnsigned(v) => v.is_none_or(|v| v == 0),
        Value::Unsigned(v) => v.is_none_or(|v| v == 0),
        Value::BigUnsigned(v) => v.is_none_or(|v| v == 0),
        Value::Float(v) => v.is_none_or(|v| v == 0.0),
        Value::Double(v) => v.is_none_or(|v| v == 0.0),
        Value::String(v) => v.as_ref().is_none_or(|s| s.is_empty()),
        Value::Char(v) => v.is_none(),
        Value::Bytes(v) => v.as_ref().is_none_or(|b| b.is_empty()),
        Value::ChronoDate(v) => v.as_ref().is_none_or(|d| **d == NaiveDate::default()),
        Value::ChronoTime(v) => v.as_ref().is_none_or(|t| **t == NaiveTime::default()),
        Value::ChronoDateTime(v) => v.as_ref().is_none_or(|dt| **dt == NaiveDateTime::default()),
        Value::ChronoDateTimeUtc(v) => {
            v.as_ref().is_none_or(|dt| **dt == DateTime::<Utc>::default())
        }
        _ => false,
    }
}

// Outbound conversion (internal use only)
pub fn values_to_datatypes(values: Values) -> Result<Vec<DataType>> {
    values.into_iter().map(value_to_datatype).collect()
}

pub fn value_to_datatype(value: Value) -> Result<DataType> {
    let data_type = match value {
        Value::Bool(v) => DataType::Boolean(v),
        Value::TinyInt(v) => DataType::Int32(v.map(i32::from)),
        Value::SmallInt(v) => DataType::Int32(v.map(i32::from)),
        Value::Int(v) => DataType::Int32(v),
        Value::BigInt(v) => DataType::Int64(v),
        Value::TinyUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::SmallUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::Unsigned(v) => DataType::Uint32(v),
        Value::BigUnsigned(v) => DataType::Uint64(v),
        Value::Float(v) => DataType::Float(v),
        Value::Double(v) => DataType::Double(v),
        Value::String(v) => DataType::Str(v.map(|value| *value)),
        Value::ChronoDate(v) => DataType::Date(v.map(|value| {
            let date = *value;
            date.to_string() // "%Y-%m-%d"
        })),
        Value::ChronoTime(v) => DataType::Time(v.map(|value| {
            let time = *value;
            time.to_string() // "%H:%M:%S%.f"
        })),
        Value::ChronoDateTime(v) => DataType::Timestamp(v.map(|value| {
            let dt = *value;
            dt.to_string() // "%Y-%m-%d %H:%M:%S%.f"
        })),
        Value::ChronoDateTimeUtc(v) => DataType::Timestamp(v.map(|value| {
            let dt: DateTime<Utc> = *value;
            dt.to_rfc3339() // "%Y-%m-%dT%H:%M:%S%.f%:z"
        })),
        Value::Char(v) => DataType::Str(v.map(|ch| ch.to_string())),
        Value::Bytes(v) => DataType::Binary(v.map(|bytes| *bytes)),
        _ => {
            bail!("unsupported values require explicit conversion before building the query")
        }
    };
    Ok(data_type)
}

// Inbound conversion
impl FetchValue for bool {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Boolean(Some(v)) => Ok(*v),
            DataType::Int32(Some(_)) | DataType::Int64(Some(_)) => Ok(as_i64(value)? != 0),
            _ => bail!("expected boolean data type"),
        }
    }
}

impl FetchValue for i32 {
    fn decode(value: &DataType) -> Result<Self> {
        Ok(Self::try_from(as_i64(value)?)?)
    }
}

impl FetchValue for i64 {
    fn decode(value: &DataType) -> Result<Self> {
        as_i64(value)
    }
}

impl FetchValue for u32 {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Uint32(Some(v)) => Ok(*v),
            _ => Ok(Self::try_from(as_i64(value)?)?),
        }
    }
}

impl FetchValue for u64 {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Uint64(Some(v)) => Ok(*v),
            _ => Ok(Self::try_from(as_i64(value)?)?),
        }
    }
}

impl FetchValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Float(Some(v)) => Ok(*v),
            _ => Ok(as_f64(value)? as Self),
        }
    }
}

impl FetchValue for f64 {
    fn decode(value: &DataType) -> Result<Self> {
        as_f64(value)
    }
}

impl FetchValue for String {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Str(Some(raw))
            | DataType::Date(Some(raw))
            | DataType::Time(Some(raw))
            | DataType::Timestamp(Some(raw)) => Ok(raw.clone()),
            _ => bail!("expected string data type"),
        }
    }
}

impl FetchValue for Vec<u8> {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Binary(Some(bytes)) => Ok(bytes.clone()),
            _ => bail!("expected binary data type"),
        }
    }
}

impl FetchValue for DateTime<Utc> {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Timestamp(Some(raw)) | DataType::Str(Some(raw)) => as_timestamp(raw),
            _ => bail!("expected timestamp data type"),
        }
    }
}

impl FetchValue for NaiveDate {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Date(Some(raw)) | DataType::Str(Some(raw)) => {
                Self::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format"))
            }
            _ => bail!("expected date data type"),
        }
    }
}

impl FetchValue for serde_json::Value {
    fn decode(value: &DataType) -> Result<Self> {
        match value {
            DataType::Str(Some(raw)) => Ok(serde_json::from_str(raw)?),
            DataType::Binary(Some(bytes)) => Ok(serde_json::from_slice(bytes)?),
            _ => bail!("expected json compatible data type"),
        }
    }
}

impl<T: FetchValue> FetchValue for Option<T> {
    fn decode(value: &DataType) -> Result<Self> {
        if value.is_null() { Ok(None) } else { Ok(Some(T::decode(value)?)) }
    }
}

fn as_i64(value: &DataType) -> Result<i64> {
    match value {
        DataType::Int32(Some(v)) => Ok(i64::from(*v)),
        DataType::Int64(Some(v)) => Ok(*v),
        DataType::Uint32(Some(v)) => Ok(i64::from(*v)),
        DataType::Uint64(Some(v)) => Ok(i64::try_from(*v)?),
        _ => bail!("expected integer data type"),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: &DataType) -> Result<f64> {
    match value {
        DataType::Double(Some(v)) => Ok(*v),
        DataType::Float(Some(v)) => Ok(f64::from(*v)),
        DataType::Int32(Some(_)) | DataType::Int64(Some(_)) => Ok(as_i64(value)? as f64),
        _ => bail!("expected floating point data type"),
    }
}

fn as_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
    }

    bail!("unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn row(fields: Vec<(&str, DataType)>) -> Row {
        Row {
            index: "0".to_string(),
            fields: fields
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn value_to_datatype_numeric_types() {
        let val_bool = value_to_datatype(Value::Bool(Some(true))).unwrap();
        assert!(matches!(val_bool, DataType::Boolean(Some(true))));

        let val_int = value_to_datatype(Value::Int(Some(42))).unwrap();
        assert!(matches!(val_int, DataType::Int32(Some(42))));

        let val_bigint = value_to_datatype(Value::BigInt(Some(999))).unwrap();
        assert!(matches!(val_bigint, DataType::Int64(Some(999))));

        let val_small_u = value_to_datatype(Value::SmallUnsigned(Some(500))).unwrap();
        assert!(matches!(val_small_u, DataType::Uint32(Some(500))));

        let val_big_u = value_to_datatype(Value::BigUnsigned(Some(10000))).unwrap();
        assert!(matches!(val_big_u, DataType::Uint64(Some(10000))));

        let val_f64 = value_to_datatype(Value::Double(Some(std::f64::consts::E))).unwrap();
        assert!(
            matches!(val_f64, DataType::Double(Some(v)) if (v - std::f64::consts::E).abs() < 0.001)
        );
    }

    #[test]
    fn value_to_datatype_temporal_types() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let val_date = value_to_datatype(Value::ChronoDate(Some(Box::new(date)))).unwrap();
        assert_eq!(val_date, DataType::Date(Some("2024-01-15".to_string())));

        let dt_utc: DateTime<Utc> = "2024-01-15T10:30:45Z".parse().unwrap();
        let val_dt_utc =
            value_to_datatype(Value::ChronoDateTimeUtc(Some(Box::new(dt_utc)))).unwrap();
        if let DataType::Timestamp(Some(s)) = &val_dt_utc {
            assert!(s.contains("2024-01-15"));
            assert!(s.contains("10:30:45"));
        } else {
            panic!("Expected timestamp string");
        }
    }

    #[test]
    fn value_to_datatype_null_variants() {
        assert!(matches!(value_to_datatype(Value::Bool(None)).unwrap(), DataType::Boolean(None)));
        assert!(matches!(value_to_datatype(Value::BigInt(None)).unwrap(), DataType::Int64(None)));
        assert!(matches!(value_to_datatype(Value::String(None)).unwrap(), DataType::Str(None)));
    }

    #[test]
    fn decode_widens_driver_representations() {
        assert!(bool::decode(&DataType::Int64(Some(1))).unwrap());
        assert_eq!(i32::decode(&DataType::Int64(Some(42))).unwrap(), 42);
        assert_eq!(u64::decode(&DataType::Int64(Some(7))).unwrap(), 7);
        assert!((f64::decode(&DataType::Int64(Some(3))).unwrap() - 3.0).abs() < f64::EPSILON);

        let ts = DateTime::<Utc>::decode(&DataType::Str(Some("2024-01-15T10:30:45Z".into())))
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T10:30:45+00:00");

        let naive =
            DateTime::<Utc>::decode(&DataType::Str(Some("2024-01-15 10:30:45".into()))).unwrap();
        assert_eq!(naive, ts);

        assert_eq!(Option::<String>::decode(&DataType::Str(None)).unwrap(), None);
        assert_eq!(Option::<i64>::decode(&DataType::Int64(Some(5))).unwrap(), Some(5));
    }

    #[test]
    fn decode_conversion_errors() {
        bool::decode(&DataType::Str(Some("yes".to_string()))).unwrap_err();
        i32::decode(&DataType::Int64(Some(i64::MAX))).unwrap_err();
        i64::decode(&DataType::Boolean(Some(true))).unwrap_err();
        String::decode(&DataType::Int32(Some(42))).unwrap_err();
        Vec::<u8>::decode(&DataType::Str(Some("not binary".to_string()))).unwrap_err();
        serde_json::Value::decode(&DataType::Str(Some("not json".to_string()))).unwrap_err();

        let result = DateTime::<Utc>::decode(&DataType::Timestamp(Some("invalid".to_string())));
        assert!(result.unwrap_err().to_string().contains("unsupported timestamp"));
    }

    #[test]
    fn row_view_lookup() {
        let row = row(vec![
            ("id", DataType::Str(Some("1".into()))),
            ("wallet__balance", DataType::Int64(Some(100))),
            ("wallet__id", DataType::Str(None)),
        ]);

        let view = RowView::new(&row);
        assert_eq!(view.get::<String>("id").unwrap(), "1");
        let err = view.get::<String>("password").unwrap_err();
        assert!(err.to_string().contains("missing column 'password'"));

        let partial = RowView::new(&row).partial(true);
        assert_eq!(partial.get::<String>("password").unwrap(), "");

        let joined = RowView::prefixed(&row, "wallet__".to_string());
        assert_eq!(joined.get::<i64>("balance").unwrap(), 100);
        assert!(joined.is_null("id"));
        assert!(joined.is_null("user_id"));
    }

    #[test]
    fn zero_values() {
        assert!(is_zero(&Value::from("")));
        assert!(!is_zero(&Value::from("x")));
        assert!(is_zero(&Value::from(0_i64)));
        assert!(is_zero(&Value::from(false)));
        assert!(is_zero(&Value::String(None)));
        assert!(is_zero(&Value::from(DateTime::<Utc>::default())));
        assert!(!is_zero(&Value::from(Utc::now())));
        assert!(!is_zero(&Value::from(-1_i32)));
    }
}
