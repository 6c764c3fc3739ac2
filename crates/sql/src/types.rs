/// A single parameter or column value as exchanged with the driver.
///
/// Every variant is nullable so that a typed `NULL` can be bound.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Uint32(Option<u32>),
    Uint64(Option<u64>),
    Float(Option<f32>),
    Double(Option<f64>),
    Str(Option<String>),
    Binary(Option<Vec<u8>>),
    /// `%Y-%m-%d`
    Date(Option<String>),
    /// `%H:%M:%S%.f`
    Time(Option<String>),
    /// RFC 3339 or `%Y-%m-%d %H:%M:%S%.f`
    Timestamp(Option<String>),
}

impl DataType {
    /// Returns `true` for any of the `None` variants.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Boolean(None)
                | Self::Int32(None)
                | Self::Int64(None)
                | Self::Uint32(None)
                | Self::Uint64(None)
                | Self::Float(None)
                | Self::Double(None)
                | Self::Str(None)
                | Self::Binary(None)
                | Self::Date(None)
                | Self::Time(None)
                | Self::Timestamp(None)
        )
    }
}

/// A named column value within a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: DataType,
}

/// A single result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Position of the row within its result set.
    pub index: String,
    pub fields: Vec<Field>,
}

impl Row {
    /// Look up a column value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataType> {
        self.fields.iter().find(|field| field.name == name).map(|field| &field.value)
    }
}
