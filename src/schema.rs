use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type of a column, as exposed to users. Warehouse-specific
/// physical types are mapped onto this closed set by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    Time,
    Timestamp,
}

impl SemanticType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SemanticType::Integer | SemanticType::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SemanticType::Date | SemanticType::Time | SemanticType::Timestamp
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Text => "text",
            SemanticType::Boolean => "boolean",
            SemanticType::Date => "date",
            SemanticType::Time => "time",
            SemanticType::Timestamp => "timestamp",
        };
        write!(f, "{}", name)
    }
}

/// A single named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: SemanticType,
}

/// An ordered mapping from column name to semantic type. Column order is
/// semantically meaningful (positional set operations, SELECT output order).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Convenience constructor from `(name, type)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, SemanticType)>,
        S: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, ty)| Column {
                    name: name.into(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolves a column's type, or reports the unknown reference.
    pub fn ty_of(&self, name: &str) -> Result<SemanticType, CompileError> {
        self.get(name)
            .map(|c| c.ty)
            .ok_or_else(|| CompileError::UnknownColumn {
                column: name.to_string(),
            })
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", col.name, col.ty)?;
        }
        write!(f, "}}")
    }
}

/// Identifies a materialized table in the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub namespace: String,
    pub name: String,
}

impl TableRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// The entity that produced a materialized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    Integration(u32),
    WorkflowOutput { workflow: u32, node: u32 },
}

/// A materialized table record: the result of an integration sync or of a
/// workflow's OUTPUT node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub table_ref: TableRef,
    pub schema: Schema,
    pub num_rows: u64,
    pub data_updated: chrono::DateTime<chrono::Utc>,
    pub source: TableSource,
}

/// Validates a user-supplied label against warehouse identifier rules:
/// a letter or underscore followed by letters, digits or underscores.
pub fn validate_identifier(name: &str) -> Result<(), CompileError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
