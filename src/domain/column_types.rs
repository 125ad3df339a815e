use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Analysis type a column can be tagged with in the exported header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Number,
    Currency,
    Date,
    Text,
    Category,
    Url,
    Sex,
    Boolean,
}

impl BaseType {
    fn as_str(&self) -> &'static str {
        match self {
            BaseType::Number => "number",
            BaseType::Currency => "currency",
            BaseType::Date => "date",
            BaseType::Text => "text",
            BaseType::Category => "category",
            BaseType::Url => "url",
            BaseType::Sex => "sex",
            BaseType::Boolean => "boolean",
        }
    }
}

impl FromStr for BaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(BaseType::Number),
            "currency" => Ok(BaseType::Currency),
            "date" => Ok(BaseType::Date),
            "text" => Ok(BaseType::Text),
            "category" => Ok(BaseType::Category),
            "url" => Ok(BaseType::Url),
            "sex" => Ok(BaseType::Sex),
            "boolean" => Ok(BaseType::Boolean),
            other => Err(format!("unknown column type \"{}\"", other)),
        }
    }
}

/// A scalar type or `list[<type>]`. Lists of free text are not a thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Scalar(BaseType),
    List(BaseType),
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("list[").and_then(|rest| rest.strip_suffix(']')) {
            Some(inner) => match inner.parse()? {
                BaseType::Text => Err("list[text] is not a valid column type".to_string()),
                base => Ok(ColumnType::List(base)),
            },
            None => Ok(ColumnType::Scalar(s.parse()?)),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Scalar(base) => f.write_str(base.as_str()),
            ColumnType::List(base) => write!(f, "list[{}]", base.as_str()),
        }
    }
}

/// Column name to type, rendered into headers as `name<gx:type>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnTypes {
    mappings: HashMap<String, ColumnType>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mapping(&mut self, column: impl Into<String>, column_type: ColumnType) {
        self.mappings.insert(column.into(), column_type);
    }

    pub fn add_mappings<I, K>(&mut self, mappings: I)
    where
        I: IntoIterator<Item = (K, ColumnType)>,
        K: Into<String>,
    {
        for (column, column_type) in mappings {
            self.add_mapping(column, column_type);
        }
    }

    /// Adds every mapping of `other`, replacing existing ones for the same column.
    pub fn merge(&mut self, other: &ColumnTypes) {
        self.add_mappings(other.mappings.iter().map(|(k, v)| (k.clone(), *v)));
    }

    pub fn get_mapping(&self, column: &str) -> Option<ColumnType> {
        self.mappings.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Header text for `column`, with its type suffix when one is known.
    pub fn annotate(&self, column: &str) -> String {
        match self.get_mapping(column) {
            Some(column_type) => format!("{}<gx:{}>", column, column_type),
            None => column.to_string(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, ColumnType)> for ColumnTypes {
    fn from_iter<I: IntoIterator<Item = (K, ColumnType)>>(iter: I) -> Self {
        let mut types = ColumnTypes::new();
        types.add_mappings(iter);
        types
    }
}
