//! The catalog of field names an expression may reference.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fields every channel source exposes; used when the server catalog is
/// unreachable.
pub const BUILTIN_FIELDS: [&str; 8] = [
    "channel_name",
    "group_title",
    "tvg_id",
    "tvg_name",
    "tvg_logo",
    "tvg_shift",
    "tvg_chno",
    "stream_url",
];

/// One entry of `GET /filters/fields`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub nullable: bool,
}

fn default_field_type() -> String {
    "string".to_string()
}

impl FieldInfo {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: display_name_for(&name),
            name,
            field_type: default_field_type(),
            nullable: false,
        }
    }
}

fn display_name_for(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered, de-duplicated set of known field names.
///
/// The catalog is a snapshot: it is loaded once per editing session and is
/// not refreshed if the server's field list changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: Vec<FieldInfo>,
    names: Vec<String>,
    index: HashSet<String>,
}

impl FieldCatalog {
    pub fn new(fields: impl IntoIterator<Item = FieldInfo>) -> Self {
        let mut catalog = Self::default();
        for field in fields {
            if field.name.is_empty() || catalog.index.contains(&field.name) {
                continue;
            }
            catalog.index.insert(field.name.clone());
            catalog.names.push(field.name.clone());
            catalog.fields.push(field);
        }
        catalog
    }

    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(names.into_iter().map(FieldInfo::named))
    }

    /// The built-in fallback catalog
    pub fn builtin() -> Self {
        Self::from_names(BUILTIN_FIELDS)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
