//! # Balade Documents
//!
//! The single entity of the store: a walking-tour point of interest.
//!
//! The schema is loose. Known fields are typed, anything else the client
//! sends is kept verbatim in `extra` and round-trips through the store.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};

/// Wire name of the record identifier
pub const ID_FIELD: &str = "_id";

/// Fields that must be present and non-empty when a Balade is created
pub const REQUIRED_FIELDS: [&str; 3] = ["nom_poi", "adresse", "categorie"];

/// Everything a Balade carries apart from its identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaladeFields {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom_poi: Option<String>,

    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,

    /// Category label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorie: Option<String>,

    /// Postal / arrondissement code, accepted as string or number
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub code_postal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texte_intro: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texte_description: Option<String>,

    /// External website
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_site: Option<String>,

    /// Keywords, kept free of duplicates by `add-to-set` updates
    #[serde(default, deserialize_with = "nullable_list")]
    pub mot_cle: Vec<String>,

    /// Entry date as text; its leading characters carry the year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_saisie: Option<String>,

    /// Fields outside the known schema
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored Balade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balade {
    /// Assigned by the store on insert, never changes afterwards
    #[serde(rename = "_id")]
    pub id: Uuid,

    #[serde(flatten)]
    pub fields: BaladeFields,
}

impl Balade {
    /// JSON document view used for filter evaluation and patching
    pub fn to_document(&self) -> StoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a Balade from a JSON document, checking field types
    pub fn from_document(doc: Value) -> StoreResult<Self> {
        serde_json::from_value(doc).map_err(|e| StoreError::InvalidDocument(e.to_string()))
    }

    /// Merge `patch` over this record and return the result.
    ///
    /// `_id` entries in the patch are ignored. A `null` value clears the field.
    pub fn patched(&self, patch: &Map<String, Value>) -> StoreResult<Self> {
        let mut doc = self.to_document()?;
        if let Value::Object(base) = &mut doc {
            for (key, value) in patch {
                if key == ID_FIELD {
                    continue;
                }
                if value.is_null() {
                    base.remove(key);
                } else {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        Self::from_document(doc)
    }

    /// Append `value` to the array held in `field` unless already present.
    ///
    /// Returns the updated record, or `None` when nothing changed.
    pub fn with_added_to_set(&self, field: &str, value: &Value) -> StoreResult<Option<Self>> {
        if field == ID_FIELD {
            return Err(StoreError::InvalidDocument(
                "the identifier cannot be modified".to_string(),
            ));
        }

        let mut doc = self.to_document()?;
        let Value::Object(base) = &mut doc else {
            return Ok(None);
        };

        let entry = base
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = entry else {
            return Err(StoreError::InvalidDocument(format!(
                "field '{}' is not an array",
                field
            )));
        };

        if items.contains(value) {
            return Ok(None);
        }
        items.push(value.clone());

        Self::from_document(doc).map(Some)
    }
}

/// A Balade that passed creation checks and has no identifier yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewBalade {
    fields: BaladeFields,
}

impl NewBalade {
    /// Validate a client document for creation.
    ///
    /// `nom_poi`, `adresse` and `categorie` must be non-empty strings.
    /// A client-supplied `_id` is discarded.
    pub fn from_document(doc: Value) -> StoreResult<Self> {
        let mut map = match doc {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidDocument(format!(
                    "expected a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !is_non_empty_string(map.get(*field)))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingRequiredFields(missing));
        }

        map.remove(ID_FIELD);
        let fields = serde_json::from_value(Value::Object(map))
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &BaladeFields {
        &self.fields
    }

    /// Attach the identifier assigned by the store
    pub fn with_id(self, id: Uuid) -> Balade {
        Balade {
            id,
            fields: self.fields,
        }
    }
}

/// Parse a record identifier
pub fn parse_id(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| StoreError::InvalidIdentifier(raw.to_string()))
}

fn is_non_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.is_empty())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            json_type_name(&other)
        ))),
    }
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
