//! # Request Bodies
//!
//! Typed bodies for the endpoints that expect a single field.

use serde::Deserialize;

/// Body of `PUT /add-mot_cle/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct AddKeywordRequest {
    pub mot_cle: String,
}

/// Body of `PUT /update-many/{search}`
#[derive(Debug, Clone, Deserialize)]
pub struct RenameRequest {
    pub nom_poi: String,
}
