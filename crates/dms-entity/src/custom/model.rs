//! Custom value entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dms_core::types::{CustomFieldId, CustomValueId, FolderId};

/// The value of one custom field on one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CustomValue {
    /// Unique value identifier.
    pub id: CustomValueId,
    /// The field definition.
    pub custom_field_id: CustomFieldId,
    /// The folder carrying the value.
    pub folder_id: FolderId,
    /// Raw value as entered.
    pub value: Option<String>,
}

/// Data required to store a custom value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomValue {
    /// The field definition.
    pub custom_field_id: CustomFieldId,
    /// The folder carrying the value.
    pub folder_id: FolderId,
    /// Raw value.
    pub value: Option<String>,
}
