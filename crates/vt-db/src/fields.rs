//! Typed field allowlists for writable entity columns.
//!
//! Request bodies are deserialized into [`ItemDraft`] / [`ItemPatch`], which
//! reject any key outside the allowlist. Each accepted field maps to a fixed
//! column through [`ItemField::column`], so SQL text never contains a
//! caller-supplied identifier.

use rusqlite::types::Value;
use serde::Deserialize;
use vt_core::{Error, Result};

/// Writable columns of the `items` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Name,
    Description,
    Sku,
    PriceCents,
    IsActive,
}

impl ItemField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Sku => "sku",
            Self::PriceCents => "price_cents",
            Self::IsActive => "is_active",
        }
    }
}

/// Body of an item insert.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ItemDraft {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_price(self.price_cents)
    }
}

/// Body of a partial item update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ItemPatch {
    /// The fields present in this patch, paired with their SQL values.
    ///
    /// Fails with a validation error when nothing would change or a value is
    /// out of range.
    pub fn changes(&self) -> Result<Vec<(ItemField, Value)>> {
        let mut changes = Vec::new();

        if let Some(ref name) = self.name {
            validate_name(name)?;
            changes.push((ItemField::Name, Value::Text(name.clone())));
        }
        if let Some(ref description) = self.description {
            changes.push((ItemField::Description, Value::Text(description.clone())));
        }
        if let Some(ref sku) = self.sku {
            changes.push((ItemField::Sku, Value::Text(sku.clone())));
        }
        if let Some(price) = self.price_cents {
            validate_price(Some(price))?;
            changes.push((ItemField::PriceCents, Value::Integer(price)));
        }
        if let Some(active) = self.is_active {
            changes.push((ItemField::IsActive, Value::Integer(i64::from(active))));
        }

        if changes.is_empty() {
            return Err(Error::Validation("No valid fields provided for update".into()));
        }

        Ok(changes)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".into()));
    }
    Ok(())
}

fn validate_price(price: Option<i64>) -> Result<()> {
    match price {
        Some(p) if p < 0 => Err(Error::Validation("price_cents must not be negative".into())),
        _ => Ok(()),
    }
}
