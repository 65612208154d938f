//! Fail-fast schema validation of a parsed price-list document.
//!
//! Checks run in document order (shop, then every category, then every good,
//! fields in a fixed order) and stop at the first violation, so the error a
//! supplier sees always points at the earliest problem in their file.

use serde_yaml::Value;

use crate::error::{Location, ValidationError};
use crate::types::{CategoryEntry, GoodEntry, ParameterEntry, PriceList};

/// Validates a parsed YAML document and converts it into a [`PriceList`].
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_document(doc: &Value) -> Result<PriceList, ValidationError> {
    if !doc.is_mapping() {
        return Err(ValidationError::NotAMapping);
    }

    let shop = required_name(doc, "shop", Location::Document)?;
    let categories = required_sequence(doc, "categories")?
        .iter()
        .enumerate()
        .map(|(idx, item)| validate_category(item, Location::Category(idx + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    let goods = required_sequence(doc, "goods")?
        .iter()
        .enumerate()
        .map(|(idx, item)| validate_good(item, Location::Product(idx + 1)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceList {
        shop,
        categories,
        goods,
    })
}

fn validate_category(item: &Value, location: Location) -> Result<CategoryEntry, ValidationError> {
    Ok(CategoryEntry {
        id: required_int(item, "id", location)?,
        name: required_name(item, "name", location)?,
    })
}

fn validate_good(item: &Value, location: Location) -> Result<GoodEntry, ValidationError> {
    let id = required_int(item, "id", location)?;
    let category = required_int(item, "category", location)?;
    let model = required_str(item, "model", location)?.to_owned();
    let name = required_name(item, "name", location)?;
    let price = required_amount(item, "price", location)?;
    let price_rrc = required_amount(item, "price_rrc", location)?;
    let quantity = required_amount(item, "quantity", location)?;
    let quantity = i32::try_from(quantity).map_err(|_| ValidationError::InvalidField {
        field: "quantity",
        location,
    })?;
    let parameters = required_parameters(item, location)?;

    Ok(GoodEntry {
        id,
        category,
        model,
        name,
        price,
        price_rrc,
        quantity,
        parameters,
    })
}

fn field<'a>(
    item: &'a Value,
    name: &'static str,
    location: Location,
) -> Result<&'a Value, ValidationError> {
    match item.get(name) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ValidationError::MissingField {
            field: name,
            location,
        }),
    }
}

fn required_int(item: &Value, name: &'static str, location: Location) -> Result<i64, ValidationError> {
    field(item, name, location)?
        .as_i64()
        .ok_or(ValidationError::InvalidField {
            field: name,
            location,
        })
}

/// Non-negative integer (prices and stock).
fn required_amount(
    item: &Value,
    name: &'static str,
    location: Location,
) -> Result<i64, ValidationError> {
    let value = required_int(item, name, location)?;
    if value < 0 {
        return Err(ValidationError::InvalidField {
            field: name,
            location,
        });
    }
    Ok(value)
}

fn required_str<'a>(
    item: &'a Value,
    name: &'static str,
    location: Location,
) -> Result<&'a str, ValidationError> {
    field(item, name, location)?
        .as_str()
        .ok_or(ValidationError::InvalidField {
            field: name,
            location,
        })
}

/// String that must contain something other than whitespace.
fn required_name(
    item: &Value,
    name: &'static str,
    location: Location,
) -> Result<String, ValidationError> {
    let value = required_str(item, name, location)?.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidField {
            field: name,
            location,
        });
    }
    Ok(value.to_owned())
}

fn required_sequence<'a>(
    doc: &'a Value,
    name: &'static str,
) -> Result<&'a Vec<Value>, ValidationError> {
    field(doc, name, Location::Document)?
        .as_sequence()
        .ok_or(ValidationError::InvalidField {
            field: name,
            location: Location::Document,
        })
}

fn required_parameters(
    item: &Value,
    location: Location,
) -> Result<Vec<ParameterEntry>, ValidationError> {
    let invalid = ValidationError::InvalidField {
        field: "parameters",
        location,
    };

    let mapping = field(item, "parameters", location)?
        .as_mapping()
        .ok_or_else(|| invalid.clone())?;
    if mapping.is_empty() {
        return Err(invalid);
    }

    mapping
        .iter()
        .map(|(key, value)| {
            let name = key
                .as_str()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .ok_or_else(|| invalid.clone())?;
            let value = scalar_to_string(value).ok_or_else(|| invalid.clone())?;
            Ok(ParameterEntry {
                name: name.to_owned(),
                value,
            })
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
