//! Turning raw price-list bytes into a validated [`PriceList`].

use crate::error::ImportError;
use crate::types::PriceList;
use crate::validate::validate_document;

/// Parses YAML text and validates it.
///
/// # Errors
///
/// - [`ImportError::Yaml`] if the text is not well-formed YAML.
/// - [`ImportError::Validation`] for the first schema violation.
pub fn parse_price_list(text: &str) -> Result<PriceList, ImportError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
    let list = validate_document(&doc)?;
    tracing::debug!(
        shop = %list.shop,
        categories = list.categories.len(),
        goods = list.goods.len(),
        "price list validated"
    );
    Ok(list)
}

/// Parses an uploaded price-list file.
///
/// # Errors
///
/// - [`ImportError::TooLarge`] if `bytes` exceeds `max_bytes`.
/// - [`ImportError::Encoding`] if the upload is not UTF-8.
/// - Anything [`parse_price_list`] returns.
pub fn parse_upload(bytes: &[u8], max_bytes: usize) -> Result<PriceList, ImportError> {
    if bytes.len() > max_bytes {
        return Err(ImportError::TooLarge { limit: max_bytes });
    }
    let text = std::str::from_utf8(bytes).map_err(|_| ImportError::Encoding)?;
    parse_price_list(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = parse_price_list("shop: [unterminated").unwrap_err();
        assert!(matches!(err, ImportError::Yaml(_)), "got: {err:?}");
    }

    #[test]
    fn schema_violation_is_a_validation_error() {
        let err = parse_price_list("shop: S\ncategories:\n  - name: X\ngoods: []\n").unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)), "got: {err:?}");
        assert_eq!(err.to_string(), "Field \"id\" not found in category #1.");
    }

    #[test]
    fn upload_over_limit_is_rejected() {
        let err = parse_upload(b"shop: S\ncategories: []\ngoods: []\n", 4).unwrap_err();
        assert!(matches!(err, ImportError::TooLarge { limit: 4 }));
    }

    #[test]
    fn non_utf8_upload_is_rejected() {
        let err = parse_upload(&[0xff, 0xfe, 0x00], 1024).unwrap_err();
        assert!(matches!(err, ImportError::Encoding));
    }

    #[test]
    fn valid_upload_parses() {
        let list = parse_upload(b"shop: S\ncategories: []\ngoods: []\n", 1024).expect("valid");
        assert_eq!(list.shop, "S");
    }
}
