use thiserror::Error;

/// Where in the price list a validation failure was found.
///
/// Item positions are 1-indexed, matching what suppliers see in their file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Document,
    Category(usize),
    Product(usize),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Document => Ok(()),
            Location::Category(n) => write!(f, " in category #{n}"),
            Location::Product(n) => write!(f, " in product #{n}"),
        }
    }
}

/// First schema violation found in a price-list document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Document must be a mapping with \"shop\", \"categories\" and \"goods\".")]
    NotAMapping,

    #[error("Field \"{field}\" not found{location}.")]
    MissingField {
        field: &'static str,
        location: Location,
    },

    #[error("Field \"{field}\" is invalid{location}.")]
    InvalidField {
        field: &'static str,
        location: Location,
    },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid price list URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("price list exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("price list is not valid UTF-8")]
    Encoding,

    #[error("price list is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_category_field_message() {
        let err = ValidationError::MissingField {
            field: "id",
            location: Location::Category(1),
        };
        assert_eq!(err.to_string(), "Field \"id\" not found in category #1.");
    }

    #[test]
    fn missing_product_field_message() {
        let err = ValidationError::MissingField {
            field: "id",
            location: Location::Product(3),
        };
        assert_eq!(err.to_string(), "Field \"id\" not found in product #3.");
    }

    #[test]
    fn document_level_messages_have_no_position() {
        let missing = ValidationError::MissingField {
            field: "shop",
            location: Location::Document,
        };
        let invalid = ValidationError::InvalidField {
            field: "goods",
            location: Location::Document,
        };
        assert_eq!(missing.to_string(), "Field \"shop\" not found.");
        assert_eq!(invalid.to_string(), "Field \"goods\" is invalid.");
    }

    #[test]
    fn validation_error_passes_through_import_error_display() {
        let err = ImportError::from(ValidationError::InvalidField {
            field: "price",
            location: Location::Product(2),
        });
        assert_eq!(err.to_string(), "Field \"price\" is invalid in product #2.");
    }
}
