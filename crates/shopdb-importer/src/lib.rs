pub mod client;
pub mod error;
pub mod parse;
pub mod types;
pub mod validate;

pub use client::{validate_url, PriceListClient};
pub use error::{ImportError, Location, ValidationError};
pub use parse::{parse_price_list, parse_upload};
pub use types::{CategoryEntry, GoodEntry, ParameterEntry, PriceList};
pub use validate::validate_document;
