//! Validated price-list shapes handed to the database layer.

/// A supplier price list that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    pub shop: String,
    pub categories: Vec<CategoryEntry>,
    pub goods: Vec<GoodEntry>,
}

/// Supplier-assigned category id and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub id: i64,
    pub name: String,
}

/// One offer line of the price list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodEntry {
    /// Supplier's own id for the offer (stored as the external id).
    pub id: i64,
    pub category: i64,
    pub model: String,
    pub name: String,
    pub price: i64,
    pub price_rrc: i64,
    pub quantity: i32,
    /// Characteristics in document order. Scalar values are stringified.
    pub parameters: Vec<ParameterEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEntry {
    pub name: String,
    pub value: String,
}

impl PriceList {
    /// Total number of parameter values across all goods.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.goods.iter().map(|g| g.parameters.len()).sum()
    }
}
