//! Graph node values as handed over by the upstream cache/file parser.
//!
//! A node is a mapping from property name to an ordered list of typed values.
//! Values are kept in their textual form; the type tag tells a resolver how
//! the text may be interpreted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classification of a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// A numeric literal.
    Number,
    /// A free text literal.
    Text,
    /// Reference to a node that already has a canonical id.
    Resolved,
    /// Reference to a node local to the import.
    Unresolved,
    /// A date literal.
    Date,
    /// A boolean literal.
    Boolean,
    /// Type could not be determined by the parser.
    Unknown,
}

impl ValueType {
    /// Returns true for literal kinds that may carry a number in text form.
    #[must_use]
    pub const fn is_numeric_candidate(self) -> bool {
        matches!(self, Self::Number | Self::Text)
    }
}

/// A single value of a property together with its type tag.
///
/// # Examples
///
/// ```
/// use graph_recon::{TypedValue, ValueType};
///
/// let lat = TypedValue::number("37.77493");
/// assert_eq!(lat.value_type, ValueType::Number);
/// assert_eq!(lat.as_f64(), Some(37.77493));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedValue {
    /// Type tag assigned by the parser.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Raw textual value.
    pub value: String,
}

impl TypedValue {
    /// Creates a value with an explicit type.
    #[must_use]
    pub fn new(value_type: ValueType, value: impl Into<String>) -> Self {
        Self {
            value_type,
            value: value.into(),
        }
    }

    /// Creates a numeric value.
    #[must_use]
    pub fn number(value: impl Into<String>) -> Self {
        Self::new(ValueType::Number, value)
    }

    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(ValueType::Text, value)
    }

    /// Creates a reference to a node with a canonical id.
    #[must_use]
    pub fn resolved(value: impl Into<String>) -> Self {
        Self::new(ValueType::Resolved, value)
    }

    /// Parses the value as a finite `f64`.
    ///
    /// Only `Number` and `Text` values qualify. Surrounding whitespace is
    /// ignored; NaN and infinities are rejected. Alternate encodings such as
    /// `12.34N` are not understood.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        if !self.value_type.is_numeric_candidate() {
            return None;
        }
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Returns the trimmed text for literal kinds, `None` if empty.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        if !self.value_type.is_numeric_candidate() {
            return None;
        }
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// An ingested graph node prior to identifier resolution.
///
/// Resolvers only ever read nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValues {
    /// Import-local node id, used for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    /// Property name to ordered values.
    #[serde(default)]
    pub pvs: BTreeMap<String, Vec<TypedValue>>,
}

impl PropertyValues {
    /// Creates an empty node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the import-local id.
    #[must_use]
    pub fn with_local_id(mut self, local_id: impl Into<String>) -> Self {
        self.local_id = Some(local_id.into());
        self
    }

    /// Appends a value to a property, builder style.
    #[must_use]
    pub fn with(mut self, property: impl Into<String>, value: TypedValue) -> Self {
        self.push(property, value);
        self
    }

    /// Appends a value to a property.
    pub fn push(&mut self, property: impl Into<String>, value: TypedValue) {
        self.pvs.entry(property.into()).or_default().push(value);
    }

    /// Returns the values of a property in order.
    #[must_use]
    pub fn values(&self, property: &str) -> &[TypedValue] {
        self.pvs.get(property).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the first value of `property` that parses as a finite number.
    #[must_use]
    pub fn first_f64(&self, property: &str) -> Option<f64> {
        self.values(property).iter().find_map(TypedValue::as_f64)
    }

    /// Returns the first non-empty literal value of `property`.
    #[must_use]
    pub fn first_literal(&self, property: &str) -> Option<&str> {
        self.values(property).iter().find_map(TypedValue::as_literal)
    }

    /// Label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        self.local_id.as_deref().unwrap_or("<anonymous>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_f64_number_and_text() {
        assert_eq!(TypedValue::number("1.5").as_f64(), Some(1.5));
        assert_eq!(TypedValue::text(" -0.116773 ").as_f64(), Some(-0.116_773));
    }

    #[test]
    fn test_as_f64_rejects_non_finite_and_garbage() {
        assert_eq!(TypedValue::number("NaN").as_f64(), None);
        assert_eq!(TypedValue::number("inf").as_f64(), None);
        assert_eq!(TypedValue::text("-infinity").as_f64(), None);
        assert_eq!(TypedValue::text("12.34N").as_f64(), None);
        assert_eq!(TypedValue::text("").as_f64(), None);
    }

    #[test]
    fn test_as_f64_rejects_reference_types() {
        assert_eq!(TypedValue::resolved("42").as_f64(), None);
        assert_eq!(TypedValue::new(ValueType::Date, "2020").as_f64(), None);
    }

    #[test]
    fn test_first_f64_skips_unparseable() {
        let node = PropertyValues::new()
            .with("latitude", TypedValue::resolved("dc/abc"))
            .with("latitude", TypedValue::text("north"))
            .with("latitude", TypedValue::number("10.25"))
            .with("latitude", TypedValue::number("99"));
        assert_eq!(node.first_f64("latitude"), Some(10.25));
        assert_eq!(node.first_f64("longitude"), None);
    }

    #[test]
    fn test_first_literal() {
        let node = PropertyValues::new()
            .with("isoCode", TypedValue::text("  "))
            .with("isoCode", TypedValue::text(" IN "));
        assert_eq!(node.first_literal("isoCode"), Some("IN"));
        assert_eq!(node.first_literal("geoId"), None);
    }

    #[test]
    fn test_push_and_label() {
        let mut node = PropertyValues::new();
        assert!(node.values("name").is_empty());
        assert_eq!(node.label(), "<anonymous>");
        node.push("name", TypedValue::text("San Francisco"));
        assert_eq!(node.values("name"), [TypedValue::text("San Francisco")]);

        let node = node.with_local_id("l:SF");
        assert_eq!(node.label(), "l:SF");
    }

    #[test]
    fn test_serde_shape() {
        let node = PropertyValues::new().with("latitude", TypedValue::number("1"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["pvs"]["latitude"][0]["type"], "number");
        let back: PropertyValues = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
