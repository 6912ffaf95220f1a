use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    category::RiskCategory,
    engine::UnknownCategoryPolicy,
    error::{ScaleField, ValidationError},
    factor::RiskFactor,
};

/// Factors observed for a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRiskSet {
    category: RiskCategory,
    factors: Vec<RiskFactor>,
}

impl CategoryRiskSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new(category: RiskCategory) -> Self {
        Self {
            category,
            factors: Vec::new(),
        }
    }

    /// Creates a set holding `factors`.
    #[must_use]
    pub const fn with_factors(category: RiskCategory, factors: Vec<RiskFactor>) -> Self {
        Self { category, factors }
    }

    /// Category of every factor in the set.
    #[must_use]
    pub const fn category(&self) -> RiskCategory {
        self.category
    }

    /// Factors in insertion order.
    #[must_use]
    pub fn factors(&self) -> &[RiskFactor] {
        &self.factors
    }

    /// Appends a factor.
    pub fn push(&mut self, factor: RiskFactor) {
        self.factors.push(factor);
    }

    /// Number of factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// `true` when no factor was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Validates every factor in the set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.factors
            .iter()
            .enumerate()
            .try_for_each(|(index, factor)| factor.validate(self.category, index))
    }
}

/// Risk factors for one project, grouped by category. Absent categories count as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRiskInput {
    sets: IndexMap<RiskCategory, CategoryRiskSet>,
}

impl ProjectRiskInput {
    /// Creates an input with no factors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::push`].
    #[must_use]
    pub fn with_factor(mut self, category: RiskCategory, factor: RiskFactor) -> Self {
        self.push(category, factor);
        self
    }

    /// Adds a factor to `category`.
    pub fn push(&mut self, category: RiskCategory, factor: RiskFactor) {
        self.sets
            .entry(category)
            .or_insert_with(|| CategoryRiskSet::new(category))
            .push(factor);
    }

    /// Replaces the set for its category.
    pub fn insert_set(&mut self, set: CategoryRiskSet) {
        self.sets.insert(set.category(), set);
    }

    /// Set for `category`, if one was supplied.
    #[must_use]
    pub fn set(&self, category: RiskCategory) -> Option<&CategoryRiskSet> {
        self.sets.get(&category)
    }

    /// Factors for `category`; empty when the category is absent.
    #[must_use]
    pub fn factors(&self, category: RiskCategory) -> &[RiskFactor] {
        match self.sets.get(&category) {
            Some(set) => set.factors(),
            None => &[],
        }
    }

    /// Total factors across all categories.
    #[must_use]
    pub fn total_factors(&self) -> usize {
        self.sets.values().map(CategoryRiskSet::len).sum()
    }

    /// Iterates `(category, factor)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, &RiskFactor)> + '_ {
        RiskCategory::ALL.into_iter().flat_map(move |category| {
            self.factors(category)
                .iter()
                .map(move |factor| (category, factor))
        })
    }

    /// Validates every supplied set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        RiskCategory::ALL
            .into_iter()
            .filter_map(|category| self.set(category))
            .try_for_each(CategoryRiskSet::validate)
    }

    /// Loads untyped input of the form `{ "<category>": [ { "name", "impact",
    /// "likelihood", "description"? , "mitigation"? }, ... ] }`.
    ///
    /// Legacy keys such as `schedule_risk_factors` map onto their category and
    /// are merged with the plain key. Ratings must be JSON numbers; strings are
    /// not coerced. A missing `name` is replaced by `<category> #<n>`; a blank one
    /// is rejected.
    pub fn from_json(
        value: &Value,
        unknown_categories: UnknownCategoryPolicy,
    ) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::Malformed("risk input must be a JSON object".into()))?;
        let mut input = Self::new();
        for (key, entry) in object {
            let Some(category) = RiskCategory::parse_key(key) else {
                match unknown_categories {
                    UnknownCategoryPolicy::Reject => {
                        return Err(ValidationError::UnknownCategory(key.clone()))
                    }
                    UnknownCategoryPolicy::Ignore => {
                        tracing::debug!(key = %key, "skipping unknown risk category");
                        continue;
                    }
                }
            };
            let items = entry.as_array().ok_or_else(|| {
                ValidationError::Malformed(format!(
                    "`{key}` must be an array of risk factors, found {}",
                    json_type(entry)
                ))
            })?;
            let offset = input.factors(category).len();
            for (position, item) in items.iter().enumerate() {
                let factor = parse_factor(category, offset + position, item)?;
                factor.validate(category, offset + position)?;
                input.push(category, factor);
            }
            if items.is_empty() {
                input
                    .sets
                    .entry(category)
                    .or_insert_with(|| CategoryRiskSet::new(category));
            }
        }
        Ok(input)
    }
}

impl FromIterator<(RiskCategory, RiskFactor)> for ProjectRiskInput {
    fn from_iter<T: IntoIterator<Item = (RiskCategory, RiskFactor)>>(iter: T) -> Self {
        let mut input = Self::new();
        for (category, factor) in iter {
            input.push(category, factor);
        }
        input
    }
}

fn parse_factor(
    category: RiskCategory,
    index: usize,
    item: &Value,
) -> Result<RiskFactor, ValidationError> {
    let object = item.as_object().ok_or_else(|| {
        ValidationError::Malformed(format!(
            "{category} factor #{index} must be an object, found {}",
            json_type(item)
        ))
    })?;
    let name = match object.get("name") {
        None | Some(Value::Null) => format!("{category} #{}", index + 1),
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(ValidationError::Malformed(format!(
                "{category} factor #{index}: `name` must be a string, found {}",
                json_type(other)
            )))
        }
    };
    let impact = read_rating(object, category, index, ScaleField::Impact)?;
    let likelihood = read_rating(object, category, index, ScaleField::Likelihood)?;
    let mut factor = RiskFactor::new(name, impact, likelihood);
    factor.description = optional_text(object, "description");
    factor.mitigation = optional_text(object, "mitigation");
    Ok(factor)
}

fn read_rating(
    object: &Map<String, Value>,
    category: RiskCategory,
    index: usize,
    field: ScaleField,
) -> Result<f64, ValidationError> {
    match object.get(field.key()) {
        None | Some(Value::Null) => Err(ValidationError::MissingField {
            category,
            index,
            field: field.key(),
        }),
        Some(Value::Number(number)) => number.as_f64().ok_or(ValidationError::NonNumeric {
            category,
            index,
            field: field.key(),
            found: "number",
        }),
        Some(other) => Err(ValidationError::NonNumeric {
            category,
            index,
            field: field.key(),
            found: json_type(other),
        }),
    }
}

fn optional_text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_categories_read_as_empty() {
        let input = ProjectRiskInput::new()
            .with_factor(RiskCategory::Budget, RiskFactor::new("Cost overruns", 6.0, 7.0));
        assert!(input.factors(RiskCategory::Schedule).is_empty());
        assert!(input.set(RiskCategory::Schedule).is_none());
        assert_eq!(input.total_factors(), 1);
    }

    #[test]
    fn loads_plain_and_legacy_keys() {
        let value = json!({
            "schedule": [{ "name": "Timeline slippage", "impact": 7, "likelihood": 6 }],
            "schedule_risk_factors": [{ "name": "Resource availability", "impact": 8, "likelihood": 5.5 }],
            "market": []
        });
        let input = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Reject).unwrap();
        let schedule = input.factors(RiskCategory::Schedule);
        assert_eq!(schedule.len(), 2);
        assert!((schedule[1].likelihood - 5.5).abs() < f64::EPSILON);
        assert!(input.set(RiskCategory::Market).unwrap().is_empty());
    }

    #[test]
    fn unnamed_factors_get_positional_labels() {
        let value = json!({ "technical": [{ "impact": 8, "likelihood": 7 }] });
        let input = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Reject).unwrap();
        assert_eq!(input.factors(RiskCategory::Technical)[0].name, "technical #1");
    }

    #[test]
    fn string_ratings_are_not_coerced() {
        let value = json!({ "budget": [{ "name": "Vendor", "impact": "6", "likelihood": 5 }] });
        let err = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonNumeric {
                category: RiskCategory::Budget,
                index: 0,
                field: "impact",
                found: "string",
            }
        );
    }

    #[test]
    fn missing_rating_is_reported() {
        let value = json!({ "market": [{ "name": "Demand", "impact": 6 }] });
        let err = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "likelihood", .. }
        ));
    }

    #[test]
    fn out_of_range_rating_fails_while_loading() {
        let value = json!({ "market": [{ "name": "Demand", "impact": 12, "likelihood": 3 }] });
        let err = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Reject).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn unknown_keys_follow_policy() {
        let value = json!({
            "resource_risk": [{ "name": "Staffing", "impact": 5, "likelihood": 5 }],
            "budget": [{ "name": "Overrun", "impact": 5, "likelihood": 5 }]
        });
        let err = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Reject).unwrap_err();
        assert_eq!(err, ValidationError::UnknownCategory("resource_risk".into()));

        let input = ProjectRiskInput::from_json(&value, UnknownCategoryPolicy::Ignore).unwrap();
        assert_eq!(input.total_factors(), 1);
    }

    #[test]
    fn rejects_non_object_shapes() {
        assert!(matches!(
            ProjectRiskInput::from_json(&json!([1, 2]), UnknownCategoryPolicy::Reject),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            ProjectRiskInput::from_json(&json!({ "budget": 4 }), UnknownCategoryPolicy::Reject),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            ProjectRiskInput::from_json(&json!({ "budget": [3] }), UnknownCategoryPolicy::Reject),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn iter_walks_categories_in_order() {
        let input: ProjectRiskInput = vec![
            (RiskCategory::Market, RiskFactor::new("m", 1.0, 1.0)),
            (RiskCategory::Schedule, RiskFactor::new("s", 1.0, 1.0)),
        ]
        .into_iter()
        .collect();
        let order: Vec<_> = input.iter().map(|(category, _)| category).collect();
        assert_eq!(order, vec![RiskCategory::Schedule, RiskCategory::Market]);
    }
}
