//! Segment filter schemas and vocabulary normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

const MAX_TEXT_FILTER_LEN: usize = 200;
const MAX_LIST_FILTER_ITEMS: usize = 100;

/// Saved filter definition. Absent fields are omitted on the wire so two
/// equal definitions always serialize to equal JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technographics: Option<Vec<String>>,
}

impl SegmentFilters {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [("country", &self.country), ("location", &self.location)] {
            if let Some(value) = value {
                if value.chars().count() > MAX_TEXT_FILTER_LEN {
                    return Err(AppError::Validation(format!(
                        "filters.{field} must be at most {MAX_TEXT_FILTER_LEN} characters"
                    )));
                }
            }
        }
        for (field, values) in [
            ("employees", &self.employees),
            ("categories", &self.categories),
            ("technographics", &self.technographics),
        ] {
            let Some(values) = values else { continue };
            if values.len() > MAX_LIST_FILTER_ITEMS {
                return Err(AppError::Validation(format!(
                    "filters.{field} accepts at most {MAX_LIST_FILTER_ITEMS} values"
                )));
            }
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(AppError::Validation(format!(
                    "filters.{field} must not contain empty values"
                )));
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Filters exactly as the generation model returns them. `employees` is a
/// single size bucket here; it becomes a list after normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftFilters {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employees: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub technographics: Option<Vec<String>>,
}

impl DraftFilters {
    /// True when no field carries a usable value.
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
        let empty_list = |v: &Option<Vec<String>>| {
            v.as_ref()
                .map(|items| items.iter().all(|i| i.trim().is_empty()))
                .unwrap_or(true)
        };
        blank(&self.country)
            && blank(&self.location)
            && blank(&self.employees)
            && empty_list(&self.categories)
            && empty_list(&self.technographics)
    }

    /// Maps the draft onto the saved filter shape, keeping only vocabulary
    /// matches for `employees` and `categories`, spelled as the vocabulary
    /// spells them. Unmatched values are dropped.
    pub fn normalize(&self, industries: &[String], company_sizes: &[String]) -> SegmentFilters {
        let employees = self
            .employees
            .as_deref()
            .and_then(|size| match_vocabulary(size, company_sizes))
            .map(|size| vec![size.to_string()]);

        let categories = self.categories.as_ref().map(|raw| {
            let mut matched: Vec<String> = Vec::new();
            for category in raw {
                if let Some(canonical) = match_vocabulary(category, industries) {
                    if !matched.iter().any(|m| m == canonical) {
                        matched.push(canonical.to_string());
                    }
                }
            }
            matched
        });

        let technographics = self.technographics.as_ref().map(|raw| {
            raw.iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });

        SegmentFilters {
            country: non_blank(self.country.as_deref()),
            location: non_blank(self.location.as_deref()),
            employees,
            categories: categories.filter(|c| !c.is_empty()),
            technographics: technographics.filter(|t| !t.is_empty()),
        }
    }
}

/// Case-insensitive lookup returning the vocabulary's own spelling.
pub fn match_vocabulary<'a>(value: &str, vocabulary: &'a [String]) -> Option<&'a str> {
    let needle = value.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    vocabulary
        .iter()
        .find(|candidate| candidate.trim().to_lowercase() == needle)
        .map(|candidate| candidate.as_str())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
