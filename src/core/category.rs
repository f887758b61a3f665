//! Result categories and result labels
//!
//! A `Category` is what a report asks for ("fail_od"); a `ResultLabel` is
//! what an inspection record carries in its `overall_result` column
//! ("Fail - OD Envelope"). The tables tying them together live in
//! `CategoryTable` and `WeightTable`, owned by the aggregator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::AggregateError;
use crate::core::records::SegmentTotals;

/// Report category - a filter bucket over result labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Every inspected unit, no label filter
    Inspected,
    Good,
    Fail,
    FailOd,
    FailBackward,
    FailNa,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Inspected,
            Category::Good,
            Category::Fail,
            Category::FailOd,
            Category::FailBackward,
            Category::FailNa,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inspected => "inspected",
            Category::Good => "good",
            Category::Fail => "fail",
            Category::FailOd => "fail_od",
            Category::FailBackward => "fail_backward",
            Category::FailNa => "fail_na",
        }
    }

    /// Heading used on rendered reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Inspected => "All Sensors",
            Category::Good => "Good",
            Category::Fail => "Failed (General)",
            Category::FailOd => "Failed (OD)",
            Category::FailBackward => "Failed (Backwards)",
            Category::FailNa => "Sensors Not Found/Not Valid",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "inspected" | "all" => Ok(Category::Inspected),
            "good" => Ok(Category::Good),
            "fail" => Ok(Category::Fail),
            "fail_od" => Ok(Category::FailOd),
            "fail_backward" | "fail_backwards" => Ok(Category::FailBackward),
            "fail_na" => Ok(Category::FailNa),
            _ => Err(AggregateError::UnknownCategory(s.to_string())),
        }
    }
}

/// Overall result label stored on each record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResultLabel {
    Good,
    Fail,
    FailOdEnvelope,
    Backwards,
    NotAvailable,
}

impl ResultLabel {
    pub fn all() -> &'static [ResultLabel] {
        &[
            ResultLabel::Good,
            ResultLabel::Fail,
            ResultLabel::FailOdEnvelope,
            ResultLabel::Backwards,
            ResultLabel::NotAvailable,
        ]
    }

    /// Canonical spelling as written by the inspection line
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultLabel::Good => "Good",
            ResultLabel::Fail => "Fail",
            ResultLabel::FailOdEnvelope => "Fail - OD Envelope",
            ResultLabel::Backwards => "Backwards",
            ResultLabel::NotAvailable => "N/A",
        }
    }

    /// Parse a stored label, tolerating case and spacing variants
    ///
    /// Returns `None` for anything outside the five recognized labels.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "good" => Some(ResultLabel::Good),
            "fail" => Some(ResultLabel::Fail),
            "failodenvelope" => Some(ResultLabel::FailOdEnvelope),
            "backwards" | "backward" => Some(ResultLabel::Backwards),
            "n/a" | "na" => Some(ResultLabel::NotAvailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Segment-total count column a label's population is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightField {
    Good,
    FailGeneral,
    FailOd,
    FailBackward,
    NA,
}

impl WeightField {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightField::Good => "good",
            WeightField::FailGeneral => "fail_general",
            WeightField::FailOd => "fail_od",
            WeightField::FailBackward => "fail_backward",
            WeightField::NA => "n_a",
        }
    }

    /// Read this column from a segment's totals
    pub fn read(&self, totals: &SegmentTotals) -> u64 {
        match self {
            WeightField::Good => totals.good,
            WeightField::FailGeneral => totals.fail_general,
            WeightField::FailOd => totals.fail_od,
            WeightField::FailBackward => totals.fail_backward,
            WeightField::NA => totals.n_a,
        }
    }
}

/// Category → label filter (`None` means no filter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    filters: BTreeMap<Category, Option<ResultLabel>>,
}

impl CategoryTable {
    pub fn filter_for(&self, category: Category) -> Option<ResultLabel> {
        self.filters.get(&category).copied().flatten()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let filters = [
            (Category::Inspected, None),
            (Category::Good, Some(ResultLabel::Good)),
            (Category::Fail, Some(ResultLabel::Fail)),
            (Category::FailOd, Some(ResultLabel::FailOdEnvelope)),
            (Category::FailBackward, Some(ResultLabel::Backwards)),
            (Category::FailNa, Some(ResultLabel::NotAvailable)),
        ]
        .into_iter()
        .collect();
        Self { filters }
    }
}

/// Result label → weight column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightTable {
    fields: BTreeMap<ResultLabel, WeightField>,
}

impl WeightTable {
    pub fn field_for(&self, label: ResultLabel) -> Option<WeightField> {
        self.fields.get(&label).copied()
    }

    /// Population of `label` within the given totals
    pub fn weight(&self, label: ResultLabel, totals: &SegmentTotals) -> u64 {
        self.field_for(label).map(|f| f.read(totals)).unwrap_or(0)
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        let fields = [
            (ResultLabel::Good, WeightField::Good),
            (ResultLabel::Fail, WeightField::FailGeneral),
            (ResultLabel::FailOdEnvelope, WeightField::FailOd),
            (ResultLabel::Backwards, WeightField::FailBackward),
            (ResultLabel::NotAvailable, WeightField::NA),
        ]
        .into_iter()
        .collect();
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("good".parse::<Category>().unwrap(), Category::Good);
        assert_eq!("fail-od".parse::<Category>().unwrap(), Category::FailOd);
        assert_eq!("all".parse::<Category>().unwrap(), Category::Inspected);
        assert!(matches!(
            "scrap".parse::<Category>(),
            Err(AggregateError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_result_label_variants() {
        assert_eq!(ResultLabel::parse("Good"), Some(ResultLabel::Good));
        assert_eq!(
            ResultLabel::parse("Fail - OD Envelope"),
            Some(ResultLabel::FailOdEnvelope)
        );
        assert_eq!(
            ResultLabel::parse("Fail-OD-Envelope"),
            Some(ResultLabel::FailOdEnvelope)
        );
        assert_eq!(ResultLabel::parse("backwards"), Some(ResultLabel::Backwards));
        assert_eq!(ResultLabel::parse("N/A"), Some(ResultLabel::NotAvailable));
        assert_eq!(ResultLabel::parse("Rework"), None);
    }

    #[test]
    fn test_canonical_labels_round_trip_through_parse() {
        for label in ResultLabel::all() {
            assert_eq!(ResultLabel::parse(label.as_str()), Some(*label));
        }
    }

    #[test]
    fn test_category_table_defaults() {
        let table = CategoryTable::default();
        assert_eq!(table.filter_for(Category::Inspected), None);
        assert_eq!(
            table.filter_for(Category::FailBackward),
            Some(ResultLabel::Backwards)
        );
        assert_eq!(
            table.filter_for(Category::FailNa),
            Some(ResultLabel::NotAvailable)
        );
    }

    #[test]
    fn test_weight_table_reads_matching_column() {
        let totals = SegmentTotals {
            good: 50,
            fail_general: 4,
            fail_od: 3,
            fail_backward: 2,
            n_a: 1,
            ..SegmentTotals::new("B1", Some("1"))
        };
        let table = WeightTable::default();
        assert_eq!(table.weight(ResultLabel::Good, &totals), 50);
        assert_eq!(table.weight(ResultLabel::Fail, &totals), 4);
        assert_eq!(table.weight(ResultLabel::FailOdEnvelope, &totals), 3);
        assert_eq!(table.weight(ResultLabel::Backwards, &totals), 2);
        assert_eq!(table.weight(ResultLabel::NotAvailable, &totals), 1);
    }
}
