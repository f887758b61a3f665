//! Field catalog - which inspection fields each station domain reports
//!
//! The catalog is a fixed, versioned table of field descriptors. Every
//! measurement field belongs to exactly one domain and is either a per-unit
//! mean (weighted by its occurrence count) or a pass-rate percentage
//! (weighted by the population of its result label).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::AggregateError;
use crate::core::records::RecordKind;

/// Bumped whenever a field is added, removed or relabelled
pub const CATALOG_VERSION: u32 = 1;

/// Physical-inspection station grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Round,
    Flat,
    Dimension,
    Cosmetic,
}

impl Domain {
    /// All domains in report order
    pub fn all() -> &'static [Domain] {
        &[
            Domain::Round,
            Domain::Flat,
            Domain::Dimension,
            Domain::Cosmetic,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Round => "round",
            Domain::Flat => "flat",
            Domain::Dimension => "dimension",
            Domain::Cosmetic => "cosmetic",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "round" => Ok(Domain::Round),
            "flat" => Ok(Domain::Flat),
            "dimension" => Ok(Domain::Dimension),
            "cosmetic" => Ok(Domain::Cosmetic),
            _ => Err(AggregateError::UnknownDomain(s.to_string())),
        }
    }
}

/// How a field participates in aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Per-unit measurement mean, weighted by the paired occurrence count
    Mean,
    /// Pass percentage, weighted by the result-label population
    Test,
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
}

const fn mean(name: &'static str, label: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: FieldKind::Mean,
        label,
    }
}

const fn test(name: &'static str, label: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: FieldKind::Test,
        label,
    }
}

// Descriptor order is display order within each kind.

static ROUND: &[FieldDescriptor] = &[
    mean("round_inner_bright_area", "Bright - Inner"),
    mean("round_outer_bright_area", "Bright - Outer"),
    mean("round_inner_small_dark_area", "Small Dark - Inner"),
    mean("round_outer_small_dark_area", "Small Dark - Outer"),
    mean("round_inner_large_dark_area", "Large Dark - Inner"),
    mean("round_outer_large_dark_area", "Large Dark - Outer"),
    test("round_end", "Station"),
    test("round_valid_master", "Valid - Master"),
    test("round_valid", "Valid"),
    test("round_present", "Present"),
    test("round_orientation", "Orientation"),
    test("round_inner_bright", "Bright - Inner"),
    test("round_outer_bright", "Bright - Outer"),
    test("round_inner_small_dark", "Small Dark - Inner"),
    test("round_outer_small_dark", "Small Dark - Outer"),
    test("round_inner_large_dark", "Large Dark - Inner"),
    test("round_outer_large_dark", "Large Dark - Outer"),
];

static FLAT: &[FieldDescriptor] = &[
    mean("flat_inner_diameter_min", "ID - Min"),
    mean("flat_inner_diameter_max", "ID - Max"),
    mean("flat_obstruction_area", "Obstruction Area"),
    mean("flat_chip_area", "Chip Area"),
    test("flat_end", "Station"),
    test("flat_valid_master", "Valid - Master"),
    test("flat_orientation", "Orientation"),
    test("flat_valid", "Valid"),
    test("flat_ID", "ID"),
    test("flat_obstruction", "Obstruction"),
    test("flat_chip", "Chip"),
];

static DIMENSION: &[FieldDescriptor] = &[
    mean("dimension_envelope_mm", "Envelope"),
    mean("dimension_median_od", "OD - Median"),
    mean("dimension_bump_max", "Bump - Max"),
    mean("dimension_chip_max", "Chip - Max"),
    mean("dimension_nose_min_max", "Nose - Min/Max"),
    mean("dimension_length_mm", "Length"),
    test("outer_dimension", "Station"),
    test("dimension_position", "Position"),
    test("dimension_length", "Length"),
    test("dimension_bumps", "Bumps"),
    test("dimension_chips", "Chips"),
    test("dimension_envelope", "Envelope"),
    test("dimension_nose", "Nose"),
];

static COSMETIC: &[FieldDescriptor] = &[
    mean("sepia_bright_area", "Bright Area"),
    mean("sepia_blemish_area", "Blemish Area"),
    mean("sepia_spot_crack_area", "Crack Area"),
    test("sepia_screen", "Station"),
    test("sepia_valid", "Valid"),
    test("sepia_bright_spot", "Bright Spot"),
    test("sepia_blemish", "Blemish"),
    test("sepia_spot_crack", "Crack"),
];

/// Field lists for a single domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainFields {
    pub domain: Domain,
    descriptors: &'static [FieldDescriptor],
}

impl DomainFields {
    /// Mean-aggregated field names in display order
    pub fn mean_fields(&self) -> Vec<&'static str> {
        self.of_kind(FieldKind::Mean)
    }

    /// Pass-rate field names in display order
    pub fn test_fields(&self) -> Vec<&'static str> {
        self.of_kind(FieldKind::Test)
    }

    /// Field name to display label
    pub fn labels(&self) -> BTreeMap<&'static str, &'static str> {
        self.descriptors.iter().map(|d| (d.name, d.label)).collect()
    }

    /// Display label for one field of this domain
    pub fn label(&self, field: &str) -> Option<&'static str> {
        self.descriptors
            .iter()
            .find(|d| d.name == field)
            .map(|d| d.label)
    }

    pub fn descriptors(&self) -> &'static [FieldDescriptor] {
        self.descriptors
    }

    fn of_kind(&self, kind: FieldKind) -> Vec<&'static str> {
        self.descriptors
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.name)
            .collect()
    }
}

/// Immutable catalog of every reportable field
#[derive(Debug, Clone, Copy)]
pub struct FieldCatalog {
    version: u32,
}

impl FieldCatalog {
    /// The built-in station catalog
    pub const fn standard() -> Self {
        Self {
            version: CATALOG_VERSION,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Look up the field lists for a domain
    pub fn fields_for(&self, domain: Domain) -> DomainFields {
        let descriptors = match domain {
            Domain::Round => ROUND,
            Domain::Flat => FLAT,
            Domain::Dimension => DIMENSION,
            Domain::Cosmetic => COSMETIC,
        };
        DomainFields { domain, descriptors }
    }

    /// Look up the field lists for a domain given by name
    pub fn fields_for_name(&self, domain: &str) -> Result<DomainFields, AggregateError> {
        Ok(self.fields_for(domain.parse()?))
    }

    /// Every descriptor across all domains
    pub fn descriptors(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        [ROUND, FLAT, DIMENSION, COSMETIC].into_iter().flatten()
    }

    /// Every mean field across all domains
    pub fn mean_fields(&self) -> Vec<&'static str> {
        self.names_of_kind(FieldKind::Mean)
    }

    /// Every pass-rate field across all domains
    pub fn test_fields(&self) -> Vec<&'static str> {
        self.names_of_kind(FieldKind::Test)
    }

    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.descriptors().find(|d| d.name == field).map(|d| d.kind)
    }

    /// Reject a field that the given record kind cannot carry
    ///
    /// Count and mean records carry mean fields; pass-rate records carry
    /// test fields.
    pub fn check_field(&self, field: &str, record: RecordKind) -> Result<(), AggregateError> {
        let expected = match record {
            RecordKind::Count | RecordKind::Mean => FieldKind::Mean,
            RecordKind::PassRate => FieldKind::Test,
        };
        match self.kind_of(field) {
            Some(kind) if kind == expected => Ok(()),
            _ => Err(AggregateError::UnknownField {
                field: field.to_string(),
                kind: record,
            }),
        }
    }

    fn names_of_kind(&self, kind: FieldKind) -> Vec<&'static str> {
        self.descriptors()
            .filter(|d| d.kind == kind)
            .map(|d| d.name)
            .collect()
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
