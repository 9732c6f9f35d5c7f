//! Static registry of the PubLog flat-file datasets.
//!
//! The catalog maps a logical table name to its source file and category,
//! and assigns names to the two load tiers. Logical names double as the
//! relation names in the store, so they are the only identifiers the rest of
//! the system ever interpolates into a statement.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Logical names of the tables the query services depend on.
pub mod tables {
    /// Contractor (CAGE) master records.
    pub const P_CAGE: &str = "P_CAGE";

    /// Federal Supply Classes.
    pub const V_H2_FSC: &str = "V_H2_FSC";

    /// Federal Supply Groups, keyed by class code.
    pub const V_H2_FSG: &str = "V_H2_FSG";

    /// Item Name Codes.
    pub const V_H6_NAME_INC: &str = "V_H6_NAME_INC";

    /// Stock numbers with item names and classes.
    pub const P_FLIS_NSN: &str = "P_FLIS_NSN";

    /// Broad stock number coverage with fewer descriptive fields.
    pub const FLISV: &str = "FLISV";

    /// Item identification records.
    pub const V_FLIS_IDENTIFICATION: &str = "V_FLIS_IDENTIFICATION";

    /// Management data per stock number.
    pub const V_FLIS_MANAGEMENT: &str = "V_FLIS_MANAGEMENT";

    /// Item characteristics per stock number.
    pub const V_CHARACTERISTICS: &str = "V_CHARACTERISTICS";
}

/// Dataset category, mirroring the on-disk directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Contractor and company data.
    Cage,
    /// Classification and reference data.
    HSeries,
    /// Stock number and item identification data.
    Identification,
    /// Pricing, units, and management data.
    Management,
    /// Freight and packaging data.
    FreightPackaging,
    /// Historical change records.
    History,
    /// Master requirement data.
    Mrd,
    /// Large standalone files at the top of the data directory.
    LargeFiles,
}

impl Category {
    /// The snake_case name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cage => "cage",
            Self::HSeries => "h_series",
            Self::Identification => "identification",
            Self::Management => "management",
            Self::FreightPackaging => "freight_packaging",
            Self::History => "history",
            Self::Mrd => "mrd",
            Self::LargeFiles => "large_files",
        }
    }

    /// Subdirectory of the data directory holding this category's files.
    #[must_use]
    pub const fn subdirectory(self) -> Option<&'static str> {
        match self {
            Self::Cage => Some("CAGE"),
            Self::HSeries => Some("H-SERIES"),
            Self::Identification => Some("IDENTIFICATION"),
            Self::Management => Some("MANAGEMENT"),
            Self::FreightPackaging => Some("FREIGHT_PACKAGING"),
            Self::History => Some("HISTORY"),
            Self::Mrd => Some("MRD"),
            Self::LargeFiles => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named load tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Small, frequently queried tables.
    Priority,
    /// Bulk tables, loaded after the priority tier.
    Large,
}

impl Tier {
    /// The lower-case name of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "priority" => Ok(Self::Priority),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// A single dataset known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Logical table name, unique across the catalog.
    pub logical_name: String,
    /// Path of the delimited source file.
    pub source_path: PathBuf,
    /// Dataset category.
    pub category: Category,
}

impl CatalogEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(
        logical_name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        category: Category,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            source_path: source_path.into(),
            category,
        }
    }
}

/// The immutable catalog of datasets and their tier assignments.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    priority: Vec<String>,
    large: Vec<String>,
}

impl Catalog {
    /// Build a catalog from explicit entries and tier lists.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a logical name is duplicated or not a
    /// plain identifier, if a tier references an unknown name, or if a name
    /// is placed in more than one tier slot.
    pub fn new(
        entries: Vec<CatalogEntry>,
        priority: Vec<String>,
        large: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            entries,
            priority,
            large,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The PubLog dataset layout rooted at `data_dir`.
    #[must_use]
    pub fn publog(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let entries = PUBLOG_FILES
            .iter()
            .map(|&(category, name, file)| {
                let dir = match category.subdirectory() {
                    Some(sub) => data_dir.join(sub),
                    None => data_dir.to_path_buf(),
                };
                CatalogEntry::new(name, dir.join(file), category)
            })
            .collect();

        Self {
            entries,
            priority: PRIORITY_TABLES.iter().map(ToString::to_string).collect(),
            large: LARGE_TABLES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Check the catalog invariants.
    ///
    /// # Errors
    ///
    /// See [`Catalog::new`].
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut names = HashSet::new();
        for entry in &self.entries {
            if !is_valid_name(&entry.logical_name) {
                return Err(CatalogError::InvalidName(entry.logical_name.clone()));
            }
            if !names.insert(entry.logical_name.to_ascii_uppercase()) {
                return Err(CatalogError::DuplicateName(entry.logical_name.clone()));
            }
        }

        let mut tiered = HashSet::new();
        for (tier, members) in [(Tier::Priority, &self.priority), (Tier::Large, &self.large)] {
            for name in members {
                let key = name.to_ascii_uppercase();
                if !names.contains(&key) {
                    return Err(CatalogError::UnknownTierMember {
                        tier,
                        name: name.clone(),
                    });
                }
                if !tiered.insert(key) {
                    return Err(CatalogError::MultipleTiers(name.clone()));
                }
            }
        }

        Ok(())
    }

    /// All entries in definition order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look up an entry by logical name, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.logical_name.eq_ignore_ascii_case(name))
    }

    /// Entries of a tier in tier order.
    #[must_use]
    pub fn tier(&self, tier: Tier) -> Vec<&CatalogEntry> {
        let members = match tier {
            Tier::Priority => &self.priority,
            Tier::Large => &self.large,
        };
        members.iter().filter_map(|name| self.get(name)).collect()
    }

    /// The tier a name belongs to, if any.
    #[must_use]
    pub fn tier_of(&self, name: &str) -> Option<Tier> {
        if self.priority.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            Some(Tier::Priority)
        } else if self.large.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            Some(Tier::Large)
        } else {
            None
        }
    }

    /// Entries that belong to neither tier, in definition order.
    pub fn untiered(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |e| self.tier_of(&e.logical_name).is_none())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Logical names become quoted identifiers; keep them to `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

const PUBLOG_FILES: &[(Category, &str, &str)] = &[
    (Category::Cage, "P_CAGE", "P_CAGE.CSV"),
    (Category::Cage, "V_CAGE_ADDRESS", "V_CAGE_ADDRESS.CSV"),
    (Category::Cage, "V_CAGE_STATUS_AND_TYPE", "V_CAGE_STATUS_AND_TYPE.CSV"),
    (Category::HSeries, "V_H2_FSC", "V_H2_FSC.CSV"),
    (Category::HSeries, "V_H2_FSG", "V_H2_FSG.CSV"),
    (Category::HSeries, "V_H3_AMMUNITION", "V_H3_AMMUNITION.CSV"),
    (Category::HSeries, "V_H5_BUSINESS", "V_H5_BUSINESS.CSV"),
    (Category::HSeries, "V_H5_CORPORATE", "V_H5_CORPORATE.CSV"),
    (Category::HSeries, "V_H5_DOMESTIC", "V_H5_DOMESTIC.CSV"),
    (Category::HSeries, "V_H5_FOREIGN", "V_H5_FOREIGN.CSV"),
    (Category::HSeries, "V_H6_NAME_INC", "V_H6_NAME_INC.CSV"),
    (Category::HSeries, "V_H6_MODIFIER", "V_H6_MODIFIER.CSV"),
    (Category::HSeries, "V_H6_RELATED", "V_H6_RELATED.CSV"),
    (Category::HSeries, "V_FSC_IMM", "V_FSC_IMM.CSV"),
    (Category::Identification, "P_FLIS_NSN", "P_FLIS_NSN.CSV"),
    (Category::Identification, "V_COLLOQUIAL_NAME", "V_COLLOQUIAL_NAME.CSV"),
    (Category::Identification, "V_FLIS_CANCELLED_NIIN", "V_FLIS_CANCELLED_NIIN.CSV"),
    (Category::Identification, "V_FLIS_IDENTIFICATION", "V_FLIS_IDENTIFICATION.CSV"),
    (Category::Identification, "V_FLIS_STANDARDIZATION", "V_FLIS_STANDARDIZATION.CSV"),
    (Category::Management, "V_FLIS_MANAGEMENT", "V_FLIS_MANAGEMENT.CSV"),
    (Category::Management, "V_FLIS_MANAGEMENT_FUTURE", "V_FLIS_MANAGEMENT_FUTURE.CSV"),
    (Category::Management, "V_FLIS_PHRASE", "V_FLIS_PHRASE.CSV"),
    (Category::Management, "V_MGMT_AIR_FORCE", "V_MGMT_AIR_FORCE.CSV"),
    (Category::Management, "V_MGMT_ARMY", "V_MGMT_ARMY.CSV"),
    (Category::Management, "V_MGMT_COAST_GUARD", "V_MGMT_COAST_GUARD.CSV"),
    (Category::Management, "V_MGMT_MARINE_CORPS", "V_MGMT_MARINE_CORPS.CSV"),
    (Category::Management, "V_MGMT_NAVY", "V_MGMT_NAVY.CSV"),
    (Category::Management, "V_SOCOM_MANAGEMENT", "V_SOCOM_MANAGEMENT.CSV"),
    (Category::FreightPackaging, "V_FREIGHT", "V_FREIGHT.CSV"),
    (Category::FreightPackaging, "V_FLIS_PACKAGING_1", "V_FLIS_PACKAGING_1.CSV"),
    (Category::FreightPackaging, "V_FLIS_PACKAGING_2", "V_FLIS_PACKAGING_2.CSV"),
    (Category::FreightPackaging, "V_FLIS_PACKAGING_3", "V_FLIS_PACKAGING_3.CSV"),
    (Category::History, "V_ITEM_IDENTIFICATION_HISTORY", "V_ITEM_IDENTIFICATION_HISTORY.CSV"),
    (Category::History, "V_MANAGEMENT_HISTORY", "V_MANAGEMENT_HISTORY.CSV"),
    (Category::History, "V_REFERENCE_NUMBER_HISTORY", "V_REFERENCE_NUMBER_HISTORY.CSV"),
    (Category::Mrd, "MRD0107", "MRD0107.CSV"),
    (Category::Mrd, "MRD0300", "MRD0300.CSV"),
    (Category::Mrd, "MRD0500", "MRD0500.CSV"),
    (Category::Mrd, "MRD06P1", "MRD06P1.CSV"),
    (Category::Mrd, "MRD06P2", "MRD06P2.CSV"),
    (Category::LargeFiles, "FLISV", "FLISV.CSV"),
    (Category::LargeFiles, "V_CHARACTERISTICS", "V_CHARACTERISTICS-2.CSV"),
    (Category::LargeFiles, "V_FLIS_PART", "V_FLIS_PART-2.CSV"),
    (Category::LargeFiles, "V_MOE_RULE", "V_MOE_RULE-2.CSV"),
];

const PRIORITY_TABLES: &[&str] = &[
    "P_CAGE",
    "V_H2_FSC",
    "V_H2_FSG",
    "V_H6_NAME_INC",
    "V_H6_MODIFIER",
    "V_FSC_IMM",
    "V_FLIS_CANCELLED_NIIN",
    "V_COLLOQUIAL_NAME",
    "V_FLIS_STANDARDIZATION",
    "V_H3_AMMUNITION",
    "V_H5_BUSINESS",
    "V_H5_CORPORATE",
    "V_H5_DOMESTIC",
    "V_H5_FOREIGN",
    "V_H6_RELATED",
    "V_FREIGHT",
    "V_FLIS_PACKAGING_1",
    "V_FLIS_PACKAGING_2",
    "V_FLIS_PACKAGING_3",
    "V_FLIS_PHRASE",
    "V_MGMT_AIR_FORCE",
    "V_MGMT_ARMY",
    "V_MGMT_COAST_GUARD",
    "V_MGMT_MARINE_CORPS",
    "V_MGMT_NAVY",
    "V_SOCOM_MANAGEMENT",
    "V_FLIS_MANAGEMENT_FUTURE",
];

const LARGE_TABLES: &[&str] = &[
    "FLISV",
    "V_CHARACTERISTICS",
    "V_FLIS_PART",
    "V_MOE_RULE",
    "V_FLIS_MANAGEMENT",
    "P_FLIS_NSN",
    "V_FLIS_IDENTIFICATION",
];
