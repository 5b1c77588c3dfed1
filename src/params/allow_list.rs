//! Allow-list and normalization rules for Quick Stats query parameters.
//!
//! Every accepted key is described by one `KeySpec` row. The sanitizer walks
//! this table instead of branching on individual keys, so adding a key or
//! changing its policy is a one-line edit here.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Query parameter keys accepted by the Quick Stats API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    CommodityDesc,
    ClassDesc,
    ProdnPracticeDesc,
    UtilPracticeDesc,
    StatisticcatDesc,
    UnitDesc,
    SectorDesc,
    GroupDesc,
    DomainDesc,
    DomaincatDesc,
    AggLevelDesc,
    StateAlpha,
    StateName,
    CountyAnsi,
    CountyName,
    Year,
    SourceDesc,
    FreqDesc,
    ReferencePeriodDesc,
    ShortDesc,
}

/// Whether a key may carry more than one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Scalar,
    Collection,
}

/// How each string value of a key is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Trim only.
    Text,
    /// Trim and uppercase.
    Upper,
    /// Trim, keep exactly four ASCII digits, sort ascending.
    Year,
    /// Trim, uppercase, translate to a state code written under `state_alpha`.
    StateName,
}

#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub key: ParamKey,
    pub multiplicity: Multiplicity,
    pub rule: ValueRule,
}

const fn spec(key: ParamKey, multiplicity: Multiplicity, rule: ValueRule) -> KeySpec {
    KeySpec { key, multiplicity, rule }
}

use Multiplicity::{Collection, Scalar};
use ValueRule::{StateName, Text, Upper, Year};

pub const ALLOW_LIST: [KeySpec; 20] = [
    spec(ParamKey::CommodityDesc, Scalar, Upper),
    spec(ParamKey::ClassDesc, Collection, Text),
    spec(ParamKey::ProdnPracticeDesc, Scalar, Text),
    spec(ParamKey::UtilPracticeDesc, Scalar, Text),
    spec(ParamKey::StatisticcatDesc, Scalar, Upper),
    spec(ParamKey::UnitDesc, Scalar, Text),
    spec(ParamKey::SectorDesc, Scalar, Text),
    spec(ParamKey::GroupDesc, Scalar, Text),
    spec(ParamKey::DomainDesc, Scalar, Text),
    spec(ParamKey::DomaincatDesc, Scalar, Text),
    spec(ParamKey::AggLevelDesc, Scalar, Text),
    spec(ParamKey::StateAlpha, Collection, Upper),
    spec(ParamKey::StateName, Collection, StateName),
    spec(ParamKey::CountyAnsi, Collection, Text),
    spec(ParamKey::CountyName, Collection, Text),
    spec(ParamKey::Year, Collection, Year),
    spec(ParamKey::SourceDesc, Scalar, Text),
    spec(ParamKey::FreqDesc, Collection, Text),
    spec(ParamKey::ReferencePeriodDesc, Scalar, Text),
    spec(ParamKey::ShortDesc, Collection, Text),
];

impl ParamKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::CommodityDesc => "commodity_desc",
            ParamKey::ClassDesc => "class_desc",
            ParamKey::ProdnPracticeDesc => "prodn_practice_desc",
            ParamKey::UtilPracticeDesc => "util_practice_desc",
            ParamKey::StatisticcatDesc => "statisticcat_desc",
            ParamKey::UnitDesc => "unit_desc",
            ParamKey::SectorDesc => "sector_desc",
            ParamKey::GroupDesc => "group_desc",
            ParamKey::DomainDesc => "domain_desc",
            ParamKey::DomaincatDesc => "domaincat_desc",
            ParamKey::AggLevelDesc => "agg_level_desc",
            ParamKey::StateAlpha => "state_alpha",
            ParamKey::StateName => "state_name",
            ParamKey::CountyAnsi => "county_ansi",
            ParamKey::CountyName => "county_name",
            ParamKey::Year => "year",
            ParamKey::SourceDesc => "source_desc",
            ParamKey::FreqDesc => "freq_desc",
            ParamKey::ReferencePeriodDesc => "reference_period_desc",
            ParamKey::ShortDesc => "short_desc",
        }
    }

    /// Look up an allow-listed key by its wire name. Matching is exact.
    pub fn from_name(name: &str) -> Option<ParamKey> {
        ALLOW_LIST.iter().map(|s| s.key).find(|k| k.as_str() == name)
    }

    pub fn spec(&self) -> KeySpec {
        // ALLOW_LIST holds one row per variant.
        ALLOW_LIST
            .iter()
            .copied()
            .find(|s| s.key == *self)
            .unwrap_or(KeySpec { key: *self, multiplicity: Scalar, rule: Text })
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire names of every allow-listed key, in table order.
pub fn allowed_key_names() -> Vec<&'static str> {
    ALLOW_LIST.iter().map(|s| s.key.as_str()).collect()
}

const STATES: [(&str, &str); 51] = [
    ("ALABAMA", "AL"),
    ("ALASKA", "AK"),
    ("ARIZONA", "AZ"),
    ("ARKANSAS", "AR"),
    ("CALIFORNIA", "CA"),
    ("COLORADO", "CO"),
    ("CONNECTICUT", "CT"),
    ("DELAWARE", "DE"),
    ("DISTRICT OF COLUMBIA", "DC"),
    ("FLORIDA", "FL"),
    ("GEORGIA", "GA"),
    ("HAWAII", "HI"),
    ("IDAHO", "ID"),
    ("ILLINOIS", "IL"),
    ("INDIANA", "IN"),
    ("IOWA", "IA"),
    ("KANSAS", "KS"),
    ("KENTUCKY", "KY"),
    ("LOUISIANA", "LA"),
    ("MAINE", "ME"),
    ("MARYLAND", "MD"),
    ("MASSACHUSETTS", "MA"),
    ("MICHIGAN", "MI"),
    ("MINNESOTA", "MN"),
    ("MISSISSIPPI", "MS"),
    ("MISSOURI", "MO"),
    ("MONTANA", "MT"),
    ("NEBRASKA", "NE"),
    ("NEVADA", "NV"),
    ("NEW HAMPSHIRE", "NH"),
    ("NEW JERSEY", "NJ"),
    ("NEW MEXICO", "NM"),
    ("NEW YORK", "NY"),
    ("NORTH CAROLINA", "NC"),
    ("NORTH DAKOTA", "ND"),
    ("OHIO", "OH"),
    ("OKLAHOMA", "OK"),
    ("OREGON", "OR"),
    ("PENNSYLVANIA", "PA"),
    ("RHODE ISLAND", "RI"),
    ("SOUTH CAROLINA", "SC"),
    ("SOUTH DAKOTA", "SD"),
    ("TENNESSEE", "TN"),
    ("TEXAS", "TX"),
    ("UTAH", "UT"),
    ("VERMONT", "VT"),
    ("VIRGINIA", "VA"),
    ("WASHINGTON", "WA"),
    ("WEST VIRGINIA", "WV"),
    ("WISCONSIN", "WI"),
    ("WYOMING", "WY"),
];

lazy_static! {
    static ref STATE_NAME_TO_ALPHA: HashMap<&'static str, &'static str> =
        STATES.iter().copied().collect();
}

/// Translate an uppercase full state name to its two-letter code.
pub fn state_alpha_for(name: &str) -> Option<&'static str> {
    STATE_NAME_TO_ALPHA.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_one_row() {
        for spec in ALLOW_LIST.iter() {
            let rows = ALLOW_LIST.iter().filter(|s| s.key == spec.key).count();
            assert_eq!(rows, 1, "{} listed {} times", spec.key, rows);
            assert_eq!(ParamKey::from_name(spec.key.as_str()), Some(spec.key));
        }
    }

    #[test]
    fn wire_names_match_serde() {
        for spec in ALLOW_LIST.iter() {
            let json = serde_json::to_string(&spec.key).unwrap();
            assert_eq!(json, format!("\"{}\"", spec.key.as_str()));
        }
    }

    #[test]
    fn unknown_and_miscased_keys_are_rejected() {
        assert_eq!(ParamKey::from_name("commodity"), None);
        assert_eq!(ParamKey::from_name("COMMODITY_DESC"), None);
        assert_eq!(ParamKey::from_name("key"), None);
    }

    #[test]
    fn collection_keys() {
        let collections: Vec<&str> = ALLOW_LIST
            .iter()
            .filter(|s| s.multiplicity == Multiplicity::Collection)
            .map(|s| s.key.as_str())
            .collect();
        assert_eq!(
            collections,
            vec![
                "class_desc",
                "state_alpha",
                "state_name",
                "county_ansi",
                "county_name",
                "year",
                "freq_desc",
                "short_desc",
            ]
        );
    }

    #[test]
    fn state_lookup() {
        assert_eq!(state_alpha_for("IOWA"), Some("IA"));
        assert_eq!(state_alpha_for("DISTRICT OF COLUMBIA"), Some("DC"));
        assert_eq!(state_alpha_for("Iowa"), None);
        assert_eq!(state_alpha_for("PUERTO RICO"), None);
    }
}
