//! Dataset model shared by extraction, reconciliation and the artifact

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::period::PeriodKey;

/// Breakdown group names stored next to the summary
pub mod groups {
    pub const WITHDRAWAL_METHODS: &str = "withdrawal-methods";
    pub const DEPOSIT_METHODS: &str = "deposit-methods";
    pub const BY_GAME: &str = "by-game";
    pub const BY_PROVIDER: &str = "by-provider";
    pub const BY_AFFILIATE: &str = "by-affiliate";
    pub const BY_CRYPTO_ASSET: &str = "by-crypto-asset";
}

/// Field name → value
pub type Fields = BTreeMap<String, f64>;

/// Row name (payment method, game, provider...) → fields
pub type Breakdown = BTreeMap<String, Fields>;

/// Metrics for one period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub summary: Fields,
    /// Optional breakdown groups keyed by group name
    #[serde(flatten)]
    pub breakdowns: BTreeMap<String, Breakdown>,
}

impl Record {
    pub fn with_summary(summary: Fields) -> Self {
        Self {
            summary,
            breakdowns: BTreeMap::new(),
        }
    }

    /// Add `value` to a summary field, starting from zero
    pub fn accumulate(&mut self, field: &str, value: f64) {
        *self.summary.entry(field.to_string()).or_insert(0.0) += value;
    }
}

/// Period key → record
pub type Dataset = BTreeMap<PeriodKey, Record>;

/// The four independently sourced datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetKind {
    /// Revenue workbook, unsuffixed sheets
    MotoAmuse,
    /// Revenue workbook, suffixed sheets
    Dsc,
    /// KPI workbook
    Sloten,
    /// Daily CSV feed
    Konibet,
}

impl DatasetKind {
    /// Emission order of the artifact
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::MotoAmuse,
        DatasetKind::Dsc,
        DatasetKind::Sloten,
        DatasetKind::Konibet,
    ];

    /// Constant name used in the artifact
    pub fn const_name(&self) -> &'static str {
        match self {
            DatasetKind::MotoAmuse => "MOTO_AMUSE_DATA",
            DatasetKind::Dsc => "DSC_DATA",
            DatasetKind::Sloten => "SLOTEN_DATA",
            DatasetKind::Konibet => "KONIBET_DATA",
        }
    }

    pub fn from_const_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.const_name() == name)
    }

    /// Human-readable label for console output
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::MotoAmuse => "元amuse",
            DatasetKind::Dsc => "DSC",
            DatasetKind::Sloten => "スロ天",
            DatasetKind::Konibet => "Konibet",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.const_name())
    }
}

/// One dataset per kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub moto_amuse: Dataset,
    pub dsc: Dataset,
    pub sloten: Dataset,
    pub konibet: Dataset,
}

impl Datasets {
    pub fn get(&self, kind: DatasetKind) -> &Dataset {
        match kind {
            DatasetKind::MotoAmuse => &self.moto_amuse,
            DatasetKind::Dsc => &self.dsc,
            DatasetKind::Sloten => &self.sloten,
            DatasetKind::Konibet => &self.konibet,
        }
    }

    pub fn get_mut(&mut self, kind: DatasetKind) -> &mut Dataset {
        match kind {
            DatasetKind::MotoAmuse => &mut self.moto_amuse,
            DatasetKind::Dsc => &mut self.dsc,
            DatasetKind::Sloten => &mut self.sloten,
            DatasetKind::Konibet => &mut self.konibet,
        }
    }

    /// Datasets in emission order
    pub fn iter(&self) -> impl Iterator<Item = (DatasetKind, &Dataset)> {
        DatasetKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, d)| d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_names_round_trip() {
        for kind in DatasetKind::ALL {
            assert_eq!(DatasetKind::from_const_name(kind.const_name()), Some(kind));
        }
        assert_eq!(DatasetKind::from_const_name("OTHER_DATA"), None);
    }

    #[test]
    fn test_record_serde_shape() {
        let mut record = Record::default();
        record.accumulate("deposits", 100.0);
        record.accumulate("deposits", 150.0);
        record.breakdowns.insert(
            groups::DEPOSIT_METHODS.to_string(),
            Breakdown::from([("Bank".to_string(), Fields::from([("total_count".to_string(), 3.0)]))]),
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["summary"]["deposits"], 250.0);
        assert_eq!(value["deposit-methods"]["Bank"]["total_count"], 3.0);

        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_without_summary_deserializes() {
        let value = serde_json::json!({ "by-game": { "Slots": { "ggr": 1.0 } } });
        let record: Record = serde_json::from_value(value).unwrap();
        assert!(record.summary.is_empty());
        assert_eq!(record.breakdowns[groups::BY_GAME]["Slots"]["ggr"], 1.0);
    }
}
