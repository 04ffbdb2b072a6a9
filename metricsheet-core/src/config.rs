//! Configuration system for sources, layouts and output

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::groups;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsheetConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub revenue: RevenueConfig,
    #[serde(default)]
    pub kpi: KpiConfig,
    #[serde(default)]
    pub daily: DailyConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl MetricsheetConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MetricsheetConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject layouts the extractors cannot work with
    pub fn validate(&self) -> Result<()> {
        for (source, patterns) in [
            ("revenue", &self.revenue.patterns),
            ("kpi", &self.kpi.patterns),
            ("daily", &self.daily.patterns),
        ] {
            if patterns.iter().any(|p| p.trim().is_empty()) {
                anyhow::bail!("Configuration error: empty file pattern in [{}] patterns", source);
            }
        }

        if self.revenue.sheet_marker.is_empty() {
            anyhow::bail!("Configuration error: [revenue] sheet_marker must not be empty");
        }

        let kpi = &self.kpi;
        if kpi.first_row == 0 || kpi.last_row < kpi.first_row {
            anyhow::bail!(
                "Configuration error: [kpi] scan range {}..={} is empty or not 1-based",
                kpi.first_row,
                kpi.last_row
            );
        }
        for (label, row) in &kpi.pinned_labels {
            if *row == 0 {
                anyhow::bail!("Configuration error: [kpi] pinned label '{}' has row 0", label);
            }
        }
        for (name, table) in [
            ("withdrawal_methods", &kpi.withdrawal_methods),
            ("deposit_methods", &kpi.deposit_methods),
        ] {
            if table.first_row == 0 || table.last_row < table.first_row {
                anyhow::bail!(
                    "Configuration error: [kpi.{}] rows {}..={} are empty or not 1-based",
                    name,
                    table.first_row,
                    table.last_row
                );
            }
        }
        for ratio in &kpi.ratios {
            if ratio.name.is_empty() || ratio.numerator.is_empty() || ratio.denominator.is_empty() {
                anyhow::bail!("Configuration error: [[kpi.ratios]] entries need name, numerator and denominator");
            }
        }

        Ok(())
    }
}

/// Where sources are read from and the artifact is written to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output: default_output(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output() -> PathBuf {
    PathBuf::from("data.js")
}

/// Revenue workbook layout. Columns are 0-based (A = 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueConfig {
    pub patterns: Vec<String>,
    /// Sheets whose name contains this are data sheets
    pub sheet_marker: String,
    /// Sheet-name suffix routing a sheet to the DSC dataset
    pub suffix: String,
    pub label_column: u32,
    pub value_column: u32,
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["*SAM*.xlsx".to_string(), "収益管理*.xlsx".to_string()],
            sheet_marker: "収益".to_string(),
            suffix: "D".to_string(),
            label_column: 1,
            value_column: 2,
        }
    }
}

/// KPI workbook layout. Rows are 1-based as shown in a spreadsheet,
/// columns 0-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    pub patterns: Vec<String>,
    pub first_row: u32,
    pub last_row: u32,
    pub label_column: u32,
    pub value_column: u32,
    /// Labels accepted only at the given row
    pub pinned_labels: BTreeMap<String, u32>,
    /// Labels starting with any of these are rejected
    pub rejected_prefixes: Vec<String>,
    pub ratios: Vec<RatioConfig>,
    pub placeholder: PlaceholderConfig,
    pub withdrawal_methods: MethodTableConfig,
    pub deposit_methods: MethodTableConfig,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["*スロ天*.xlsx".to_string(), "*KPI*.xlsx".to_string()],
            first_row: 1,
            last_row: 200,
            label_column: 0,
            value_column: 1,
            pinned_labels: BTreeMap::from([("GGR".to_string(), 9)]),
            rejected_prefixes: vec!["0.".to_string()],
            ratios: vec![
                RatioConfig {
                    name: "ARPU".to_string(),
                    numerator: "GGR".to_string(),
                    denominator: "Active Users".to_string(),
                },
                RatioConfig {
                    name: "Deposit per User".to_string(),
                    numerator: "Deposits".to_string(),
                    denominator: "Active Users".to_string(),
                },
            ],
            placeholder: PlaceholderConfig::default(),
            withdrawal_methods: MethodTableConfig {
                first_row: 205,
                last_row: 214,
            },
            deposit_methods: MethodTableConfig {
                first_row: 218,
                last_row: 227,
            },
        }
    }
}

/// Derived `numerator / denominator` summary field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatioConfig {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

/// Constant summary field standing in for a metric with no source yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    pub name: String,
    pub value: f64,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            name: "CVR".to_string(),
            value: 5.0,
        }
    }
}

/// Payment-method table: name in column A, then total amount, total count,
/// average amount and median in B..E. Rows are 1-based and inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodTableConfig {
    pub first_row: u32,
    pub last_row: u32,
}

/// Daily CSV feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyConfig {
    pub patterns: Vec<String>,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["*日报*.csv".to_string(), "*データ総和*.csv".to_string()],
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// KPI breakdown groups copied from the previous artifact when the fresh
    /// record lacks them
    pub carry_forward: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            carry_forward: vec![
                groups::BY_GAME.to_string(),
                groups::BY_PROVIDER.to_string(),
                groups::BY_AFFILIATE.to_string(),
                groups::BY_CRYPTO_ASSET.to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: MetricsheetConfig = toml::from_str("").unwrap();
        assert_eq!(config.paths.output, PathBuf::from("data.js"));
        assert_eq!(config.revenue.sheet_marker, "収益");
        assert_eq!(config.kpi.last_row, 200);
        assert_eq!(config.kpi.pinned_labels.get("GGR"), Some(&9));
        assert_eq!(config.reconcile.carry_forward.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: MetricsheetConfig = toml::from_str(
            r#"
            [paths]
            output = "public/data.js"

            [kpi]
            last_row = 120

            [kpi.placeholder]
            name = "Conversion"
            value = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.data_dir, PathBuf::from("data"));
        assert_eq!(config.paths.output, PathBuf::from("public/data.js"));
        assert_eq!(config.kpi.first_row, 1);
        assert_eq!(config.kpi.last_row, 120);
        assert_eq!(config.kpi.placeholder.name, "Conversion");
        assert_eq!(config.kpi.ratios.len(), 2);
    }

    #[test]
    fn test_validation() {
        let config = MetricsheetConfig::default();
        assert!(config.validate().is_ok());

        let mut bad_config = config.clone();
        bad_config.kpi.last_row = 0;
        assert!(bad_config.validate().is_err());

        let mut bad_config = config.clone();
        bad_config.daily.patterns.push(" ".to_string());
        assert!(bad_config.validate().is_err());

        let mut bad_config = config.clone();
        bad_config.kpi.pinned_labels.insert("GGR".to_string(), 0);
        assert!(bad_config.validate().is_err());

        let mut bad_config = config.clone();
        bad_config.kpi.deposit_methods.first_row = 300;
        assert!(bad_config.validate().is_err());

        let mut bad_config = config;
        bad_config.revenue.sheet_marker.clear();
        assert!(bad_config.validate().is_err());
    }
}
