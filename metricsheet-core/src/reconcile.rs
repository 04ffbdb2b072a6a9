//! Merge fresh extraction with the datasets of the previous artifact
//!
//! Fresh data always wins. Old data only fills what the fresh extraction
//! lacks: whole periods for every dataset, and for the KPI dataset the
//! breakdown groups no extractor produces.

use std::collections::BTreeMap;

use crate::artifact::PreviousDatasets;
use crate::config::ReconcileConfig;
use crate::dataset::{Dataset, DatasetKind, Datasets};
use crate::period::PeriodKey;

/// What reconciliation copied, per dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Periods taken over whole from the previous artifact
    pub filled_periods: BTreeMap<DatasetKind, Vec<PeriodKey>>,
    /// (period, group) pairs carried into fresh KPI records
    pub carried_groups: Vec<(PeriodKey, String)>,
    /// Datasets with no usable previous version
    pub unavailable: Vec<DatasetKind>,
}

impl ReconcileReport {
    pub fn filled_count(&self, kind: DatasetKind) -> usize {
        self.filled_periods.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

pub struct Reconciler {
    carry_forward: Vec<String>,
}

impl Reconciler {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            carry_forward: config.carry_forward.clone(),
        }
    }

    /// Merge `previous` into `fresh`. With no previous datasets this is a
    /// no-op.
    pub fn reconcile(&self, fresh: &mut Datasets, previous: Option<&PreviousDatasets>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for kind in DatasetKind::ALL {
            let Some(old) = previous.and_then(|p| p.get(kind)) else {
                report.unavailable.push(kind);
                continue;
            };

            let dataset = fresh.get_mut(kind);
            if kind == DatasetKind::Sloten {
                report.carried_groups = carry_forward_groups(dataset, old, &self.carry_forward);
            }

            let filled = fill_gaps(dataset, old);
            if !filled.is_empty() {
                log::info!("{}: restored {} periods from previous artifact", kind, filled.len());
                report.filled_periods.insert(kind, filled);
            }
        }

        report
    }
}

/// Copy every period of `old` that `fresh` lacks. Returns the copied keys.
pub fn fill_gaps(fresh: &mut Dataset, old: &Dataset) -> Vec<PeriodKey> {
    let mut filled = Vec::new();
    for (period, record) in old {
        if !fresh.contains_key(period) {
            fresh.insert(period.clone(), record.clone());
            filled.push(period.clone());
        }
    }
    filled
}

/// For periods present in both, copy the named breakdown groups that `old`
/// has and `fresh` lacks. Summary fields are never touched.
pub fn carry_forward_groups(fresh: &mut Dataset, old: &Dataset, groups: &[String]) -> Vec<(PeriodKey, String)> {
    let mut carried = Vec::new();
    for (period, record) in fresh.iter_mut() {
        let Some(old_record) = old.get(period) else {
            continue;
        };
        for group in groups {
            if record.breakdowns.contains_key(group) {
                continue;
            }
            if let Some(breakdown) = old_record.breakdowns.get(group) {
                record.breakdowns.insert(group.clone(), breakdown.clone());
                carried.push((period.clone(), group.clone()));
            }
        }
    }
    carried
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Breakdown, Fields, Record, groups};

    fn record(fields: &[(&str, f64)]) -> Record {
        Record::with_summary(fields.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    fn breakdown(name: &str, value: f64) -> Breakdown {
        Breakdown::from([(name.to_string(), Fields::from([("ggr".to_string(), value)]))])
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(&ReconcileConfig::default())
    }

    #[test]
    fn test_old_only_periods_are_filled() {
        let mut fresh = Datasets::default();
        fresh.dsc.insert("2024年1月".into(), record(&[("売上", 10.0)]));

        let mut previous = PreviousDatasets::default();
        previous.insert(
            DatasetKind::Dsc,
            Dataset::from([
                ("2023年12月".to_string(), record(&[("売上", 7.0)])),
                ("2024年1月".to_string(), record(&[("売上", 1.0), ("古い", 2.0)])),
            ]),
        );

        let report = reconciler().reconcile(&mut fresh, Some(&previous));

        assert_eq!(fresh.dsc["2023年12月"], record(&[("売上", 7.0)]));
        assert_eq!(fresh.dsc["2024年1月"], record(&[("売上", 10.0)]));
        assert_eq!(report.filled_count(DatasetKind::Dsc), 1);
        assert_eq!(report.unavailable.len(), 3);
    }

    #[test]
    fn test_empty_run_restores_everything() {
        let mut fresh = Datasets::default();
        let old = Dataset::from([("2023年12月".to_string(), record(&[("deposits", 5.0)]))]);
        let mut previous = PreviousDatasets::default();
        previous.insert(DatasetKind::Konibet, old.clone());

        reconciler().reconcile(&mut fresh, Some(&previous));

        assert_eq!(fresh.konibet, old);
    }

    #[test]
    fn test_kpi_groups_carried_but_summary_kept_fresh() {
        let mut fresh_record = record(&[("GGR", 100.0)]);
        fresh_record
            .breakdowns
            .insert(groups::BY_PROVIDER.into(), breakdown("Fresh Provider", 1.0));
        let mut fresh = Datasets::default();
        fresh.sloten.insert("2024年1月".into(), fresh_record);

        let mut old_record = record(&[("GGR", 1.0), ("Old Only", 2.0)]);
        old_record
            .breakdowns
            .insert(groups::BY_GAME.into(), breakdown("Slots", 50.0));
        old_record
            .breakdowns
            .insert(groups::BY_PROVIDER.into(), breakdown("Old Provider", 9.0));
        old_record
            .breakdowns
            .insert(groups::DEPOSIT_METHODS.into(), breakdown("Bank", 3.0));
        let mut previous = PreviousDatasets::default();
        previous.insert(
            DatasetKind::Sloten,
            Dataset::from([("2024年1月".to_string(), old_record)]),
        );

        let report = reconciler().reconcile(&mut fresh, Some(&previous));
        let merged = &fresh.sloten["2024年1月"];

        assert_eq!(merged.summary, record(&[("GGR", 100.0)]).summary);
        assert_eq!(merged.breakdowns[groups::BY_GAME], breakdown("Slots", 50.0));
        assert_eq!(merged.breakdowns[groups::BY_PROVIDER], breakdown("Fresh Provider", 1.0));
        assert!(!merged.breakdowns.contains_key(groups::DEPOSIT_METHODS));
        assert_eq!(
            report.carried_groups,
            vec![("2024年1月".to_string(), groups::BY_GAME.to_string())]
        );
    }

    #[test]
    fn test_groups_not_carried_for_other_datasets() {
        let mut fresh = Datasets::default();
        fresh.moto_amuse.insert("2024年1月".into(), record(&[("売上", 1.0)]));

        let mut old_record = record(&[("売上", 0.0)]);
        old_record
            .breakdowns
            .insert(groups::BY_GAME.into(), breakdown("Slots", 50.0));
        let mut previous = PreviousDatasets::default();
        previous.insert(
            DatasetKind::MotoAmuse,
            Dataset::from([("2024年1月".to_string(), old_record)]),
        );

        reconciler().reconcile(&mut fresh, Some(&previous));
        assert!(fresh.moto_amuse["2024年1月"].breakdowns.is_empty());
    }

    #[test]
    fn test_no_previous_is_noop() {
        let mut fresh = Datasets::default();
        fresh.konibet.insert("2024年3月".into(), record(&[("deposits", 250.0)]));
        let before = fresh.clone();

        let report = reconciler().reconcile(&mut fresh, None);

        assert_eq!(fresh, before);
        assert_eq!(report.unavailable, DatasetKind::ALL.to_vec());
    }

    #[test]
    fn test_reconcile_twice_is_stable() {
        let mut fresh = Datasets::default();
        fresh.sloten.insert("2024年2月".into(), record(&[("GGR", 3.0)]));
        let mut old_record = record(&[("GGR", 1.0)]);
        old_record
            .breakdowns
            .insert(groups::BY_AFFILIATE.into(), breakdown("aff-1", 4.0));
        let mut previous = PreviousDatasets::default();
        previous.insert(
            DatasetKind::Sloten,
            Dataset::from([
                ("2024年1月".to_string(), record(&[("GGR", 9.0)])),
                ("2024年2月".to_string(), old_record),
            ]),
        );

        let mut first = fresh.clone();
        reconciler().reconcile(&mut first, Some(&previous));

        let mut second_previous = PreviousDatasets::default();
        second_previous.insert(DatasetKind::Sloten, first.sloten.clone());
        let mut second = fresh;
        reconciler().reconcile(&mut second, Some(&second_previous));

        assert_eq!(first, second);
    }
}
