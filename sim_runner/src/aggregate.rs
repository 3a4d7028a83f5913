//! Cross-iteration statistics
//!
//! Everything here is built from sums, sums of squares and extrema, so two
//! aggregates merge associatively and the result does not depend on the
//! order iterations finished in (up to floating-point rounding).

use combat_core::metrics::{IterationMetrics, UnitMetrics};
use combat_core::types::{Outcome, SpellSchool, UnitKind};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};

/// Running distribution of one per-iteration value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistributionMetrics {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionMetrics {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn merge(&mut self, other: &DistributionMetrics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Population standard deviation
    pub fn stdev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0).sqrt()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            mean: self.mean(),
            stdev: self.stdev(),
            min: self.min,
            max: self.max,
        }
    }
}

/// Finished view of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpellAggregate {
    pub label: String,
    pub school: SpellSchool,
    pub casts: DistributionMetrics,
    pub damage: DistributionMetrics,
    pub healing: DistributionMetrics,
    pub threat: DistributionMetrics,
    pub outcomes: [u64; Outcome::COUNT],
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuraAggregate {
    pub label: String,
    /// Uptime as a fraction of the iteration
    pub uptime: DistributionMetrics,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceAggregate {
    pub gained: DistributionMetrics,
    pub wasted: DistributionMetrics,
    pub spent: DistributionMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitAggregate {
    pub label: String,
    pub kind: UnitKind,
    pub dps: DistributionMetrics,
    pub hps: DistributionMetrics,
    pub tps: DistributionMetrics,
    pub spells: Vec<SpellAggregate>,
    pub auras: Vec<AuraAggregate>,
    pub resource: Option<ResourceAggregate>,
}

impl UnitAggregate {
    fn empty(unit: &UnitMetrics) -> Self {
        UnitAggregate {
            label: unit.label.clone(),
            kind: unit.kind,
            dps: DistributionMetrics::default(),
            hps: DistributionMetrics::default(),
            tps: DistributionMetrics::default(),
            spells: unit
                .spells
                .iter()
                .map(|s| SpellAggregate {
                    label: s.label.clone(),
                    school: s.school,
                    ..Default::default()
                })
                .collect(),
            auras: unit
                .auras
                .iter()
                .map(|a| AuraAggregate {
                    label: a.label.clone(),
                    ..Default::default()
                })
                .collect(),
            resource: unit.resource.as_ref().map(|_| ResourceAggregate::default()),
        }
    }

    fn add(&mut self, unit: &UnitMetrics, duration_secs: f64) {
        let per_sec = |v: f64| if duration_secs > 0.0 { v / duration_secs } else { 0.0 };
        self.dps.add(per_sec(unit.damage_dealt()));
        self.hps.add(per_sec(unit.healing_dealt()));
        self.tps.add(per_sec(unit.threat()));

        for (agg, spell) in self.spells.iter_mut().zip(&unit.spells) {
            let total = spell.total();
            agg.casts.add(f64::from(spell.casts));
            agg.damage.add(total.damage);
            agg.healing.add(total.healing);
            agg.threat.add(total.threat);
            for (sum, n) in agg.outcomes.iter_mut().zip(total.outcomes) {
                *sum += u64::from(n);
            }
        }
        for (agg, aura) in self.auras.iter_mut().zip(&unit.auras) {
            agg.uptime.add(per_sec(aura.uptime_secs));
        }
        if let (Some(agg), Some(resource)) = (self.resource.as_mut(), unit.resource.as_ref()) {
            agg.gained.add(resource.total_gained());
            agg.wasted.add(resource.total_wasted());
            agg.spent.add(resource.total_spent());
        }
    }

    fn merge(&mut self, other: &UnitAggregate) {
        self.dps.merge(&other.dps);
        self.hps.merge(&other.hps);
        self.tps.merge(&other.tps);
        for (a, b) in self.spells.iter_mut().zip(&other.spells) {
            a.casts.merge(&b.casts);
            a.damage.merge(&b.damage);
            a.healing.merge(&b.healing);
            a.threat.merge(&b.threat);
            for (x, y) in a.outcomes.iter_mut().zip(b.outcomes) {
                *x += y;
            }
        }
        for (a, b) in self.auras.iter_mut().zip(&other.auras) {
            a.uptime.merge(&b.uptime);
        }
        if let (Some(a), Some(b)) = (self.resource.as_mut(), other.resource.as_ref()) {
            a.gained.merge(&b.gained);
            a.wasted.merge(&b.wasted);
            a.spent.merge(&b.spent);
        }
    }
}

/// Accumulator over any number of iterations
///
/// Every iteration of one run has the same units, spells and auras in the
/// same order; the layout is taken from the first iteration added.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
    pub iterations: u64,
    pub duration: DistributionMetrics,
    pub encounter_damage: DistributionMetrics,
    pub units: Vec<UnitAggregate>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, metrics: &IterationMetrics) {
        if self.units.is_empty() {
            self.units = metrics.units.iter().map(UnitAggregate::empty).collect();
        }
        self.iterations += 1;
        self.duration.add(metrics.duration_secs);
        self.encounter_damage.add(metrics.encounter_damage);
        for (agg, unit) in self.units.iter_mut().zip(&metrics.units) {
            agg.add(unit, metrics.duration_secs);
        }
    }

    pub fn merge(&mut self, other: &Aggregate) {
        if other.iterations == 0 {
            return;
        }
        if self.iterations == 0 {
            *self = other.clone();
            return;
        }
        self.iterations += other.iterations;
        self.duration.merge(&other.duration);
        self.encounter_damage.merge(&other.encounter_damage);
        for (a, b) in self.units.iter_mut().zip(&other.units) {
            a.merge(b);
        }
    }

    pub fn report(&self, seed: u64) -> AggregateReport {
        AggregateReport {
            iterations: self.iterations,
            seed,
            duration: self.duration.summary(),
            encounter_damage: self.encounter_damage.summary(),
            units: self
                .units
                .iter()
                .map(|u| UnitReport {
                    label: u.label.clone(),
                    kind: u.kind,
                    dps: u.dps.summary(),
                    hps: u.hps.summary(),
                    tps: u.tps.summary(),
                    spells: u
                        .spells
                        .iter()
                        .map(|s| SpellReport {
                            label: s.label.clone(),
                            school: s.school,
                            casts: s.casts.mean(),
                            damage: s.damage.summary(),
                            healing: s.healing.summary(),
                            threat: s.threat.mean(),
                            outcomes: Outcome::iter()
                                .map(|o| (o.to_string(), s.outcomes[o.index()]))
                                .filter(|(_, n)| *n > 0)
                                .collect(),
                        })
                        .collect(),
                    auras: u
                        .auras
                        .iter()
                        .map(|a| AuraReport {
                            label: a.label.clone(),
                            uptime: a.uptime.mean(),
                        })
                        .collect(),
                    resource: u.resource.as_ref().map(|r| ResourceReport {
                        gained: r.gained.mean(),
                        wasted: r.wasted.mean(),
                        spent: r.spent.mean(),
                    }),
                })
                .collect(),
        }
    }
}

/// Serializable result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub iterations: u64,
    pub seed: u64,
    pub duration: Summary,
    pub encounter_damage: Summary,
    pub units: Vec<UnitReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub label: String,
    pub kind: UnitKind,
    pub dps: Summary,
    pub hps: Summary,
    pub tps: Summary,
    pub spells: Vec<SpellReport>,
    pub auras: Vec<AuraReport>,
    pub resource: Option<ResourceReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellReport {
    pub label: String,
    pub school: SpellSchool,
    /// Mean casts per iteration
    pub casts: f64,
    pub damage: Summary,
    pub healing: Summary,
    /// Mean threat per iteration
    pub threat: f64,
    /// Outcome name to total count over all iterations
    pub outcomes: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraReport {
    pub label: String,
    /// Mean uptime fraction
    pub uptime: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub gained: f64,
    pub wasted: f64,
    pub spent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::metrics::{AuraMetrics, SpellMetrics, TargetMetrics};
    use proptest::prelude::*;

    fn iteration(seed: u64, damage: f64, duration: f64) -> IterationMetrics {
        let mut target = TargetMetrics {
            events: 2,
            damage,
            threat: damage * 2.0,
            ..Default::default()
        };
        target.outcomes[Outcome::Hit.index()] = 1;
        target.outcomes[Outcome::Crit.index()] = 1;
        IterationMetrics {
            seed,
            duration_secs: duration,
            encounter_damage: damage,
            units: vec![UnitMetrics {
                label: "mage".into(),
                kind: UnitKind::Player,
                spells: vec![SpellMetrics {
                    label: "fireball".into(),
                    school: SpellSchool::Fire,
                    casts: 2,
                    targets: vec![TargetMetrics::default(), target],
                }],
                auras: vec![AuraMetrics {
                    label: "combustion".into(),
                    uptime_secs: duration / 2.0,
                    activations: 1,
                    refreshes: 0,
                }],
                resource: None,
            }],
        }
    }

    #[test]
    fn test_distribution_basics() {
        let mut d = DistributionMetrics::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            d.add(v);
        }
        assert!((d.mean() - 5.0).abs() < 1e-12);
        assert!((d.stdev() - 2.0).abs() < 1e-12);
        assert!((d.min - 2.0).abs() < f64::EPSILON);
        assert!((d.max - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_report() {
        let mut agg = Aggregate::new();
        agg.add(&iteration(1, 6000.0, 60.0));
        agg.add(&iteration(2, 12000.0, 60.0));
        let report = agg.report(9);

        assert_eq!(report.iterations, 2);
        let mage = &report.units[0];
        assert!((mage.dps.mean - 150.0).abs() < 1e-9);
        assert!((mage.tps.mean - 300.0).abs() < 1e-9);
        assert!((mage.auras[0].uptime - 0.5).abs() < 1e-12);
        assert_eq!(
            mage.spells[0].outcomes,
            vec![("Crit".to_string(), 2), ("Hit".to_string(), 2)]
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"dps\""));
        let back: AggregateReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.iterations, 2);
    }

    #[test]
    fn test_merge_with_empty() {
        let mut a = Aggregate::new();
        let mut b = Aggregate::new();
        b.add(&iteration(1, 100.0, 10.0));
        a.merge(&b);
        assert_eq!(a, b);
        a.merge(&Aggregate::new());
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            damages in prop::collection::vec(0.0f64..1e6, 1..40),
            split in 0usize..40,
        ) {
            let iterations: Vec<IterationMetrics> = damages
                .iter()
                .enumerate()
                .map(|(i, d)| iteration(i as u64, *d, 120.0))
                .collect();

            let mut forward = Aggregate::new();
            iterations.iter().for_each(|m| forward.add(m));

            let mut backward = Aggregate::new();
            iterations.iter().rev().for_each(|m| backward.add(m));

            let split = split.min(iterations.len());
            let mut left = Aggregate::new();
            let mut right = Aggregate::new();
            iterations[..split].iter().for_each(|m| left.add(m));
            iterations[split..].iter().for_each(|m| right.add(m));
            right.merge(&left);

            for other in [&backward, &right] {
                prop_assert_eq!(forward.iterations, other.iterations);
                let (a, b) = (&forward.units[0], &other.units[0]);
                prop_assert!((a.dps.mean() - b.dps.mean()).abs() <= 1e-9 * a.dps.mean().abs().max(1.0));
                prop_assert!((a.dps.stdev() - b.dps.stdev()).abs() <= 1e-6 * a.dps.mean().abs().max(1.0));
                prop_assert_eq!(a.dps.min, b.dps.min);
                prop_assert_eq!(a.dps.max, b.dps.max);
                prop_assert_eq!(a.spells[0].outcomes, b.spells[0].outcomes);
            }
        }
    }
}
