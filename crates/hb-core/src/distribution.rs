//! Hour-of-day probability distributions.
//!
//! Observations are `(hour, category)` pairs. For each of the 24 hours the
//! aggregator keeps a count per category of the domain and normalizes those
//! counts into probabilities. Every hour is always present: an hour without
//! observations has an all-zero count and probability vector, never a
//! missing entry or `NaN`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event::{HOURS_PER_DAY, HourBucket};

/// How the category domain of a distribution is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainPolicy {
    /// A fixed, ordered domain supplied up front; other categories are dropped.
    #[default]
    Fixed,
    /// The sorted set of distinct categories actually observed.
    Observed,
}

/// Per-hour category counts over a category domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyDistribution<C> {
    domain: Vec<C>,
    /// `counts[hour][category]`, indexed by position in `domain`.
    counts: Vec<Vec<u32>>,
}

impl<C: PartialEq> HourlyDistribution<C> {
    /// Aggregates observations over a fixed domain.
    ///
    /// Repeated domain entries keep their first position. Observations whose
    /// category is not in the domain are ignored.
    pub fn with_domain(
        domain: impl IntoIterator<Item = C>,
        observations: impl IntoIterator<Item = (HourBucket, C)>,
    ) -> Self {
        let mut distinct: Vec<C> = Vec::new();
        for category in domain {
            if !distinct.contains(&category) {
                distinct.push(category);
            }
        }
        let domain = distinct;
        let mut counts = vec![vec![0; domain.len()]; HOURS_PER_DAY];

        let mut dropped = 0_usize;
        for (hour, category) in observations {
            match domain.iter().position(|c| *c == category) {
                Some(idx) => counts[hour.index()][idx] += 1,
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "ignored observations outside the category domain");
        }

        Self { domain, counts }
    }

    /// The categories, in column order.
    pub fn domain(&self) -> &[C] {
        &self.domain
    }

    /// Raw counts per category for one hour.
    pub fn counts(&self, hour: HourBucket) -> &[u32] {
        &self.counts[hour.index()]
    }

    /// Number of observations in one hour.
    pub fn total(&self, hour: HourBucket) -> u32 {
        self.counts[hour.index()].iter().sum()
    }

    /// Number of observations per hour.
    pub fn hour_totals(&self) -> [u32; HOURS_PER_DAY] {
        let mut totals = [0; HOURS_PER_DAY];
        for hour in HourBucket::all() {
            totals[hour.index()] = self.total(hour);
        }
        totals
    }

    /// Number of observations across the whole day.
    pub fn grand_total(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// Normalized probabilities for one hour.
    ///
    /// Sums to 1 when the hour has observations, otherwise all zeros.
    pub fn probabilities(&self, hour: HourBucket) -> Vec<f64> {
        let total = self.total(hour);
        if total == 0 {
            return vec![0.0; self.domain.len()];
        }
        self.counts(hour)
            .iter()
            .map(|&count| f64::from(count) / f64::from(total))
            .collect()
    }

    /// Probability of one category at each hour.
    ///
    /// All zeros when the category is not in the domain.
    pub fn probability_series(&self, category: &C) -> [f64; HOURS_PER_DAY] {
        let mut series = [0.0; HOURS_PER_DAY];
        let Some(idx) = self.position(category) else {
            return series;
        };
        for hour in HourBucket::all() {
            let total = self.total(hour);
            if total > 0 {
                series[hour.index()] =
                    f64::from(self.counts[hour.index()][idx]) / f64::from(total);
            }
        }
        series
    }

    /// Share of one category's observations falling in each hour.
    ///
    /// Sums to 1 across the day when the category occurs at all, otherwise
    /// all zeros.
    pub fn hour_share(&self, category: &C) -> [f64; HOURS_PER_DAY] {
        let mut share = [0.0; HOURS_PER_DAY];
        let Some(idx) = self.position(category) else {
            return share;
        };
        let total: u32 = self.counts.iter().map(|row| row[idx]).sum();
        if total == 0 {
            return share;
        }
        for hour in HourBucket::all() {
            share[hour.index()] = f64::from(self.counts[hour.index()][idx]) / f64::from(total);
        }
        share
    }

    fn position(&self, category: &C) -> Option<usize> {
        self.domain.iter().position(|c| c == category)
    }
}

impl<C: Ord + Clone> HourlyDistribution<C> {
    /// Aggregates observations over the distinct categories seen, sorted.
    pub fn observed(observations: impl IntoIterator<Item = (HourBucket, C)>) -> Self {
        let observations: Vec<(HourBucket, C)> = observations.into_iter().collect();
        let domain: BTreeSet<C> = observations.iter().map(|(_, c)| c.clone()).collect();
        Self::with_domain(domain, observations)
    }

    /// Aggregates with the given policy; `fixed` is only consulted for
    /// [`DomainPolicy::Fixed`].
    pub fn with_policy(
        policy: DomainPolicy,
        fixed: impl IntoIterator<Item = C>,
        observations: impl IntoIterator<Item = (HourBucket, C)>,
    ) -> Self {
        match policy {
            DomainPolicy::Fixed => Self::with_domain(fixed, observations),
            DomainPolicy::Observed => Self::observed(observations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn h(hour: u32) -> HourBucket {
        HourBucket::new(hour).unwrap()
    }

    const EPSILON: f64 = 1e-9;

    #[test]
    fn counts_and_probabilities_per_hour() {
        let dist = HourlyDistribution::with_domain(
            ["a", "b", "c"],
            [(h(5), "a"), (h(5), "b"), (h(5), "b"), (h(5), "b"), (h(9), "c")],
        );

        assert_eq!(dist.counts(h(5)), &[1, 3, 0]);
        assert_eq!(dist.total(h(5)), 4);
        assert_eq!(dist.probabilities(h(5)), vec![0.25, 0.75, 0.0]);
        assert_eq!(dist.probabilities(h(9)), vec![0.0, 0.0, 1.0]);
        assert_eq!(dist.grand_total(), 5);
    }

    #[test]
    fn empty_hours_are_zero_filled() {
        let dist = HourlyDistribution::with_domain([0_u8, 1, 2, 3], [(h(7), 1)]);

        for hour in HourBucket::all() {
            let probabilities = dist.probabilities(hour);
            assert_eq!(probabilities.len(), 4);
            if hour.index() != 7 {
                assert_eq!(probabilities, vec![0.0; 4]);
                assert!(probabilities.iter().all(|p| !p.is_nan()));
            }
        }
    }

    #[test]
    fn no_observations_at_all() {
        let dist: HourlyDistribution<&str> = HourlyDistribution::with_domain(["x"], std::iter::empty());
        assert_eq!(dist.hour_totals(), [0; HOURS_PER_DAY]);
        assert_eq!(dist.probability_series(&"x"), [0.0; HOURS_PER_DAY]);
        assert_eq!(dist.hour_share(&"x"), [0.0; HOURS_PER_DAY]);
    }

    #[test]
    fn fixed_domain_drops_unknown_categories() {
        let dist =
            HourlyDistribution::with_domain(["small", "large"], [(h(1), "small"), (h(1), "huge")]);
        assert_eq!(dist.counts(h(1)), &[1, 0]);
        assert_eq!(dist.probabilities(h(1)), vec![1.0, 0.0]);
    }

    #[test]
    fn repeated_domain_entries_collapse() {
        let dist = HourlyDistribution::with_domain(
            ["small", "large", "small"],
            [(h(2), "small"), (h(2), "large")],
        );
        assert_eq!(dist.domain(), &["small", "large"]);
        assert_eq!(dist.counts(h(2)), &[1, 1]);
        assert_eq!(dist.probabilities(h(2)), vec![0.5, 0.5]);
    }

    #[test]
    fn observed_domain_is_sorted_distinct() {
        let dist = HourlyDistribution::observed([
            (h(2), "medium".to_string()),
            (h(3), "huge".to_string()),
            (h(2), "medium".to_string()),
        ]);
        assert_eq!(dist.domain(), &["huge".to_string(), "medium".to_string()]);
        assert_eq!(dist.counts(h(2)), &[0, 2]);
    }

    #[test]
    fn policy_selects_domain() {
        let obs = [(h(0), 3_u8)];
        let fixed = HourlyDistribution::with_policy(DomainPolicy::Fixed, [0, 1, 2, 3], obs);
        let observed = HourlyDistribution::with_policy(DomainPolicy::Observed, [0, 1, 2, 3], obs);
        assert_eq!(fixed.domain().len(), 4);
        assert_eq!(observed.domain(), &[3]);
    }

    #[test]
    fn probability_series_for_one_category() {
        let dist = HourlyDistribution::with_domain(
            ["small", "large"],
            [(h(4), "small"), (h(4), "large"), (h(6), "large")],
        );
        let series = dist.probability_series(&"large");
        assert!((series[4] - 0.5).abs() < EPSILON);
        assert!((series[6] - 1.0).abs() < EPSILON);
        assert!(series[5].abs() < EPSILON);
        assert_eq!(dist.probability_series(&"medium"), [0.0; HOURS_PER_DAY]);
    }

    #[test]
    fn hour_share_spreads_one_category_over_the_day() {
        let dist = HourlyDistribution::with_domain(
            ["small", "large"],
            [(h(4), "large"), (h(6), "large"), (h(6), "large"), (h(6), "small")],
        );
        let share = dist.hour_share(&"large");
        assert!((share[4] - 1.0 / 3.0).abs() < EPSILON);
        assert!((share[6] - 2.0 / 3.0).abs() < EPSILON);
        assert!((share.iter().sum::<f64>() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn policy_serde_names() {
        let policy: DomainPolicy = serde_json::from_str(r#""observed""#).unwrap();
        assert_eq!(policy, DomainPolicy::Observed);
        assert_eq!(DomainPolicy::default(), DomainPolicy::Fixed);
    }

    proptest! {
        #[test]
        fn every_hour_sums_to_one_or_zero(
            observations in prop::collection::vec((0_u32..24, 0_u8..4), 0..200)
        ) {
            let dist = HourlyDistribution::with_domain(
                [0_u8, 1, 2, 3],
                observations.iter().map(|&(hour, cat)| (h(hour), cat)),
            );

            for hour in HourBucket::all() {
                let probabilities = dist.probabilities(hour);
                prop_assert_eq!(probabilities.len(), 4);
                let sum: f64 = probabilities.iter().sum();
                if dist.total(hour) > 0 {
                    prop_assert!((sum - 1.0).abs() < EPSILON);
                } else {
                    prop_assert!(probabilities.iter().all(|&p| p == 0.0));
                }
                prop_assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
            }
            prop_assert_eq!(dist.grand_total() as usize, observations.len());
        }
    }
}
