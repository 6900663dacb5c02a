#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tolerance-based consensus resolution of competing numeric values.
//!
//! Given every source's report of one attribute (lot area, frontage, ...),
//! [`Reconciler::resolve`] picks a single value and says how far it can be
//! trusted:
//!
//! 1. Candidates without a finite value are ignored (never read as zero).
//! 2. A lone manual entry is taken as the anchor: corroborated, it is
//!    averaged with the agreeing values and `Verified`; contradicted, it is
//!    kept as-is and flagged `Conflict`; alone, it is `Estimated`.
//! 3. Otherwise the largest agreement group wins (ties go to the group
//!    holding the most trusted method, then to the earliest seed), and its
//!    mean is `Verified`.
//! 4. With no agreeing pair at all, the single most trusted value is used.
//!
//! Agreement groups are built pairwise: a value joins a group only if it
//! agrees with *every* member already in it, so two values that each agree
//! with a third do not end up together unless they also agree with each
//! other.

use parcel_intel_reconcile_models::{
    Candidate, Method, ReconcileConfig, Resolution, ResolutionStatus,
};

/// Returns `true` when `a` and `b` are within `tolerance` of each other,
/// relative to the larger magnitude (and never relative to less than 1).
#[must_use]
pub fn agrees(a: f64, b: f64, tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() / scale <= tolerance
}

/// Resolves `candidates` with the default tolerance.
#[must_use]
pub fn resolve(candidates: &[Candidate]) -> Resolution {
    Reconciler::default().resolve(candidates)
}

/// A usable candidate: its input position, value, and method.
#[derive(Debug, Clone, Copy)]
struct Usable {
    index: usize,
    value: f64,
    method: Method,
}

/// Consensus resolver for one attribute at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// Creates a resolver with the given tolerance settings.
    #[must_use]
    pub const fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Resolves one attribute from its candidates.
    ///
    /// Deterministic for a given input order. The returned resolution always
    /// echoes every input candidate.
    #[must_use]
    pub fn resolve(&self, candidates: &[Candidate]) -> Resolution {
        let usable: Vec<Usable> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, c)| {
                c.usable_value().map(|value| Usable {
                    index,
                    value,
                    method: c.method,
                })
            })
            .collect();

        if usable.is_empty() {
            log::debug!(
                "No usable value among {} candidates, attribute is missing",
                candidates.len()
            );
            return Resolution::missing(candidates.to_vec());
        }

        let manual: Vec<&Usable> = usable
            .iter()
            .filter(|u| u.method == Method::Manual)
            .collect();

        let (value, status, support) = if let [anchor] = manual.as_slice() {
            self.anchor_on_manual(anchor, &usable)
        } else if let Some(group) = self.best_group(&usable) {
            self.resolve_group(&group, &usable)
        } else {
            self.most_trusted(&usable)
        };

        if status == ResolutionStatus::Conflict {
            log::debug!(
                "Conflicting candidates {:?}, resolved to {value}",
                usable.iter().map(|u| u.value).collect::<Vec<_>>()
            );
        }

        Resolution {
            value: Some(value),
            status,
            supporting_sources: support
                .into_iter()
                .map(|index| candidates[index].source.clone())
                .collect(),
            candidates: candidates.to_vec(),
        }
    }

    fn agree(&self, a: f64, b: f64) -> bool {
        agrees(a, b, self.config.relative_tolerance)
    }

    fn anchor_on_manual(
        &self,
        anchor: &Usable,
        usable: &[Usable],
    ) -> (f64, ResolutionStatus, Vec<usize>) {
        let others: Vec<&Usable> = usable.iter().filter(|u| u.index != anchor.index).collect();
        if others.is_empty() {
            return (anchor.value, ResolutionStatus::Estimated, vec![anchor.index]);
        }

        let mut members: Vec<&Usable> = vec![anchor];
        members.extend(others.iter().filter(|u| self.agree(anchor.value, u.value)));

        if members.len() == 1 {
            return (anchor.value, ResolutionStatus::Conflict, vec![anchor.index]);
        }

        members.sort_by_key(|u| u.index);
        let values: Vec<f64> = members.iter().map(|u| u.value).collect();
        (
            mean(&values),
            ResolutionStatus::Verified,
            members.iter().map(|u| u.index).collect(),
        )
    }

    /// Largest pairwise-agreeing group of two or more, as positions into
    /// `usable` sorted ascending.
    fn best_group(&self, usable: &[Usable]) -> Option<Vec<usize>> {
        let mut best: Option<(Vec<usize>, u8)> = None;

        for seed in 0..usable.len() {
            let mut group = vec![seed];
            for candidate in 0..usable.len() {
                if candidate == seed {
                    continue;
                }
                if group
                    .iter()
                    .all(|&member| self.agree(usable[member].value, usable[candidate].value))
                {
                    group.push(candidate);
                }
            }
            if group.len() < 2 {
                continue;
            }
            group.sort_unstable();

            let rank = group
                .iter()
                .map(|&member| usable[member].method.priority())
                .max()
                .unwrap_or(0);

            let better = match &best {
                None => true,
                Some((current, current_rank)) => {
                    group.len() > current.len()
                        || (group.len() == current.len() && rank > *current_rank)
                }
            };
            if better {
                best = Some((group, rank));
            }
        }

        best.map(|(group, _)| group)
    }

    fn resolve_group(
        &self,
        group: &[usize],
        usable: &[Usable],
    ) -> (f64, ResolutionStatus, Vec<usize>) {
        let values: Vec<f64> = group.iter().map(|&g| usable[g].value).collect();
        let value = mean(&values);

        let manual_dissent = usable.iter().enumerate().any(|(pos, u)| {
            u.method == Method::Manual && !group.contains(&pos) && !self.agree(u.value, value)
        });

        let status = if manual_dissent {
            ResolutionStatus::Conflict
        } else {
            ResolutionStatus::Verified
        };

        (value, status, group.iter().map(|&g| usable[g].index).collect())
    }

    fn most_trusted(&self, usable: &[Usable]) -> (f64, ResolutionStatus, Vec<usize>) {
        let mut pick = usable[0];
        for u in &usable[1..] {
            if u.method.priority() > pick.method.priority() {
                pick = *u;
            }
        }

        let contradicted = usable
            .iter()
            .any(|u| u.index != pick.index && !self.agree(u.value, pick.value));

        let status = if contradicted {
            ResolutionStatus::Conflict
        } else {
            ResolutionStatus::Estimated
        };

        (pick.value, status, vec![pick.index])
    }
}

/// Running mean; stays finite for any finite inputs.
fn mean(values: &[f64]) -> f64 {
    values.iter().enumerate().fold(0.0, |acc, (i, &v)| {
        #[allow(clippy::cast_precision_loss)]
        let k = (i + 1) as f64;
        acc + (v - acc) / k
    })
}
