//! Duration bucketing and duplicate clustering.
//!
//! Signed files are first partitioned by [`bucket_key`], the duration
//! rounded to a multiple of the tolerance, so only files of similar length
//! are ever compared. Inside each bucket clusters are grown greedily from a
//! seed: every still-unclaimed file within `duration_tolerance` of the seed
//! and within `hash_threshold` of it by [`Signature::distance`] joins the
//! seed's group.
//!
//! Admission is judged against the seed only, not against every member, so a
//! cluster is not a transitive closure. Two non-seed members can be further
//! apart than the threshold, and the result depends on input order. Inputs
//! are processed in the order given, which makes the outcome deterministic
//! for a fixed input order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::signature::Signature;

/// A group of at least two files judged to be near-duplicates.
///
/// The first member is the seed the group was grown from; the rest follow in
/// input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    members: Vec<PathBuf>,
}

impl Cluster {
    pub fn members(&self) -> &[PathBuf] {
        &self.members
    }

    pub fn seed(&self) -> &Path {
        &self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`: clusters have at least two members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|member| member == path)
    }

    pub fn into_members(self) -> Vec<PathBuf> {
        self.members
    }
}

/// Bucket index of a duration: `round(duration / tolerance)`, ties to even.
pub fn bucket_key(duration: f64, tolerance: f64) -> i64 {
    (duration / tolerance).round_ties_even() as i64
}

/// Group indices of `signed` by duration bucket.
///
/// Buckets come out in the order their first file appears in `signed`, and
/// indices keep input order within each bucket.
pub fn bucket_by_duration(signed: &[(PathBuf, Signature)], tolerance: f64) -> Vec<(i64, Vec<usize>)> {
    let mut slots: HashMap<i64, usize> = HashMap::new();
    let mut buckets: Vec<(i64, Vec<usize>)> = Vec::new();
    for (index, (_, signature)) in signed.iter().enumerate() {
        let key = bucket_key(signature.duration(), tolerance);
        let slot = *slots.entry(key).or_insert_with(|| {
            buckets.push((key, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(index);
    }
    buckets
}

/// Find duplicate clusters among signed files.
///
/// A seed whose scan admits nobody stays available to later seeds; every
/// file that ends up in a cluster is claimed and cannot join another one.
pub fn find_clusters(
    signed: &[(PathBuf, Signature)],
    duration_tolerance: f64,
    hash_threshold: f64,
) -> Vec<Cluster> {
    let mut claimed = vec![false; signed.len()];
    let mut clusters = Vec::new();

    for (_, bucket) in &bucket_by_duration(signed, duration_tolerance) {
        for &seed in bucket {
            if claimed[seed] {
                continue;
            }
            let seed_signature = &signed[seed].1;

            let mut group = vec![seed];
            for &candidate in bucket {
                if candidate == seed || claimed[candidate] {
                    continue;
                }
                let candidate_signature = &signed[candidate].1;
                if (seed_signature.duration() - candidate_signature.duration()).abs()
                    > duration_tolerance
                {
                    continue;
                }
                if seed_signature.distance(candidate_signature) <= hash_threshold {
                    group.push(candidate);
                }
            }

            if group.len() > 1 {
                for &member in &group {
                    claimed[member] = true;
                }
                log::debug!(
                    "cluster of {} seeded by {}",
                    group.len(),
                    signed[seed].0.display()
                );
                clusters.push(Cluster {
                    members: group.into_iter().map(|index| signed[index].0.clone()).collect(),
                });
            }
        }
    }

    clusters
}
