//! Bucketing, distance, and clustering tests.
//!
//! These run on hand-built signatures and need no media files.

use std::path::PathBuf;

use vdedup::cluster::{bucket_by_duration, bucket_key};
use vdedup::{FrameHash, Resolution, Signature, find_clusters};

fn sampled(duration: f64, bits: u64, width: u32, height: u32) -> Signature {
    Signature::sampled(
        duration,
        vec![FrameHash::from_bits(bits)],
        Resolution::new(width, height),
    )
}

fn bit_set(bits: &[u32]) -> u64 {
    bits.iter().fold(0, |acc, bit| acc | (1u64 << bit))
}

/// Three files: two near-identical at ~100 s, one unrelated at 250 s.
fn three_file_scenario() -> Vec<(PathBuf, Signature)> {
    vec![
        (PathBuf::from("file1.mp4"), sampled(100.0, 0, 1920, 1080)),
        (
            PathBuf::from("file2.mp4"),
            sampled(100.2, bit_set(&[0, 60, 61]), 1280, 720),
        ),
        (
            PathBuf::from("file3.mp4"),
            sampled(250.0, (1u64 << 40) - 1, 1920, 1080),
        ),
    ]
}

// ── Distance ───────────────────────────────────────────────────────

#[test]
fn scenario_distances() {
    let signed = three_file_scenario();
    assert_eq!(signed[0].1.distance(&signed[1].1), 3.0);
    assert_eq!(signed[0].1.distance(&signed[2].1), 40.0);
    assert_eq!(signed[1].1.distance(&signed[2].1), 41.0);
}

#[test]
fn distance_is_symmetric_and_zero_on_self() {
    let a = Signature::sampled(
        10.0,
        vec![FrameHash::from_bits(0xDEAD_BEEF), FrameHash::from_bits(7)],
        Resolution::new(640, 480),
    );
    let b = Signature::sampled(
        10.0,
        vec![FrameHash::from_bits(0xFEED_FACE), FrameHash::from_bits(0)],
        Resolution::new(640, 480),
    );

    assert_eq!(a.distance(&a), 0.0);
    assert_eq!(a.distance(&b), b.distance(&a));
}

#[test]
fn distance_uses_aligned_prefix() {
    let long = Signature::sampled(
        10.0,
        vec![
            FrameHash::from_bits(0),
            FrameHash::from_bits(0b11),
            FrameHash::from_bits(u64::MAX),
        ],
        Resolution::UNKNOWN,
    );
    let short = Signature::sampled(
        10.0,
        vec![FrameHash::from_bits(0b1), FrameHash::from_bits(0b11)],
        Resolution::UNKNOWN,
    );

    // Only the first two hashes are compared: (1 + 0) / 2.
    assert_eq!(long.distance(&short), 0.5);
}

#[test]
fn distance_with_empty_signature_never_matches() {
    let empty = Signature::sampled(10.0, Vec::new(), Resolution::UNKNOWN);
    let full = sampled(10.0, 0, 640, 480);

    assert!(empty.distance(&full).is_infinite());
    assert!(full.distance(&empty).is_infinite());
}

// ── Bucketing ──────────────────────────────────────────────────────

#[test]
fn bucket_key_rounds_half_to_even() {
    // 0.25 / 0.5 = 0.5 rounds to 0; 0.75 / 0.5 = 1.5 rounds to 2.
    assert_eq!(bucket_key(0.25, 0.5), 0);
    assert_eq!(bucket_key(0.75, 0.5), 2);
    assert_eq!(bucket_key(100.0, 0.5), 200);
    assert_eq!(bucket_key(100.2, 0.5), 200);
}

#[test]
fn buckets_preserve_input_order() {
    let signed = three_file_scenario();
    let buckets = bucket_by_duration(&signed, 0.5);

    assert_eq!(buckets, vec![(200, vec![0, 1]), (500, vec![2])]);
}

#[test]
fn buckets_follow_first_appearance() {
    let signed = vec![
        (PathBuf::from("long.mp4"), sampled(250.0, 0, 640, 480)),
        (PathBuf::from("short.mp4"), sampled(10.0, 0, 640, 480)),
        (PathBuf::from("long_copy.mp4"), sampled(250.1, 0, 640, 480)),
        (PathBuf::from("short_copy.mp4"), sampled(10.1, 0, 640, 480)),
    ];

    let buckets = bucket_by_duration(&signed, 0.5);
    assert_eq!(buckets, vec![(500, vec![0, 2]), (20, vec![1, 3])]);

    // Clusters, and so decisions, come out in the same order.
    let clusters = find_clusters(&signed, 0.5, 8.0);
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].seed(), PathBuf::from("long.mp4").as_path());
    assert_eq!(clusters[1].seed(), PathBuf::from("short.mp4").as_path());
}

// ── Clustering ─────────────────────────────────────────────────────

#[test]
fn scenario_forms_single_cluster() {
    let signed = three_file_scenario();
    let clusters = find_clusters(&signed, 0.5, 8.0);

    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(
        cluster.members(),
        &[PathBuf::from("file1.mp4"), PathBuf::from("file2.mp4")]
    );
    assert_eq!(cluster.seed(), PathBuf::from("file1.mp4").as_path());
    assert!(!cluster.contains(&PathBuf::from("file3.mp4")));
}

#[test]
fn empty_input_yields_no_clusters() {
    assert!(find_clusters(&[], 0.5, 8.0).is_empty());
}

#[test]
fn single_file_never_clusters() {
    let signed = vec![(PathBuf::from("only.mp4"), sampled(30.0, 0, 640, 480))];
    assert!(find_clusters(&signed, 0.5, 8.0).is_empty());
}

#[test]
fn members_respect_duration_tolerance() {
    let tolerance = 0.5;
    let signed = vec![
        (PathBuf::from("a.mp4"), sampled(60.0, 0, 640, 480)),
        (PathBuf::from("b.mp4"), sampled(60.2, 0, 640, 480)),
        (PathBuf::from("c.mp4"), sampled(59.8, 0, 640, 480)),
        (PathBuf::from("d.mp4"), sampled(60.24, 0, 640, 480)),
    ];

    let clusters = find_clusters(&signed, tolerance, 8.0);
    for cluster in &clusters {
        for a in cluster.members() {
            for b in cluster.members() {
                let da = signed.iter().find(|(path, _)| path == a).unwrap().1.duration();
                let db = signed.iter().find(|(path, _)| path == b).unwrap().1.duration();
                assert!((da - db).abs() <= tolerance);
            }
        }
    }
    let all: Vec<_> = clusters.iter().flat_map(|c| c.members().to_vec()).collect();
    assert!(all.contains(&PathBuf::from("a.mp4")));
    assert!(all.contains(&PathBuf::from("b.mp4")));
}

#[test]
fn durations_exactly_one_tolerance_apart_cluster() {
    // 99.75 / 0.5 = 199.5 and 100.25 / 0.5 = 200.5 both round to bucket 200.
    assert_eq!(bucket_key(99.75, 0.5), 200);
    assert_eq!(bucket_key(100.25, 0.5), 200);

    let signed = vec![
        (PathBuf::from("low.mp4"), sampled(99.75, 0, 640, 480)),
        (PathBuf::from("high.mp4"), sampled(100.25, 0, 640, 480)),
    ];
    let clusters = find_clusters(&signed, 0.5, 8.0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 2);
}

#[test]
fn durations_beyond_tolerance_never_cluster() {
    let tolerance = 0.5;
    for start in [10.0, 59.8, 99.74, 100.0, 100.24, 333.3] {
        let signed = vec![
            (PathBuf::from("a.mp4"), sampled(start, 0, 640, 480)),
            (PathBuf::from("b.mp4"), sampled(start + 0.51, 0, 640, 480)),
        ];
        assert!(
            find_clusters(&signed, tolerance, 8.0).is_empty(),
            "{start} and {} should stay apart",
            start + 0.51,
        );
    }
}

#[test]
fn identical_hashes_with_distant_durations_stay_apart() {
    let signed = vec![
        (PathBuf::from("short.mp4"), sampled(10.0, 42, 640, 480)),
        (PathBuf::from("long.mp4"), sampled(20.0, 42, 640, 480)),
    ];
    assert!(find_clusters(&signed, 0.5, 8.0).is_empty());
}

#[test]
fn membership_is_judged_against_seed_only() {
    // b is 6 bits from a, c is 6 bits from a but 12 from b.
    let a = 0u64;
    let b = bit_set(&[0, 1, 2, 3, 4, 5]);
    let c = bit_set(&[10, 11, 12, 13, 14, 15]);
    let signed = vec![
        (PathBuf::from("a.mp4"), sampled(45.0, a, 640, 480)),
        (PathBuf::from("b.mp4"), sampled(45.0, b, 640, 480)),
        (PathBuf::from("c.mp4"), sampled(45.0, c, 640, 480)),
    ];

    let clusters = find_clusters(&signed, 0.5, 8.0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 3);
}

#[test]
fn lonely_seed_does_not_block_later_clusters() {
    // z matches nobody; x and y are 4 bits apart.
    let x = bit_set(&[0, 1, 2, 3, 4, 5, 6]);
    let y = bit_set(&[0, 1, 2]);
    let z = bit_set(&[8, 9, 10, 11, 12, 13, 14, 15]);
    let signed = vec![
        (PathBuf::from("z.mp4"), sampled(45.0, z, 640, 480)),
        (PathBuf::from("x.mp4"), sampled(45.0, x, 640, 480)),
        (PathBuf::from("y.mp4"), sampled(45.0, y, 640, 480)),
    ];

    let clusters = find_clusters(&signed, 0.5, 8.0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(
        clusters[0].members(),
        &[PathBuf::from("x.mp4"), PathBuf::from("y.mp4")]
    );
}

#[test]
fn no_file_belongs_to_two_clusters() {
    let signed: Vec<(PathBuf, Signature)> = (0..12)
        .map(|i| {
            (
                PathBuf::from(format!("clip{i:02}.mp4")),
                sampled(90.0 + (i % 3) as f64 * 0.1, bit_set(&[i % 5, 20 + i % 4]), 640, 480),
            )
        })
        .collect();

    let clusters = find_clusters(&signed, 0.5, 4.0);
    let mut seen = std::collections::HashSet::new();
    for cluster in &clusters {
        assert!(cluster.len() >= 2);
        for member in cluster.members() {
            assert!(seen.insert(member.clone()), "{} in two clusters", member.display());
        }
    }
}

#[test]
fn minimal_signatures_cluster_on_content_hash() {
    let prefix = b"identical leading bytes";
    let a = Signature::minimal(42.0, FrameHash::from_content_prefix(prefix), Resolution::new(640, 480));
    let b = Signature::minimal(42.1, FrameHash::from_content_prefix(prefix), Resolution::new(320, 240));
    let signed = vec![(PathBuf::from("a.avi"), a), (PathBuf::from("b.avi"), b)];

    let clusters = find_clusters(&signed, 0.5, 8.0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 2);
}
