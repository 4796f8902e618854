//! Keeper selection and decision emission tests.

use std::path::PathBuf;

use vdedup::decision::emit_decisions;
use vdedup::keeper::select_for_cluster;
use vdedup::{
    Decision, FrameHash, KeeperCandidate, Resolution, Selection, Signature, find_clusters,
    select_keeper,
};

fn candidate(path: &str, width: u32, height: u32, file_size: u64) -> KeeperCandidate {
    KeeperCandidate {
        path: PathBuf::from(path),
        resolution: Resolution::new(width, height),
        file_size,
    }
}

#[test]
fn highest_resolution_wins() {
    let candidates = vec![
        candidate("small.mp4", 1280, 720, 9_000_000),
        candidate("large.mp4", 1920, 1080, 1_000),
    ];
    let selection = select_keeper(&candidates).unwrap();
    assert_eq!(selection.keeper, PathBuf::from("large.mp4"));
    assert_eq!(selection.dropped, vec![PathBuf::from("small.mp4")]);
}

#[test]
fn size_breaks_resolution_ties() {
    let candidates = vec![
        candidate("bigger.mp4", 640, 480, 2_048),
        candidate("smaller.mp4", 640, 480, 1_024),
    ];
    let selection = select_keeper(&candidates).unwrap();
    assert_eq!(selection.keeper, PathBuf::from("bigger.mp4"));
}

#[test]
fn path_breaks_full_ties() {
    let candidates = vec![
        candidate("b.mp4", 640, 480, 100),
        candidate("c.mp4", 640, 480, 100),
        candidate("a.mp4", 640, 480, 100),
    ];
    let selection = select_keeper(&candidates).unwrap();
    assert_eq!(selection.keeper, PathBuf::from("c.mp4"));
    assert_eq!(
        selection.dropped,
        vec![PathBuf::from("b.mp4"), PathBuf::from("a.mp4")]
    );
}

#[test]
fn keeper_independent_of_member_order() {
    let base = vec![
        candidate("one.mp4", 1280, 720, 500),
        candidate("two.mp4", 1920, 1080, 300),
        candidate("three.mp4", 1920, 1080, 300),
        candidate("four.mp4", 640, 480, 900),
    ];
    let expected = select_keeper(&base).unwrap().keeper;

    let orders: [[usize; 4]; 5] = [
        [3, 2, 1, 0],
        [1, 3, 0, 2],
        [2, 0, 3, 1],
        [0, 2, 3, 1],
        [3, 0, 2, 1],
    ];
    for order in orders {
        let permuted: Vec<KeeperCandidate> = order.iter().map(|&i| base[i].clone()).collect();
        assert_eq!(select_keeper(&permuted).unwrap().keeper, expected);
    }
}

#[test]
fn unknown_resolution_loses_to_known() {
    let candidates = vec![
        KeeperCandidate {
            path: PathBuf::from("unknown.mp4"),
            resolution: Resolution::UNKNOWN,
            file_size: u64::MAX,
        },
        candidate("tiny.mp4", 160, 120, 1),
    ];
    assert_eq!(
        select_keeper(&candidates).unwrap().keeper,
        PathBuf::from("tiny.mp4")
    );
}

#[test]
fn empty_candidates_have_no_keeper() {
    assert!(select_keeper(&[]).is_none());
}

#[test]
fn file_size_read_from_disk() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    // The path tie-break alone would favour "b_small".
    let large = temporary_directory.path().join("a_large.mp4");
    let small = temporary_directory.path().join("b_small.mp4");
    std::fs::write(&large, vec![0u8; 1000]).expect("Failed to write file");
    std::fs::write(&small, vec![0u8; 100]).expect("Failed to write file");

    let signature = Signature::sampled(
        12.0,
        vec![FrameHash::from_bits(0)],
        Resolution::new(640, 480),
    );
    let signed = vec![
        (small.clone(), signature.clone()),
        (large.clone(), signature.clone()),
    ];
    let clusters = find_clusters(&signed, 0.5, 8.0);
    assert_eq!(clusters.len(), 1);

    let selection = select_for_cluster(&clusters[0], |_| Some(&signature)).unwrap();
    assert_eq!(selection.keeper, large);
    assert_eq!(selection.dropped, vec![small]);
}

#[test]
fn decisions_flatten_selections() {
    let selections = vec![
        Selection {
            keeper: PathBuf::from("k1.mp4"),
            dropped: vec![PathBuf::from("d1.mp4"), PathBuf::from("d2.mp4")],
        },
        Selection {
            keeper: PathBuf::from("k2.mp4"),
            dropped: vec![PathBuf::from("d3.mp4")],
        },
    ];
    let report = emit_decisions(selections, vec![PathBuf::from("broken.mp4")]);

    assert_eq!(
        report.decisions,
        vec![
            Decision {
                keep: PathBuf::from("k1.mp4"),
                drop: PathBuf::from("d1.mp4"),
            },
            Decision {
                keep: PathBuf::from("k1.mp4"),
                drop: PathBuf::from("d2.mp4"),
            },
            Decision {
                keep: PathBuf::from("k2.mp4"),
                drop: PathBuf::from("d3.mp4"),
            },
        ]
    );
    assert_eq!(report.bad_files, vec![PathBuf::from("broken.mp4")]);
    assert_eq!(report.dropped().count(), 3);
    assert!(!report.is_empty());
}

#[test]
fn report_serializes_to_json() {
    let report = emit_decisions(
        vec![Selection {
            keeper: PathBuf::from("keep.mp4"),
            dropped: vec![PathBuf::from("drop.mp4")],
        }],
        Vec::new(),
    );
    let value = serde_json::to_value(&report).expect("Failed to serialize report");
    assert_eq!(value["decisions"][0]["keep"], "keep.mp4");
    assert_eq!(value["decisions"][0]["drop"], "drop.mp4");
    assert!(value["bad_files"].as_array().unwrap().is_empty());
}
