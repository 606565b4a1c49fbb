//! Integration tests for the analysis half of the pipeline: an
//! oracle-shaped duplicate map through cluster construction and deletion
//! planning, using real files so size-based selection has something to
//! probe.

use std::fs;
use std::path::{Path, PathBuf};

use imgdedup::duplicates::{build_clusters, plan, KeepPolicy};
use imgdedup::similarity::DuplicateMap;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0u8; len]).unwrap();
    path
}

/// Map shaped the way the oracle emits it: every image is a key, and
/// related pairs list each other in both directions.
fn symmetric_pair(a: &Path, b: &Path) -> DuplicateMap {
    let mut map = DuplicateMap::new();
    map.insert(a.to_path_buf(), vec![b.to_path_buf()]);
    map.insert(b.to_path_buf(), vec![a.to_path_buf()]);
    map
}

#[test]
fn smaller_copy_is_planned_for_removal() {
    let dir = TempDir::new().unwrap();
    let large = write_file(dir.path(), "a.png", 4096);
    let small = write_file(dir.path(), "b.png", 1024);
    let unrelated = write_file(dir.path(), "c.png", 512);

    let mut map = symmetric_pair(&large, &small);
    map.insert(unrelated, vec![]);

    let (clusters, cluster_stats) = build_clusters(&map);
    assert_eq!(cluster_stats.clusters, 1);
    assert_eq!(cluster_stats.clustered_images, 2);

    let (decisions, plan_stats) = plan(&clusters, KeepPolicy::LargestFile);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].group_id, 1);
    assert_eq!(decisions[0].representative, large);
    assert_eq!(decisions[0].to_remove, vec![small]);
    assert_eq!(decisions[0].reclaimable_bytes, 1024);
    assert_eq!(plan_stats.to_remove, 1);
    assert_eq!(plan_stats.reclaimable_bytes, 1024);
}

#[test]
fn one_directional_chain_plans_a_single_group() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.png", 100);
    let b = write_file(dir.path(), "b.png", 500);
    let c = write_file(dir.path(), "c.png", 900);

    // The oracle never reports the (a, c) pair directly.
    let mut map = DuplicateMap::new();
    map.insert(a.clone(), vec![b.clone()]);
    map.insert(b.clone(), vec![c.clone()]);

    let (clusters, _) = build_clusters(&map);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members, vec![a.clone(), b.clone(), c.clone()]);

    let (decisions, stats) = plan(&clusters, KeepPolicy::LargestFile);
    assert_eq!(decisions[0].representative, c);
    assert_eq!(decisions[0].to_remove, vec![a, b]);
    assert_eq!(decisions[0].reclaimable_bytes, 600);
    assert_eq!(stats.groups, 1);
    assert_eq!(stats.clustered_images, 3);
}

#[test]
fn keep_policies_choose_different_survivors() {
    let dir = TempDir::new().unwrap();
    let first_but_small = write_file(dir.path(), "a.png", 100);
    let last_but_large = write_file(dir.path(), "z.png", 9000);

    let map = symmetric_pair(&first_but_small, &last_but_large);
    let (clusters, _) = build_clusters(&map);

    let (by_size, _) = plan(&clusters, KeepPolicy::LargestFile);
    assert_eq!(by_size[0].representative, last_but_large);

    let (by_name, _) = plan(&clusters, KeepPolicy::FirstSorted);
    assert_eq!(by_name[0].representative, first_but_small);
    assert_eq!(by_name[0].to_remove, vec![last_but_large]);
}

#[test]
fn groups_are_numbered_by_smallest_member() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.png", 10);
    let b = write_file(dir.path(), "b.png", 20);
    let c = write_file(dir.path(), "c.png", 30);
    let d = write_file(dir.path(), "d.png", 40);

    // Insertion order is c/d first; cluster order must not depend on it.
    let mut map = symmetric_pair(&c, &d);
    map.extend(symmetric_pair(&a, &b));

    let (clusters, _) = build_clusters(&map);
    let (decisions, _) = plan(&clusters, KeepPolicy::FirstSorted);

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].group_id, 1);
    assert_eq!(decisions[0].representative, a);
    assert_eq!(decisions[1].group_id, 2);
    assert_eq!(decisions[1].representative, c);
    for decision in &decisions {
        assert!(!decision.to_remove.contains(&decision.representative));
    }
}

#[test]
fn noise_entries_never_reach_the_plan() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.png", 10);
    let b = write_file(dir.path(), "b.png", 20);

    // Empty lists and self-references are oracle noise, not relationships.
    let mut map = DuplicateMap::new();
    map.insert(a.clone(), vec![]);
    map.insert(b.clone(), vec![b.clone()]);

    let (clusters, stats) = build_clusters(&map);
    assert!(clusters.is_empty());
    assert_eq!(stats.nodes, 0);

    let (decisions, plan_stats) = plan(&clusters, KeepPolicy::LargestFile);
    assert!(decisions.is_empty());
    assert_eq!(plan_stats.to_remove, 0);
    assert_eq!(plan_stats.reclaimable_bytes, 0);
}

#[test]
fn analysis_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.png", 128);
    let b = write_file(dir.path(), "b.png", 256);
    let c = write_file(dir.path(), "c.png", 256);

    let mut map = symmetric_pair(&a, &b);
    map.insert(c.clone(), vec![a.clone()]);
    map.get_mut(&a).unwrap().push(c);

    let run = || {
        let (clusters, _) = build_clusters(&map);
        plan(&clusters, KeepPolicy::LargestFile).0
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].to_remove.len(), 2);
}
