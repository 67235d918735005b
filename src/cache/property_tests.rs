//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache contract across both backends.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use crate::cache::{key_digest, Cache, FileCache, MemoryCache, PathLayout, ShardDepth};
use crate::config::{FileConfig, MemoryConfig};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

fn memory_cache() -> MemoryCache<String> {
    MemoryCache::new(MemoryConfig {
        default_expiration: TEST_TTL,
        cleanup_interval: Duration::ZERO,
    })
}

fn file_cache(dir: &TempDir, depth: ShardDepth) -> FileCache<String> {
    FileCache::new(FileConfig {
        root_path: dir.path().to_path_buf(),
        file_suffix: ".cache".to_string(),
        shard_depth: depth,
        default_expiration: TEST_TTL,
    })
    .unwrap()
}

// == Strategies ==
/// Arbitrary keys, including ones that are not valid file names
fn key_strategy() -> impl Strategy<Value = String> {
    "\\PC{1,64}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,256}".prop_map(|s| s)
}

fn depth_strategy() -> impl Strategy<Value = ShardDepth> {
    prop_oneof![
        Just(ShardDepth::Flat),
        Just(ShardDepth::One),
        Just(ShardDepth::Two),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Add { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so operations collide
    let key = "[a-e]";
    prop_oneof![
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::Add { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

/// Applies `ops` to `cache` and to a plain map, checking they agree at every step.
fn check_against_model(cache: &dyn Cache<String>, ops: Vec<CacheOp>) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, String> = HashMap::new();
    for op in ops {
        match op {
            CacheOp::Add { key, value } => {
                cache.add(&key, value.clone(), TEST_TTL).unwrap();
                model.insert(key, value);
            }
            CacheOp::Get { key } => {
                prop_assert_eq!(cache.get(&key), model.get(&key).cloned());
                prop_assert_eq!(cache.exists(&key), model.contains_key(&key));
            }
            CacheOp::Delete { key } => {
                let expected = model.remove(&key).is_some();
                prop_assert_eq!(cache.delete(&key).is_ok(), expected);
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing then reading before expiration returns the stored value
    #[test]
    fn prop_memory_roundtrip(key in key_strategy(), value in value_strategy()) {
        let cache = memory_cache();
        cache.add(&key, value.clone(), TEST_TTL).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));
        prop_assert!(cache.exists(&key));
    }

    // Keys never added are absent
    #[test]
    fn prop_memory_unknown_key_absent(key in key_strategy()) {
        let cache = memory_cache();
        prop_assert!(cache.get(&key).is_none());
        prop_assert!(!cache.exists(&key));
    }

    // A second add replaces the first
    #[test]
    fn prop_memory_overwrite(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let cache = memory_cache();
        cache.add(&key, value1, TEST_TTL).unwrap();
        cache.add(&key, value2.clone(), TEST_TTL).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value2));
        prop_assert_eq!(cache.len(), 1);
    }

    // Delete succeeds once, then the key is gone and a second delete fails
    #[test]
    fn prop_memory_delete(key in key_strategy(), value in value_strategy()) {
        let cache = memory_cache();
        cache.add(&key, value, TEST_TTL).unwrap();
        prop_assert!(cache.delete(&key).is_ok());
        prop_assert!(cache.get(&key).is_none());
        prop_assert!(!cache.exists(&key));
        prop_assert!(cache.delete(&key).is_err());
    }

    // Flush leaves nothing live
    #[test]
    fn prop_memory_flush(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..30)
    ) {
        let cache = memory_cache();
        for (key, value) in &entries {
            cache.add(key, value.clone(), TEST_TTL).unwrap();
        }
        cache.flush().unwrap();
        for (key, _) in &entries {
            prop_assert!(cache.get(key).is_none());
        }
    }

    // Any operation sequence matches a plain map
    #[test]
    fn prop_memory_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = memory_cache();
        check_against_model(&cache, ops)?;
    }

    // Path derivation is a pure function of key and layout
    #[test]
    fn prop_path_determinism(key in key_strategy(), depth in depth_strategy()) {
        let a = PathLayout::new("/var/cache/app", ".bin", depth);
        let b = PathLayout::new("/var/cache/app", ".bin", depth);
        let path = a.path_for(&key);

        prop_assert_eq!(&path, &b.path_for(&key));
        prop_assert!(a.is_entry_path(&path));

        let expected_name = format!("{}.bin", key_digest(&key));
        prop_assert_eq!(path.file_name().unwrap().to_str().unwrap(), expected_name.as_str());
    }

    // Distinct keys land in distinct files
    #[test]
    fn prop_distinct_keys_distinct_paths(
        key1 in key_strategy(),
        key2 in key_strategy(),
        depth in depth_strategy()
    ) {
        prop_assume!(key1 != key2);
        let layout = PathLayout::new("/var/cache/app", "", depth);
        prop_assert_ne!(layout.path_for(&key1), layout.path_for(&key2));
    }
}

// File-backed properties touch the disk, so fewer cases
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_file_roundtrip(
        key in key_strategy(),
        value in value_strategy(),
        depth in depth_strategy()
    ) {
        let dir = TempDir::new().unwrap();
        let cache = file_cache(&dir, depth);
        cache.add(&key, value.clone(), TEST_TTL).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));
        prop_assert!(cache.exists(&key));
    }

    #[test]
    fn prop_file_matches_model(
        ops in prop::collection::vec(cache_op_strategy(), 1..40),
        depth in depth_strategy()
    ) {
        let dir = TempDir::new().unwrap();
        let cache = file_cache(&dir, depth);
        check_against_model(&cache, ops)?;
    }

    // Two instances over the same root see each other's entries
    #[test]
    fn prop_file_shared_root(key in key_strategy(), value in value_strategy()) {
        let dir = TempDir::new().unwrap();
        let writer = file_cache(&dir, ShardDepth::Two);
        let reader = file_cache(&dir, ShardDepth::Two);
        writer.add(&key, value.clone(), TEST_TTL).unwrap();
        prop_assert_eq!(reader.get(&key), Some(value));
    }
}

// == Concurrent Operation Correctness ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // Concurrent writers to one key leave exactly one of their values
    #[test]
    fn prop_concurrent_same_key_single_winner(
        values in prop::collection::vec(value_strategy(), 2..16)
    ) {
        let cache = Arc::new(memory_cache());

        thread::scope(|scope| {
            for value in &values {
                let cache = Arc::clone(&cache);
                scope.spawn(move || cache.add("shared", value.clone(), TEST_TTL).unwrap());
            }
        });

        let winner = cache.get("shared").unwrap();
        prop_assert!(values.contains(&winner));
        prop_assert_eq!(cache.len(), 1);
    }

    // Concurrent writers to distinct keys are all visible afterwards
    #[test]
    fn prop_concurrent_distinct_keys_visible(count in 2usize..32) {
        let cache = Arc::new(memory_cache());

        thread::scope(|scope| {
            for i in 0..count {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    cache.add(&format!("key{i}"), format!("value{i}"), TEST_TTL).unwrap()
                });
            }
        });

        for i in 0..count {
            prop_assert_eq!(cache.get(&format!("key{i}")), Some(format!("value{i}")));
        }
    }
}
