use sharded_map::ShardedMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_puts() {
    let map = Arc::new(ShardedMap::new());
    let mut handles = vec![];

    // Spawn 10 threads, each inserting 100 items
    for thread_id in 0..10 {
        let map = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for i in 0..100 {
                let key = format!("thread_{}_key_{}", thread_id, i);
                map.put(key, i);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.len(), 1000);
}

#[test]
fn test_concurrent_reads() {
    let map = Arc::new(ShardedMap::new());

    for i in 0..100 {
        map.put(format!("key_{}", i), i);
    }

    let mut handles = vec![];

    for _ in 0..20 {
        let map = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for i in 0..100 {
                let key = format!("key_{}", i);
                let value = map.get(&key).unwrap();
                assert_eq!(*value, i);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_merges() {
    let map = Arc::new(ShardedMap::new());
    let mut handles = vec![];

    // 10 threads * 100 merges on a single key
    for _ in 0..10 {
        let map = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for _ in 0..100 {
                map.merge("counter".to_string(), 1, |_, n| Some(n + 1));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*map.get(&"counter".to_string()).unwrap(), 1000);
}

#[test]
fn test_concurrent_replace_retry_loop() {
    let map = Arc::new(ShardedMap::new());
    map.put("counter", 0u64);
    let mut handles = vec![];

    for _ in 0..8 {
        let map = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for _ in 0..250 {
                // Failed compares are not retried by the map, so retry here.
                loop {
                    let current = *map.get(&"counter").unwrap();
                    if map.replace(&"counter", &current, current + 1) {
                        break;
                    }
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*map.get(&"counter").unwrap(), 2000);
}

#[test]
fn test_compute_if_absent_runs_once_under_contention() {
    let map = Arc::new(ShardedMap::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for thread_id in 0..16 {
        let map = Arc::clone(&map);
        let calls = Arc::clone(&calls);
        let handle = thread::spawn(move || {
            let value = map.compute_if_absent("shared", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(thread_id)
            });
            *value.unwrap()
        });
        handles.push(handle);
    }

    let winners: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(winners.iter().all(|&w| w == winners[0]));
    assert_eq!(*map.get(&"shared").unwrap(), winners[0]);
}

#[test]
fn test_put_if_absent_has_single_winner() {
    let map = Arc::new(ShardedMap::new());
    let mut handles = vec![];

    for thread_id in 0..16 {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            map.put_if_absent("slot", thread_id).is_none()
        }));
    }

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_snapshots_grow_monotonically_under_inserts() {
    let map = Arc::new(ShardedMap::new());
    let mut handles = vec![];

    for thread_id in 0..4 {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                map.put(format!("t{}_k{}", thread_id, i), i);
            }
        }));
    }

    let observer = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..200 {
                let entries = map.entries();
                assert!(entries.len() >= last);
                last = entries.len();

                let mut visited = 0;
                map.for_each(|_, _| visited += 1);
                assert!(visited >= last);
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    observer.join().unwrap();

    assert_eq!(map.len(), 2000);
    assert_eq!(map.keys().len(), 2000);
}

#[test]
fn test_clear_races_with_writers() {
    let map = Arc::new(ShardedMap::new());
    let mut handles = vec![];

    for thread_id in 0..4 {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..1000 {
                map.put((thread_id, i), i);
            }
        }));
    }

    let clearer = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            for _ in 0..50 {
                map.clear();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    clearer.join().unwrap();

    assert!(map.len() <= 4000);
    map.clear();
    assert!(map.is_empty());
}
