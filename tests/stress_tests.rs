//! One simple load test: concurrent puts, compound updates and removes, then verify state and introspection.

use sharded_map::ShardedMap;
use std::sync::Arc;
use std::thread;

#[test]
fn test_under_load_then_introspect() {
    let map = Arc::new(ShardedMap::new());
    let mut handles = vec![];

    for t in 0..4 {
        let map = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for i in 0..2000 {
                let key = format!("t{}_k{}", t, i);
                map.put(key, i);
            }
            for i in 0..2000 {
                let key = format!("t{}_k{}", t, i);
                map.compute_if_present(&key, |_| Some(i + 1));
            }
            for i in 0..2000 {
                let key = format!("t{}_k{}", t, i);
                assert!(map.remove_if_equals(&key, &(i + 1)));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    let loads = map.segment_loads();
    assert_eq!(loads.len(), 8);
    assert_eq!(loads.iter().sum::<usize>(), 0);
    assert_eq!(map.diagnostics().total_entries, 0);
}
