//! `LineMap`: a pid-keyed table mapping live child pids to task numbers
//! (spec §4.5), used by the reaper to look up which task just exited.
//!
//! Ported from the original `hash_table.c`: separate chaining over a
//! power-of-two bucket array, FNV-1a hashing of the pid's raw bytes, and the
//! same grow/shrink thresholds (load factor 3/4 to grow, 3/16 to shrink,
//! never below the minimum bucket count). Unlike the C table this one is not
//! manually managed — buckets are `Vec<(i32, u64)>` chains instead of a
//! hand-rolled linked list, since Rust's allocator already gives us that for
//! free.

const MINIMAL_SIZE: usize = 64;

const FNV_BASE: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

fn fnv_hash(pid: i32) -> u64 {
    let bytes = (pid as i64 as u64).to_ne_bytes();
    let mut hash = FNV_BASE;
    for byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A chained hash table from child pid to task number.
pub struct LineMap {
    buckets: Vec<Vec<(i32, u64)>>,
    elements: usize,
}

impl LineMap {
    pub fn new() -> Self {
        Self {
            buckets: (0..MINIMAL_SIZE).map(|_| Vec::new()).collect(),
            elements: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements == 0
    }

    fn bucket_index(&self, pid: i32) -> usize {
        (fnv_hash(pid) % self.buckets.len() as u64) as usize
    }

    pub fn insert(&mut self, pid: i32, task: u64) {
        let index = self.bucket_index(pid);
        self.buckets[index].push((pid, task));
        self.elements += 1;
        self.check_table();
    }

    /// Remove `pid`, returning its task number if present.
    ///
    /// The original `ht_remove` returns `0` as a not-found sentinel; since a
    /// task number of `0` is a legitimate value in this crate, `remove`
    /// returns `Option<u64>` instead.
    pub fn remove(&mut self, pid: i32) -> Option<u64> {
        let index = self.bucket_index(pid);
        let bucket = &mut self.buckets[index];
        let position = bucket.iter().position(|&(key, _)| key == pid)?;
        let (_, task) = bucket.remove(position);
        self.elements -= 1;
        self.check_table();
        Some(task)
    }

    fn check_table(&mut self) {
        let size = self.buckets.len();

        let new_size = if 4 * self.elements > 3 * size {
            Some(size * 2)
        } else if size != MINIMAL_SIZE && 16 * self.elements <= 3 * size {
            Some(size / 2)
        } else {
            None
        };

        let Some(new_size) = new_size else { return };

        let mut new_buckets: Vec<Vec<(i32, u64)>> = (0..new_size).map(|_| Vec::new()).collect();
        for bucket in self.buckets.drain(..) {
            for (pid, task) in bucket {
                let index = (fnv_hash(pid) % new_size as u64) as usize;
                new_buckets[index].push((pid, task));
            }
        }
        self.buckets = new_buckets;
    }
}

impl Default for LineMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_round_trips() {
        let mut map = LineMap::new();
        map.insert(42, 7);
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove(42), Some(7));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn remove_missing_pid_returns_none() {
        let mut map = LineMap::new();
        map.insert(1, 0);
        assert_eq!(map.remove(999), None);
    }

    #[test]
    fn task_number_zero_is_distinguishable_from_absence() {
        let mut map = LineMap::new();
        map.insert(5, 0);
        assert_eq!(map.remove(5), Some(0));
        assert_eq!(map.remove(5), None);
    }

    #[test]
    fn grows_past_minimum_under_load() {
        let mut map = LineMap::new();
        for pid in 0..100 {
            map.insert(pid, pid as u64);
        }
        assert!(map.buckets.len() > MINIMAL_SIZE);
        assert_eq!(map.len(), 100);
        for pid in 0..100 {
            assert_eq!(map.remove(pid), Some(pid as u64));
        }
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn shrinks_back_but_never_below_minimum() {
        let mut map = LineMap::new();
        for pid in 0..200 {
            map.insert(pid, pid as u64);
        }
        for pid in 0..199 {
            map.remove(pid);
        }
        assert!(map.buckets.len() >= MINIMAL_SIZE);
    }

    #[test]
    fn distinct_pids_with_same_task_are_independent() {
        let mut map = LineMap::new();
        map.insert(1, 100);
        map.insert(2, 100);
        assert_eq!(map.remove(1), Some(100));
        assert_eq!(map.remove(2), Some(100));
    }
}
