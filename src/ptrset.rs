//! Fast hash set for pointer identity.
//!
//! With a forward-only tree (the 2-link pairing and leftist heaps) detecting
//! cross-linking is tricky. The best we can do is checking whether a node
//! has been seen before or not, and this set is designed exactly for that
//! purpose: closed addressing, double hashing, no stored payload beyond the
//! pointer value itself.

use crate::traits::HeapError;

/// One row of the precomputed size family.
struct TableInfo {
    /// capacity limit before the next rehash
    tcap: u32,
    /// table length, also the range multiplier for the initial slot
    tlen: u32,
    /// per-table bias folded into the initial slot
    bias: u32,
}

// The table family is constructed according to a few rules:
//
// First, the probing steps we calculate are in the range [1,128], so the
// table length must be coprime to all primes <= 128. (This ensures that
// every probing step WILL visit the whole table!)
//
// Second, the table length should grow roughly exponentially, but not too
// fast: we take approximately GOLDEN**N as the starting point and use the
// closest number that satisfies the coprimality constraint.
//
// (Using the golden ratio, (1 + sqrt(5)) / 2)
#[rustfmt::skip]
const TABLE_INFO: &[TableInfo] = &[
    /* 11 */ TableInfo { tcap:       132, tlen:       199, bias:        46 },
    /* 12 */ TableInfo { tcap:       211, tlen:       317, bias:       232 },
    /* 13 */ TableInfo { tcap:       347, tlen:       521, bias:       117 },
    /* 14 */ TableInfo { tcap:       559, tlen:       839, bias:       446 },
    /* 15 */ TableInfo { tcap:       911, tlen:      1367, bias:       932 },
    /* 16 */ TableInfo { tcap:      1471, tlen:      2207, bias:      1841 },
    /* 17 */ TableInfo { tcap:      2380, tlen:      3571, bias:       611 },
    /* 18 */ TableInfo { tcap:      3852, tlen:      5779, bias:      2938 },
    /* 19 */ TableInfo { tcap:      6232, tlen:      9349, bias:      8649 },
    /* 20 */ TableInfo { tcap:     10087, tlen:     15131, bias:      2684 },
    /* 21 */ TableInfo { tcap:     16315, tlen:     24473, bias:      4742 },
    /* 22 */ TableInfo { tcap:     26400, tlen:     39601, bias:      1240 },
    /* 23 */ TableInfo { tcap:     42719, tlen:     64079, bias:      8242 },
    /* 24 */ TableInfo { tcap:     69120, tlen:    103681, bias:     85552 },
    /* 25 */ TableInfo { tcap:    111839, tlen:    167759, bias:      1378 },
    /* 26 */ TableInfo { tcap:    180960, tlen:    271441, bias:    227794 },
    /* 27 */ TableInfo { tcap:    292804, tlen:    439207, bias:    401250 },
    /* 28 */ TableInfo { tcap:    473760, tlen:    710641, bias:    563733 },
    /* 29 */ TableInfo { tcap:    766568, tlen:   1149853, bias:    266341 },
    // beyond this point, the table sizes become more academical than practical:
    /* 30 */ TableInfo { tcap:   1240327, tlen:   1860491, bias:    954068 },
    /* 31 */ TableInfo { tcap:   2006899, tlen:   3010349, bias:   2209622 },
    /* 32 */ TableInfo { tcap:   3247231, tlen:   4870847, bias:   3751089 },
    /* 33 */ TableInfo { tcap:   5254131, tlen:   7881197, bias:   7596128 },
    /* 34 */ TableInfo { tcap:   8501360, tlen:  12752041, bias:  10281520 },
    /* 35 */ TableInfo { tcap:  13755491, tlen:  20633237, bias:   3254000 },
    /* 36 */ TableInfo { tcap:  22256852, tlen:  33385279, bias:  21651584 },
    /* 37 */ TableInfo { tcap:  36012347, tlen:  54018521, bias:  27504137 },
    /* 38 */ TableInfo { tcap:  58269200, tlen:  87403801, bias:  12181047 },
    /* 39 */ TableInfo { tcap:  94281552, tlen: 141422329, bias:  52297426 },
    /* 40 */ TableInfo { tcap: 152550748, tlen: 228826123, bias: 176097082 },
    /* 41 */ TableInfo { tcap: 246832300, tlen: 370248451, bias: 222234335 },
];

/// Hash set over raw pointer values.
///
/// Used by the 2-link validators to detect nodes that are reachable on more
/// than one path. The set never dereferences the pointers it stores.
#[derive(Debug)]
pub struct PointerSet {
    table: Vec<*const ()>,
    tinfo: usize,
    used: usize,
}

impl PointerSet {
    /// Creates a set sized for up to `n` distinct pointers.
    ///
    /// Fails with [`HeapError::CapacityExceeded`] when `n` is beyond the
    /// largest table in the size family.
    pub fn with_capacity(n: usize) -> Result<Self, HeapError> {
        let tinfo = TABLE_INFO
            .iter()
            .position(|info| n <= info.tcap as usize)
            .ok_or(HeapError::CapacityExceeded)?;
        Ok(PointerSet {
            table: vec![std::ptr::null(); TABLE_INFO[tinfo].tlen as usize],
            tinfo,
            used: 0,
        })
    }

    /// Number of slots in the current table.
    pub fn capacity(&self) -> usize {
        TABLE_INFO[self.tinfo].tlen as usize
    }

    /// Number of entries the current table holds before rehashing.
    pub fn limit(&self) -> usize {
        TABLE_INFO[self.tinfo].tcap as usize
    }

    /// Number of pointers stored.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bit-twiddler based on the Jenkins OAT finalizer.
    ///
    /// The arithmetic runs in 64 bits and the result is folded down to 32;
    /// folding beats truncation because it keeps the entropy of the high
    /// half of the address.
    pub fn hash_ptr(ptr: *const ()) -> u32 {
        let mut key = ptr as usize as u64;
        key = key.wrapping_add(key << 12);
        key ^= key >> 22;
        key = key.wrapping_add(key << 4);
        key ^= key >> 9;
        key = key.wrapping_add(key << 10);
        key ^= key >> 2;
        key = key.wrapping_add(key << 7);
        key ^= key >> 12;
        key ^= key >> 32;
        key as u32
    }

    /// Inserts a pointer; returns `true` iff it was absent.
    pub fn insert(&mut self, p: *const ()) -> Result<bool, HeapError> {
        let (mut slot, step) = self.step_info(p);
        while !self.table[slot].is_null() && self.table[slot] != p {
            slot += step;
            if slot >= self.table.len() {
                slot -= self.table.len();
            }
        }
        let absent = self.table[slot].is_null();
        if absent {
            self.table[slot] = p;
            self.used += 1;
            if self.used > self.limit() {
                self.rehash()?;
            }
        }
        Ok(absent)
    }

    /// Membership test without insertion.
    pub fn lookup(&self, p: *const ()) -> bool {
        let (mut slot, step) = self.step_info(p);
        while !self.table[slot].is_null() && self.table[slot] != p {
            slot += step;
            if slot >= self.table.len() {
                slot -= self.table.len();
            }
        }
        !self.table[slot].is_null()
    }

    fn rehash(&mut self) -> Result<(), HeapError> {
        if self.tinfo + 1 >= TABLE_INFO.len() {
            return Err(HeapError::CapacityExceeded);
        }
        self.tinfo += 1;
        let holder = std::mem::replace(
            &mut self.table,
            vec![std::ptr::null(); TABLE_INFO[self.tinfo].tlen as usize],
        );
        self.used = 0;
        for p in holder {
            if !p.is_null() {
                self.insert(p)?;
            }
        }
        Ok(())
    }

    /// Initial slot and probing step for a pointer.
    ///
    /// The step is in [1,128], which the table length is coprime to, so
    /// probing walks the whole table. The initial slot maps the 32-bit hash
    /// onto [0,tlen) by the multiply-shift trick, with a per-table bias so
    /// consecutive tables do not cluster the same keys.
    fn step_info(&self, p: *const ()) -> (usize, usize) {
        let phash = Self::hash_ptr(p);
        let step = ((phash & 127) + 1) as usize;
        let info = &TABLE_INFO[self.tinfo];
        let slot = ((phash as u64 * info.tlen as u64 + info.bias as u64) >> 32) as usize;
        assert!(slot < self.table.len(), "hash index mapping");
        (slot, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(n: usize) -> *const () {
        n as *const ()
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set = PointerSet::with_capacity(100).unwrap();
        assert!(set.insert(ptr(0x1000)).unwrap());
        assert!(set.insert(ptr(0x2000)).unwrap());
        assert!(!set.insert(ptr(0x1000)).unwrap());
        assert_eq!(set.used(), 2);
    }

    #[test]
    fn lookup_matches_insert() {
        let mut set = PointerSet::with_capacity(50).unwrap();
        for i in 1..=50usize {
            set.insert(ptr(i * 64)).unwrap();
        }
        for i in 1..=50usize {
            assert!(set.lookup(ptr(i * 64)));
        }
        assert!(!set.lookup(ptr(3)));
    }

    #[test]
    fn rehash_preserves_members() {
        let mut set = PointerSet::with_capacity(10).unwrap();
        let limit = set.limit();
        // push past the first table's capacity to force at least one rehash
        for i in 1..=(limit * 3) {
            assert!(set.insert(ptr(i * 8)).unwrap());
        }
        assert!(set.limit() > limit);
        assert_eq!(set.used(), limit * 3);
        for i in 1..=(limit * 3) {
            assert!(!set.insert(ptr(i * 8)).unwrap());
        }
    }

    #[test]
    fn oversized_request_fails() {
        assert_eq!(
            PointerSet::with_capacity(usize::MAX).unwrap_err(),
            HeapError::CapacityExceeded
        );
    }

    #[test]
    fn hash_spreads_aligned_pointers() {
        // heap nodes are typically allocated with the same alignment; the
        // finalizer must not collapse them onto a few slots
        let mut seen = std::collections::HashSet::new();
        for i in 0..1000usize {
            seen.insert(PointerSet::hash_ptr(ptr(0x10_0000 + i * 32)) & 127);
        }
        assert!(seen.len() > 100, "only {} of 128 step classes hit", seen.len());
    }
}
