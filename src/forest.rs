//! Arena-indexed union-find over dense u32 labels.
//!
//! Both the connectivity repair scan and the weak-boundary merge build a
//! transient equivalence forest during a single raster pass and flatten it
//! once at the end. Parent index 0 marks a root, which keeps label 0 out of
//! the forest (it is either the boundary sentinel or unused). Unions always
//! attach the larger root under the smaller one, so parents strictly
//! decrease along any chain; that makes the single-pass flatten below valid
//! and the representative choice deterministic.

pub(crate) struct Forest {
    parent: Vec<u32>,
}

impl Forest {
    /// Forest over labels `1..len`. Label 0 is never unioned.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: vec![0; len.max(1)],
        }
    }

    /// Mint a fresh singleton label at the end of the arena.
    pub(crate) fn mint(&mut self) -> u32 {
        self.parent.push(0);
        (self.parent.len() - 1) as u32
    }

    /// Representative of `t`'s class, with path compression.
    pub(crate) fn find(&mut self, t: u32) -> u32 {
        let mut root = t;
        while self.parent[root as usize] != 0 {
            root = self.parent[root as usize];
        }
        let mut cur = t;
        while cur != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Union the classes of `a` and `b`; the smaller root wins.
    /// Returns the surviving representative.
    pub(crate) fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        lo
    }

    /// Flatten into a direct old→new mapping, numbering surviving roots
    /// consecutively from `first` in ascending label order. Entry 0 stays 0.
    pub(crate) fn flatten(self, first: u32) -> (Vec<u32>, u32) {
        let mut map = vec![0u32; self.parent.len()];
        let mut next = first;
        for t in 1..self.parent.len() {
            let p = self.parent[t];
            map[t] = if p == 0 {
                let v = next;
                next += 1;
                v
            } else {
                // Parents are strictly smaller, so map[p] is already final.
                map[p as usize]
            };
        }
        (map, next - first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_number_consecutively() {
        let f = Forest::new(5);
        let (map, count) = f.flatten(1);
        assert_eq!(map[1..], [1, 2, 3, 4]);
        assert_eq!(count, 4);
    }

    #[test]
    fn union_keeps_smaller_representative() {
        let mut f = Forest::new(6);
        assert_eq!(f.union(4, 2), 2);
        assert_eq!(f.union(5, 4), 2);
        assert_eq!(f.find(5), 2);
        let (map, count) = f.flatten(1);
        assert_eq!(count, 3);
        assert_eq!(map[2], map[4]);
        assert_eq!(map[2], map[5]);
        assert_ne!(map[1], map[2]);
        assert_eq!(map[1], 1);
        assert_eq!(map[3], 3);
    }

    #[test]
    fn flatten_resolves_chains() {
        let mut f = Forest::new(8);
        f.union(7, 6);
        f.union(6, 3);
        f.union(3, 1);
        let (map, count) = f.flatten(1);
        assert_eq!(count, 4);
        for t in [1u32, 3, 6, 7] {
            assert_eq!(map[t as usize], 1);
        }
    }
}
