use serde::{Deserialize, Serialize};
use std::fmt;

const CONTINUATION: u32 = u32::MAX;

/// Position of a branch in the traversal: the root branch index followed by
/// the child index taken at every fan-out.
///
/// Paths are totally ordered (lexicographically), which gives join
/// accumulators an order that does not depend on task scheduling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchPath(Vec<u32>);

impl BranchPath {
    pub fn root(index: u32) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Path of a join continuation started from this (smallest arriving) path
    pub fn continuation(&self) -> Self {
        self.child(CONTINUATION)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for BranchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if *segment == CONTINUATION {
                f.write_str("*")?;
            } else {
                write!(f, "{}", segment)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_depth_first() {
        let a = BranchPath::root(0).child(1);
        let b = BranchPath::root(0).child(1).child(0);
        let c = BranchPath::root(1);
        let d = BranchPath::root(0).child(1).continuation();
        assert!(a < b);
        assert!(b < d);
        assert!(d < c);
        assert_eq!(d.to_string(), "0.1.*");
    }
}
