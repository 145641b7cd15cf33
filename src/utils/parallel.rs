//! Optional data parallelism.
//!
//! With the `parallel` feature the grid scans in `ops` run on Rayon's thread pool; without it
//! the same call sites compile against a serial shim that forwards to [`Iterator`].

#[cfg(feature = "parallel")]
pub use rayon::prelude::{IntoParallelIterator, ParallelIterator};

#[cfg(not(feature = "parallel"))]
pub use self::serial::*;

#[cfg(not(feature = "parallel"))]
mod serial {
    pub use std::iter::Iterator as ParallelIterator;

    /// Serial stand-in for Rayon's `into_par_iter()`.
    pub trait IntoParallelIterator {
        type Item;
        type Iter: Iterator<Item = Self::Item>;

        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Item = I::Item;
        type Iter = I::IntoIter;

        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_par_iter_keeps_order_on_collect() {
        let squares: Vec<u32> = (0u32..64)
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter(|n| n % 3 == 0)
            .map(|n| n * n)
            .collect();

        let expected: Vec<u32> = (0u32..64).filter(|n| n % 3 == 0).map(|n| n * n).collect();
        assert_eq!(squares, expected);
    }
}
