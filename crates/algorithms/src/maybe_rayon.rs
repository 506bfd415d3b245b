//! rayon or sequential iteration, depending on the `parallel` feature.
//!
//! Algorithms write `(0..rows).into_par_iter()` either way. Without the
//! feature the call resolves to `into_iter()` and the rest of the chain
//! uses the standard `Iterator` adapters.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
