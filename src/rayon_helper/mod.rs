//! Serial/parallel iterator switches. With the `parallel` feature the state vector is walked
//! with rayon, otherwise with plain iterators. The macros are only used inside the crate.

#[cfg(feature = "parallel")]
macro_rules! state_iter {
    ($e:expr) => {
        $e.par_iter()
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! state_iter {
    ($e:expr) => {
        $e.iter()
    };
}

#[cfg(feature = "parallel")]
macro_rules! state_iter_mut {
    ($e:expr) => {
        $e.par_iter_mut()
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! state_iter_mut {
    ($e:expr) => {
        $e.iter_mut()
    };
}
