//! Store operation instrumentation, compiled away without the `tracing`
//! feature.
//!
//! The store's mutation, query and codec paths mark themselves with these
//! macros. With the `tracing` feature enabled they emit debug-level spans
//! and events; without it the field expressions are still evaluated, so both
//! builds see the same borrows, but nothing else is generated.
//!
//! `op_span!` already enters the span it creates, so call sites bind the
//! guard directly: `let _op = op_span!("store_query", candidates = n);`.
//! When the feature is off the binding is just unit.

#[cfg(feature = "tracing")]
macro_rules! op_span {
    ($name:expr, $($field:ident = $value:expr),+ $(,)?) => {
        tracing::debug_span!($name, $($field = $value),+).entered()
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! op_span {
    ($name:expr, $($field:ident = $value:expr),+ $(,)?) => {{
        let _ = ($($value),+);
    }};
}

#[cfg(feature = "tracing")]
macro_rules! op_event {
    ($name:expr, $($field:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($field = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! op_event {
    ($name:expr, $($field:ident = $value:expr),+ $(,)?) => {{
        let _ = ($($value),+);
    }};
}

pub(crate) use op_event;
pub(crate) use op_span;
