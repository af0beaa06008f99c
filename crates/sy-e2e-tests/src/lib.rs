//! End-to-end scenarios for switchyard live in `tests/`; this crate has no
//! library code of its own.
