//! Internal utilities, not part of the API

// re-exported for use by the integration tests
#[doc(hidden)]
pub mod testing;
