pub mod constants;
pub mod sse;
pub mod test_helpers;
pub mod types;
pub mod validation;
