pub mod types;

pub use types::{ErrorMap, FieldValue, FormState, SignatureEntry};
