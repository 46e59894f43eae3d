//! Title Form Core
//!
//! Declarative field registry, rule interpreter and form state controller
//! for the vehicle title application wizard.
//!
//! The registry is read-only after construction; the controller owns the
//! live [`shared_types::FormState`] and revalidates the entire form on every
//! update.

pub mod calendar;
pub mod config;
pub mod controller;
pub mod error;
pub mod patterns;
pub mod registry;
pub mod rules;
pub mod title;

pub use calendar::{Clock, FixedClock, SystemClock};
pub use config::{FormConfig, HiddenFieldPolicy};
pub use controller::{FormController, UpdateOutcome};
pub use error::{FormError, RegistryError};
pub use registry::{
    DefaultValue, FieldDefinition, FieldKind, FieldRegistry, Section, SectionProgress, SectionSpec,
};
pub use rules::{Bound, Condition, Rule, REQUIRED_MESSAGE};
pub use title::title_registry;
