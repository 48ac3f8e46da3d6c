//! Rule selection and execution.
//!
//! - [`rule::Rule`] is the contract every rule implements
//! - [`registry::RuleRegistry`] layers host, project and extension rules
//! - [`fields`] applies typed `key=value` options
//! - [`runner::run`] turns source units into [`result::EditResult`]s
//! - [`extension::ExtensionLoader`] adds rule packages before selection

pub mod builtin;
pub mod declarative;
pub mod errors;
pub mod extension;
pub mod fields;
pub mod registry;
pub mod result;
pub mod rule;
pub mod runner;

pub use declarative::{DeclarativeDefinition, RULE_DOCUMENT_TYPE, parse_definitions};
pub use errors::{FieldConfigError, RuleError};
pub use extension::{ExtensionLoader, LoadedExtensions};
pub use fields::{FieldKind, FieldSpec, FieldValue, configure, parse_options};
pub use registry::{RegistryLayer, RuleRegistry};
pub use result::EditResult;
pub use rule::{Rule, UnitEdit, validate_all};
pub use runner::{RunOutcome, run};
