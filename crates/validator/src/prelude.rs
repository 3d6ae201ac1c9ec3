//! Single import for callers.
//!
//! ```rust,ignore
//! use rulekit_validator::prelude::*;
//! ```

// ============================================================================
// SCHEMA: field, rule and value descriptions
// ============================================================================

pub use rulekit_schema::prelude::*;

// ============================================================================
// ENGINE
// ============================================================================

pub use crate::config::{ValidationMode, ValidatorConfig};
pub use crate::engine::{Validator, ValidatorBuilder};
pub use crate::outcome::{FieldOutcome, FormOutcome, RuleFailure};

// ============================================================================
// EXTENSION POINTS
// ============================================================================

pub use crate::custom::{CustomPredicate, CustomRegistry};
pub use crate::error::{PredicateError, RegistryError};
pub use crate::registry::{Failure, RuleHandler, RuleInput, RuleRegistry, RuleVerdict, handler_fn};
pub use crate::remote::RemoteClient;
