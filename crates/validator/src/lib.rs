//! # rulekit-validator
//!
//! Evaluates the rules described by `rulekit-schema` against submitted form
//! values.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rulekit_validator::prelude::*;
//!
//! let validator = Validator::new();
//! let form = FormDef::from_yaml(include_str!("signup.yaml"))?;
//! let values = FormValues::from_json(body);
//!
//! let outcome = validator.validate_form(&form, &values, Some("hi")).await;
//! for (field, message) in outcome.messages() {
//!     println!("{field}: {message}");
//! }
//! ```
//!
//! ## Pipeline
//!
//! For every rule of a field, in declared order:
//!
//! 1. the rule's `when` clause is checked against the peer values
//!    ([`condition`]);
//! 2. the raw value is normalized ([`normalize`]);
//! 3. the handler registered for the rule's tag runs ([`registry`],
//!    [`builtin`], [`custom`], [`remote`]);
//! 4. a failure picks its message by locale and is collected
//!    ([`outcome`]).
//!
//! [`Validator`] ties these together and runs fields of a form concurrently.

pub mod builtin;
pub mod condition;
pub mod config;
pub mod custom;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod outcome;
pub mod prelude;
pub mod registry;
pub mod remote;

pub use config::{ValidationMode, ValidatorConfig};
pub use custom::{CustomPredicate, CustomRegistry};
pub use engine::{Validator, ValidatorBuilder};
pub use error::{PredicateError, RegistryError};
pub use outcome::{FieldOutcome, FormOutcome, RuleFailure};
pub use registry::{RuleHandler, RuleRegistry, RuleVerdict};
pub use remote::RemoteClient;
