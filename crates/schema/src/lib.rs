//! # rulekit-schema
//!
//! Declarative descriptions of form fields and the validation rules attached
//! to them. Everything in this crate is plain data: rules, conditions and
//! messages are deserialized from configuration documents (JSON or YAML) or
//! built in code, and handed to `rulekit-validator` for evaluation.
//!
//! ```rust,ignore
//! use rulekit_schema::prelude::*;
//!
//! let form = FormDef::parse(r#"
//! fields:
//!   - name: pincode
//!     type: text
//!     validation:
//!       - { type: required, message: { en: "PIN Code is required" } }
//!       - { type: regex, pattern: "^\\d{6}$" }
//! "#)?;
//! assert_eq!(form.names().collect::<Vec<_>>(), vec!["pincode"]);
//! ```

pub mod condition;
pub mod error;
pub mod field;
pub mod form;
pub mod message;
pub mod presets;
pub mod rule;
pub mod values;

pub mod prelude {
    pub use crate::condition::{Condition, ConditionTest};
    pub use crate::error::SchemaError;
    pub use crate::field::{FieldDef, FieldKind};
    pub use crate::form::FormDef;
    pub use crate::message::{Message, Severity};
    pub use crate::rule::{
        CrossFieldRule, CustomRule, DateRule, LengthRule, NumberRangeRule, PatternRule, RemoteRule,
        RuleDef, RuleKind, SelectRule,
    };
    pub use crate::values::FormValues;
}
