//! Ready-made field definitions for common inputs.
//!
//! Each preset is an ordinary [`FieldDef`]; adjust it with the builder
//! methods or push extra rules onto `validation`.

use crate::condition::Condition;
use crate::field::{FieldDef, FieldKind};
use crate::message::Message;
use crate::rule::{DateRule, LengthRule, RuleDef};

/// Shared email shape, also used by the alternate email preset.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Full name: letters and spaces, 2 to 50 characters (length is a warning).
#[must_use]
pub fn full_name(name: impl Into<String>) -> FieldDef {
    FieldDef::text(name)
        .with_label("Full Name")
        .rule(RuleDef::required().with_message(
            Message::localized("en", "Name is required").with_translation("hi", "नाम आवश्यक है"),
        ))
        .rule(
            RuleDef::pattern(r"^[A-Za-z\s]+$")
                .with_message("Name can only contain letters and spaces"),
        )
        .rule(RuleDef::length(LengthRule::between(2, 50)).warning())
}

/// Six digit Indian postal code.
#[must_use]
pub fn pincode(name: impl Into<String>) -> FieldDef {
    FieldDef::text(name)
        .with_label("PIN Code")
        .rule(RuleDef::required().with_message(
            Message::localized("en", "PIN Code is required")
                .with_translation("hi", "पिन कोड आवश्यक है"),
        ))
        .rule(RuleDef::pattern("^[0-9]{6}$").with_message("PIN Code must be 6 digits"))
        .rule(RuleDef::length(LengthRule::exactly(6)))
}

#[must_use]
pub fn email(name: impl Into<String>) -> FieldDef {
    FieldDef::email(name)
        .with_label("Email")
        .rule(RuleDef::required().with_message("Email is required"))
        .rule(RuleDef::pattern(EMAIL_PATTERN).with_message("Enter a valid email address"))
}

/// Optional secondary email. A bad shape is only a warning, and only once
/// something has been typed.
#[must_use]
pub fn alternate_email(name: impl Into<String>) -> FieldDef {
    let name = name.into();
    FieldDef::email(name.clone())
        .with_label("Alternate Email")
        .rule(
            RuleDef::pattern(EMAIL_PATTERN)
                .with_message("This email looks unusual")
                .warning()
                .when(Condition::on(name).not_empty()),
        )
}

/// Ten digit Indian mobile number.
#[must_use]
pub fn phone(name: impl Into<String>) -> FieldDef {
    FieldDef::new(name, FieldKind::Tel)
        .with_label("Phone")
        .rule(RuleDef::required().with_message("Phone number is required"))
        .rule(RuleDef::pattern("^[6-9][0-9]{9}$").with_message("Enter a valid 10 digit mobile number"))
}

#[must_use]
pub fn gender(name: impl Into<String>) -> FieldDef {
    FieldDef::new(name, FieldKind::Select)
        .with_label("Gender")
        .with_options(["Male", "Female", "Other"])
        .rule(RuleDef::required().with_message("Please select a gender"))
        .rule(RuleDef::select(["Male", "Female", "Other"]))
}

/// Must equal the value of `password_field`.
#[must_use]
pub fn confirm_password(name: impl Into<String>, password_field: impl Into<String>) -> FieldDef {
    FieldDef::new(name, FieldKind::Password)
        .with_label("Confirm Password")
        .rule(RuleDef::required().with_message("Please confirm your password"))
        .rule(RuleDef::cross_field(password_field).with_message("Passwords must match"))
}

/// Date of birth: strictly before the evaluation date.
#[must_use]
pub fn date_of_birth(name: impl Into<String>) -> FieldDef {
    FieldDef::new(name, FieldKind::Date)
        .with_label("Date of Birth")
        .rule(RuleDef::required().with_message("Date of birth is required"))
        .rule(RuleDef::date(DateRule::past()))
}

/// Indian PAN (permanent account number), checked upper-cased.
#[must_use]
pub fn pan(name: impl Into<String>) -> FieldDef {
    FieldDef::text(name)
        .with_label("PAN")
        .rule(RuleDef::required().with_message("PAN is required"))
        .rule(RuleDef::other("pan").uppercase())
}

/// Indian bank branch code, e.g. `SBIN0001234`.
#[must_use]
pub fn ifsc(name: impl Into<String>) -> FieldDef {
    FieldDef::text(name)
        .with_label("IFSC Code")
        .with_length_hint(Some(11), Some(11))
        .rule(RuleDef::required().with_message("IFSC Code is required"))
        .rule(
            RuleDef::pattern("^[A-Z]{4}0[A-Z0-9]{6}$")
                .uppercase()
                .with_message("Invalid IFSC format (e.g., SBIN0001234)"),
        )
        .rule(
            RuleDef::length(LengthRule {
                eq_message: Some("IFSC Code must be exactly 11 characters".into()),
                ..LengthRule::exactly(11)
            }),
        )
}

#[must_use]
pub fn aadhaar(name: impl Into<String>) -> FieldDef {
    FieldDef::text(name)
        .with_label("Aadhaar Number")
        .with_length_hint(Some(12), Some(12))
        .rule(RuleDef::required().with_message("Aadhaar is required"))
        .rule(RuleDef::other("aadhaar").with_message("Aadhaar must be exactly 12 digits"))
}
