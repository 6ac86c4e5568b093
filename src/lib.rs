//! Declarative validation and filtering for nested form records.
//!
//! The core is a rule interpreter: named, parameterized checks evaluated
//! against fields of an arbitrarily nested record, with cross-field value
//! references inside rule parameters, rule negation, early-exit ("quick")
//! evaluation, recursive per-element validation of sequence fields, and
//! redirection of a failing rule's error onto other fields. A companion
//! filter pipeline transforms values sequentially with the same addressing
//! and reference mechanics.
//!
//! ```text
//! parse(yaml) → Schema → Form ← set_raw_data(record)
//!                        ├─ apply_filters() → filtered record (+ warnings)
//!                        └─ is_valid() / validate() / errors()
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! let schema = r#"
//! rules:
//!   email: [required, email]
//!   age: { numeric: null, fl_range: "[18,)" }
//! filters:
//!   name: [trim, person_name]
//! "#;
//!
//! let mut form = formval::load(schema).expect("valid schema");
//! form.set_raw_data(serde_json::json!({
//!     "email": "ada@example.com",
//!     "age": "36",
//!     "name": "  ada   lovelace ",
//! }));
//! form.apply_filters();
//!
//! assert!(form.is_valid().expect("rules resolve"));
//! assert_eq!(form.get("name"), Some(serde_json::json!("Ada Lovelace")));
//! ```
//!
//! Everything also works without YAML: build a [`Form`] (or a bare
//! [`Validator`]) directly and register rules, filters and messages as
//! `serde_json::Value` declarations.

pub mod error;
pub mod filter;
pub mod form;
pub mod normalize;
pub mod parse;
pub mod primitives;
pub mod rules;
pub mod validate;

pub use error::*;
pub use form::Form;
pub use parse::Schema;
pub use validate::Validator;

// Re-export entry-point functions at the crate root for convenience.
pub use parse::parse;

/// Convenience entry point composing parse → [`Form`] construction.
///
/// # Errors
///
/// Returns [`FormError::Parse`] when the schema document cannot be loaded.
///
/// # Example
///
/// ```rust
/// let schema = r#"
/// rules:
///   drinks: { array: { in: [juice, cola, tea] } }
/// "#;
///
/// match formval::load(schema) {
///     Ok(_form) => println!("session ready"),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load(input: &str) -> Result<Form, FormError> {
    let schema = parse::parse(input)?;
    Ok(schema.into_form())
}
