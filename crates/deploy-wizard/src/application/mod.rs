//! Application specification: model, defaulting and validation.

pub mod defaults;
pub mod model;
pub mod validation;

pub use defaults::{apply_defaults, Defaults};
pub use model::*;
pub use validation::{
    is_valid_dns_name, parse_application, validate_application, validate_payload, ErrorNode,
    ErrorTree,
};
