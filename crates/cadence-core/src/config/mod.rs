//! Configuration traits and validation shared by every Cadence crate

pub mod traits;
pub mod validation;

pub use traits::{parse_value, CadenceConfig, ENV_PREFIX};
pub use validation::{into_config_error, ConfigValidator, ValidationError, ValidationResult};
