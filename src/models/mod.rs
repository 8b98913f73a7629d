// Re-export all model types
pub use self::errors::*;
pub use self::food::*;
pub use self::validation::*;

mod errors;
mod food;
mod validation;
