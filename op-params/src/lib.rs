pub mod args;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod parameter;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use parameter::Parameter;
pub use registry::{ParameterRegistry, SharedRegistry};
pub use types::{ParameterSource, ParameterState, ValidationRule};

pub trait Builder {
    type Output;
    fn build(self) -> Result<Self::Output>;
}
