mod error;
mod machine;
mod value;

pub use error::EvalError;
pub use machine::{Machine, MachineConfig, Outcome};
pub use value::EvalValue;
