mod check_config;
mod simulate;
mod validate;

pub use check_config::{CheckConfigArgs, run_check_config};
pub use simulate::{SimulateArgs, run_simulate};
pub use validate::{ValidateArgs, run_validate};
