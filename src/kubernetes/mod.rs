pub mod containers;
pub mod exec;
pub mod kinds;

pub use exec::{CommandSpec, exit_code};
pub use kinds::KindRegistry;
