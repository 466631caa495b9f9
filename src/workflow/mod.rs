pub mod lint;
pub mod upgrade;

pub use lint::{execute_flags, execute_lint, execute_passes};
pub use upgrade::execute_upgrade;
