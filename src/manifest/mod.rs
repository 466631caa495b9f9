pub mod editor;
pub mod snapshot;

pub use editor::{ManifestBuffer, key_assignment_pattern};
pub use snapshot::{Bump, DependencyChange, DependencySnapshot};
