//! Concrete provider integrations.

mod acquia;
mod pantheon;

pub use acquia::Acquia;
pub use pantheon::Pantheon;
