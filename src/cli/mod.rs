pub mod doctor;
pub mod install;

pub use doctor::doctor;
pub use install::{InstallCommand, InstallTarget};
