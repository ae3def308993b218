pub mod catalog;
mod deployer;

pub use deployer::Deployer;
