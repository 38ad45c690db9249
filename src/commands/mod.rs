//! CLI command implementations.
//!
//! - **ci**: the full orchestrated run over every configured project
//! - **compare**: compare two report files directly
//! - **init**: write a starter workspace configuration

pub mod ci;
pub mod compare;
pub mod init;

pub use ci::run_ci;
pub use compare::run_compare;
pub use init::init_config;
