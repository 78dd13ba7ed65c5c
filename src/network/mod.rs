//! Network module: platform capabilities and local interface enumeration

pub mod interface;
pub mod platform;

pub use interface::{available_networks, is_ignored_interface, NamedNetwork};
pub use platform::{Platform, SystemPlatform};
