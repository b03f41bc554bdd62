//! Logging facilities for Champ.
//!
//! Champ uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("champ_core::model=trace")
//!         .init();
//! }
//! ```
//!
//! Model writes and bus deliveries are logged at `trace` level, declarations
//! and resets at `debug` level.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "champ_core";
    /// Model instance target (reads, writes, resets).
    pub const MODEL: &str = "champ_core::model";
    /// Event bus target.
    pub const BUS: &str = "champ_core::bus";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "champ_core::signal";
    /// Model type registry target.
    pub const REGISTRY: &str = "champ_core::registry";
    /// Configuration parsing target.
    pub const CONFIG: &str = "champ_core::config";
}
