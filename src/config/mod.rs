//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in agent defaults
//! 2. Config file (`--config`, or ~/.config/beacon-agent/agent.toml)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{default_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
pub use settings::{AgentConfig, TimeoutSettings};
