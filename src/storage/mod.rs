//! Configuration, platform paths, and the read-only token ledger.

pub mod config;
pub mod ledger;
pub mod paths;

pub use config::{
    Config, ConfigSource, ConfigSources, ENV_CONFIG, ENV_FORMAT, ENV_LEDGER, ENV_NO_COLOR,
    ENV_NO_COLOR_STD, ENV_OUTBOX, ENV_PRETTY, ENV_VERBOSE, ResolvedConfig,
};
pub use ledger::{UsageLedger, load_cost_summary};
pub use paths::AppPaths;
