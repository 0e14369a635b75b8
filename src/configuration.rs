//! Config for the arbiter behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`]. The `arbiter` binary starts from
//! the environment and lets its command-line flags override it.
//!
//! # Environment Variables
//!
//! All values are optional, and case-insensitive. Set the value to `"true"` to enable a flag.
//!
//! - `ARBITER_VERBOSE`: Trace every move in the arbiter's own log (default: `false`)
//! - `ARBITER_LOG`: Write the arbiter's own log to a time-stamped file instead of stderr (default: `false`)

/// Where the players' standard error goes, per match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogPolicy {
    /// Thrown away.
    #[default]
    Discard,
    /// Mixed into the arbiter's standard error.
    Forward,
    /// One file per player and match, named `<prefix><game:04>_<p1|p2>_<white|black>`.
    Files(String),
}

impl LogPolicy {
    /// Interprets a `--logs` value: absent discards, `-` forwards, anything else is a prefix.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => LogPolicy::Discard,
            Some("-") => LogPolicy::Forward,
            Some(prefix) => LogPolicy::Files(prefix.to_owned()),
        }
    }
}

/// Configuration for arbiter behaviors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) rounds: i32,
    pub(crate) logs: LogPolicy,
    pub(crate) verbose: bool,
    pub(crate) log_to_file: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - A single match is played.
    /// - Player diagnostics are discarded.
    /// - The arbiter logs at `INFO` level to stderr.
    pub fn new() -> Self {
        Self {
            rounds: 0,
            logs: LogPolicy::Discard,
            verbose: false,
            log_to_file: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `ARBITER_VERBOSE`: if set to `"true"`, enables verbose logging (default: `false`)
    /// - `ARBITER_LOG`: if set to `"true"`, logs to a file (default: `false`)
    ///
    /// Any other value (including unset) will result in using the default value for each field.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        Self {
            verbose: get_env_flag("ARBITER_VERBOSE", false),
            log_to_file: get_env_flag("ARBITER_LOG", false),
            ..Self::new()
        }
    }

    /// Number of rounds. Each round is two matches with colors swapped; `rounds <= 0` plays a
    /// single match.
    pub fn with_rounds(mut self, rounds: i32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_logs(mut self, logs: LogPolicy) -> Self {
        self.logs = logs;
        self
    }

    /// Enable or disable per-move tracing.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log_to_file(mut self, value: bool) -> Self {
        self.log_to_file = value;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn log_to_file(&self) -> bool {
        self.log_to_file
    }

    /// Number of matches a tournament with this configuration plays.
    pub fn num_games(&self) -> usize {
        if self.rounds <= 0 {
            1
        } else {
            2 * self.rounds as usize
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_count_follows_rounds() {
        assert_eq!(Configuration::new().num_games(), 1);
        assert_eq!(Configuration::new().with_rounds(-3).num_games(), 1);
        assert_eq!(Configuration::new().with_rounds(3).num_games(), 6);
    }

    #[test]
    fn log_policy_from_arg() {
        assert_eq!(LogPolicy::from_arg(None), LogPolicy::Discard);
        assert_eq!(LogPolicy::from_arg(Some("-")), LogPolicy::Forward);
        assert_eq!(
            LogPolicy::from_arg(Some("logs/run_")),
            LogPolicy::Files("logs/run_".to_owned())
        );
    }
}
