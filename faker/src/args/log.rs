use clap::ValueEnum;

/// The crates whose events are shown below the `trace` level.
const FAKER_TARGETS: [&str; 2] = ["graphql_faker", "faker_server"];

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Completely disables logging
    Off,
    /// Only errors from the faker
    Error,
    /// Warnings and errors from the faker
    Warn,
    /// Info, warning and error messages from the faker
    #[default]
    Info,
    /// Debug messages from the faker, and every HTTP request served
    Debug,
    /// Everything, from all dependencies
    Trace,
}

impl LogLevel {
    /// The `EnvFilter` directives for this level.
    pub(crate) fn as_filter_string(self) -> String {
        let level = match self {
            LogLevel::Off => return "off".to_owned(),
            LogLevel::Trace => return "trace".to_owned(),
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };

        let mut directives: Vec<String> = FAKER_TARGETS.iter().map(|target| format!("{target}={level}")).collect();

        if self == LogLevel::Debug {
            directives.push("tower_http=debug".to_owned());
        }

        directives.push("off".to_owned());
        directives.join(",")
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogStyle {
    /// Standard text, colored on interactive terminals
    #[default]
    Text,
    /// JSON objects
    Json,
}

#[cfg(test)]
mod tests {
    use super::LogLevel;

    #[test]
    fn filters() {
        assert_eq!("off", LogLevel::Off.as_filter_string());
        assert_eq!("graphql_faker=info,faker_server=info,off", LogLevel::Info.as_filter_string());
        assert_eq!(
            "graphql_faker=debug,faker_server=debug,tower_http=debug,off",
            LogLevel::Debug.as_filter_string()
        );
        assert_eq!("trace", LogLevel::Trace.as_filter_string());
    }
}
