//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for the report. The terminal UI
//! discards them instead, since any stderr output would land on its frame.

use tracing::Level;

/// Map `-q` / `-v` flags to a max level: quiet -> ERROR, default WARN, -v INFO, -vv DEBUG, -vvv TRACE.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Dropped; used while the terminal UI owns the screen.
    Discard,
}

/// Install the global fmt subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(level: Level, output: LogOutput) {
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);
    let _ = match output {
        LogOutput::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogOutput::Discard => builder.with_writer(std::io::sink).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_mapping() {
        assert_eq!(level_for(0, false), Level::WARN);
        assert_eq!(level_for(2, false), Level::DEBUG);
        assert_eq!(level_for(9, false), Level::TRACE);
        assert_eq!(level_for(3, true), Level::ERROR);
    }
}
