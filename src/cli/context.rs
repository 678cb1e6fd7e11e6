use std::sync::OnceLock;

/// How much the CLI prints besides errors and command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

static VERBOSITY: OnceLock<Verbosity> = OnceLock::new();

/// Set the process-wide verbosity from the global flags.
pub fn init(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (_, true) => Verbosity::Quiet,
        (true, false) => Verbosity::Verbose,
        (false, false) => Verbosity::Normal,
    };
    let _ = VERBOSITY.set(level);
}

/// Current verbosity, `Normal` if `init` was never called.
pub fn verbosity() -> Verbosity {
    VERBOSITY.get().copied().unwrap_or(Verbosity::Normal)
}
