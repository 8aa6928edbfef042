use std::io::{self, Write};

use tagkeep_repair::{RepairEvent, Reporter, Severity};

/// Prints repair events the way a command-line user expects: changes on
/// stdout, warnings on stderr with the program name, progress detail only
/// when asked for.
pub(crate) struct ConsoleReporter<O: Write, E: Write> {
    verbose: bool,
    out: O,
    err: E,
}

impl ConsoleReporter<io::Stdout, io::Stderr> {
    pub(crate) fn stdio(verbose: bool) -> Self {
        Self::new(verbose, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub(crate) fn new(verbose: bool, out: O, err: E) -> Self {
        Self { verbose, out, err }
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn report(&mut self, event: RepairEvent) {
        let _ = match event.severity() {
            Severity::Verbose if !self.verbose => Ok(()),
            Severity::Verbose | Severity::Change => writeln!(self.out, "{event}"),
            Severity::Warning => writeln!(self.err, "tagkeep: {event}"),
        };
    }
}
