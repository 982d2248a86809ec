//! Terminal immersive mode: alternate screen with a hidden cursor.

use std::io::{IsTerminal, Write};

use dotpractice_core::timer::{EnvironmentError, FocusEnvironment};

const ENTER: &str = "\x1b[?1049h\x1b[2J\x1b[H\x1b[?25l";
const EXIT: &str = "\x1b[?25h\x1b[?1049l";

#[derive(Debug)]
pub struct TerminalEnvironment {
    enabled: bool,
}

impl TerminalEnvironment {
    /// Immersive mode only applies when stderr is an interactive terminal.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: enabled && std::io::stderr().is_terminal(),
        }
    }
}

impl FocusEnvironment for TerminalEnvironment {
    fn enter_immersive(&mut self) -> Result<(), EnvironmentError> {
        if !self.enabled {
            return Ok(());
        }
        let mut err = std::io::stderr();
        err.write_all(ENTER.as_bytes())?;
        err.flush()?;
        Ok(())
    }

    fn exit_immersive(&mut self) {
        if !self.enabled {
            return;
        }
        let mut err = std::io::stderr();
        let _ = err.write_all(EXIT.as_bytes());
        let _ = err.flush();
    }
}
