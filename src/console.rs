//! Line oriented interactive front-end built on [`Session`].
use crate::adapters::{AdapterControl, AdminState};
use crate::session::{Action, Session, SessionError};
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

/// Why [`Console::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// User asked to quit, or input is exhausted.
    Quit,
    /// User asked to relaunch with administrator rights.
    Elevate,
}

const HELP: &str = "\
Commands:
  list | refresh     reload the adapter list
  select N | N       select adapter number N
  enable             enable the selected adapter
  disable            disable the selected adapter
  elevate            relaunch as administrator
  help               show this help
  quit               exit";

/// Interactive console reading commands from `input` and writing to `output`.
pub struct Console<'a, R, W> {
    session: Session<'a>,
    input: R,
    output: W,
    started: bool,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    /// Create a console driving `control`.
    pub fn new(control: &'a dyn AdapterControl, elevated: bool, input: R, output: W) -> Self {
        Self {
            session: Session::new(control, elevated),
            input,
            output,
            started: false,
        }
    }

    /// Underlying session.
    pub fn session(&self) -> &Session<'a> {
        &self.session
    }

    /// Read and execute commands until `quit`, `elevate` or end of input.
    ///
    /// May be called again after [`Exit::Elevate`] when the relaunch failed.
    pub fn run(&mut self) -> Result<Exit> {
        if !self.started {
            self.started = true;
            if !self.session.is_elevated() {
                writeln!(
                    self.output,
                    "Administrator rights are required to manage network adapters. Type `elevate` to relaunch as administrator."
                )?;
            }
            self.refresh()?;
        }
        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(Exit::Quit);
            }
            let words: Vec<&str> = line.split_whitespace().collect();
            debug!("Console command {:?}", words);
            match words.as_slice() {
                [] => {}
                ["quit" | "exit" | "q"] => return Ok(Exit::Quit),
                ["help" | "?"] => self.help()?,
                ["list" | "refresh" | "r"] => self.refresh()?,
                ["select" | "s", index] | [index] if index.parse::<usize>().is_ok() => {
                    let index = index.parse::<usize>()?;
                    self.select(index)?
                }
                ["enable" | "e"] => self.apply(AdminState::Enable)?,
                ["disable" | "d"] => self.apply(AdminState::Disable)?,
                ["elevate"] => {
                    if self.session.is_elevated() {
                        writeln!(self.output, "Already running as administrator.")?;
                    } else {
                        return Ok(Exit::Elevate);
                    }
                }
                _ => writeln!(self.output, "Unknown command '{}', type `help`.", line.trim())?,
            }
        }
    }

    fn refresh(&mut self) -> Result<()> {
        if let Err(e) = self.session.refresh() {
            writeln!(self.output, "Unable to get the adapter list:\n{e}")?;
        }
        self.print_adapters()
    }

    fn select(&mut self, index: usize) -> Result<()> {
        match self.session.select(index) {
            Ok(_) => self.print_status(),
            Err(e) => Ok(writeln!(self.output, "{e}")?),
        }
    }

    fn apply(&mut self, state: AdminState) -> Result<()> {
        match self.session.apply(state) {
            Ok(message) => {
                writeln!(self.output, "{message}")?;
                self.print_adapters()
            }
            Err(SessionError::Unavailable(action)) => {
                let reason = if self.session.is_elevated() {
                    "the selected adapter is not in a suitable state"
                } else {
                    "administrator rights are required"
                };
                writeln!(self.output, "Cannot {}: {}.", action_name(action), reason)?;
                Ok(())
            }
            Err(e) => {
                writeln!(self.output, "Operation failed:\n{e}")?;
                self.print_status()
            }
        }
    }

    fn help(&mut self) -> Result<()> {
        writeln!(self.output, "{HELP}")?;
        let actions: Vec<&str> = self
            .session
            .available_actions()
            .into_iter()
            .map(action_name)
            .collect();
        writeln!(self.output, "Available now: {}", actions.join(", "))?;
        Ok(())
    }

    fn print_adapters(&mut self) -> Result<()> {
        let selected = self.session.selected().map(|a| a.name.clone());
        for (i, adapter) in self.session.adapters().iter().enumerate() {
            let marker = if selected.as_deref() == Some(adapter.name.as_str()) {
                '*'
            } else {
                ' '
            };
            writeln!(
                self.output,
                "{marker} [{i}] {} ({})",
                adapter.name, adapter.status
            )?;
        }
        self.print_status()
    }

    fn print_status(&mut self) -> Result<()> {
        writeln!(self.output, "-- {}", self.session.status_line())?;
        Ok(())
    }
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Refresh => "refresh",
        Action::Enable => "enable",
        Action::Disable => "disable",
    }
}
