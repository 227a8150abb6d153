//! List network adapters and change their administrative state through netsh.

mod netsh_parse;

pub use netsh_parse::parse_interface_table;

use crate::command::{CommandRunner, SystemCommandRunner};
use crate::decode::Decoder;
use crate::error::NicError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Tool used when none is configured.
pub const DEFAULT_TOOL: &str = "netsh";

/// Administrative status of an adapter, as reported in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdapterStatus {
    /// The adapter is administratively enabled.
    Enabled,
    /// The adapter is administratively disabled.
    Disabled,
    /// Any other token, kept verbatim.
    Other(String),
}

impl AdapterStatus {
    /// Map a raw admin status token of the netsh table.
    pub fn from_token(token: &str) -> Self {
        match token {
            t if t.eq_ignore_ascii_case("enabled") || t == "已启用" => AdapterStatus::Enabled,
            t if t.eq_ignore_ascii_case("disabled") || t == "已禁用" => AdapterStatus::Disabled,
            t => AdapterStatus::Other(t.to_owned()),
        }
    }
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterStatus::Enabled => f.write_str("Enabled"),
            AdapterStatus::Disabled => f.write_str("Disabled"),
            AdapterStatus::Other(token) => f.write_str(token),
        }
    }
}

impl Serialize for AdapterStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One row of the adapter listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterRecord {
    /// Interface name, possibly containing spaces.
    pub name: String,
    /// Administrative status.
    pub status: AdapterStatus,
}

/// Soft parse problem. The offending line is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A data line with fewer than four columns.
    MalformedLine {
        /// Trimmed line.
        line: String,
        /// Number of whitespace separated tokens found.
        tokens: usize,
    },
    /// A data line from which no name could be extracted.
    EmptyName {
        /// Trimmed line.
        line: String,
    },
    /// Non-empty output without any adapter.
    NoAdapters {
        /// Complete output.
        output: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedLine { line, tokens } => {
                write!(f, "Skipping line with {tokens} column(s): '{line}'")
            }
            Diagnostic::EmptyName { line } => {
                write!(f, "Unable to extract adapter name from line: '{line}'")
            }
            Diagnostic::NoAdapters { output } => {
                write!(f, "No adapter could be parsed from output:\n{output}")
            }
        }
    }
}

/// Adapters found by one listing, in output order, plus the skipped lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    #[allow(missing_docs)]
    pub adapters: Vec<AdapterRecord>,
    #[allow(missing_docs)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Requested administrative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminState {
    #[allow(missing_docs)]
    Enable,
    #[allow(missing_docs)]
    Disable,
}

impl AdminState {
    /// Status an adapter shows once the request has been honoured.
    pub fn target_status(self) -> AdapterStatus {
        match self {
            AdminState::Enable => AdapterStatus::Enabled,
            AdminState::Disable => AdapterStatus::Disabled,
        }
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminState::Enable => f.write_str("enable"),
            AdminState::Disable => f.write_str("disable"),
        }
    }
}

/// Parse `enable` or `disable`, case insensitively:
/// ```
/// use lib::adapters::AdminState;
/// assert_eq!("Disable".parse::<AdminState>().unwrap(), AdminState::Disable);
/// assert!("up".parse::<AdminState>().is_err());
/// ```
impl FromStr for AdminState {
    type Err = NicError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enable" => Ok(AdminState::Enable),
            "disable" => Ok(AdminState::Disable),
            _ => Err(NicError::InvalidState {
                token: s.to_owned(),
            }),
        }
    }
}

/// Adapter listing and control.
/// This is the seam used by the front-end.
#[cfg_attr(test, mockall::automock)]
pub trait AdapterControl {
    /// Return a fresh snapshot of the adapters.
    fn list_adapters(&self) -> Result<Listing, NicError>;

    /// Request `state` for adapter `name` and return a message for display.
    ///
    /// Success only means the tool accepted the request with exit code 0.
    fn set_admin_state(&self, name: &str, state: AdminState) -> Result<String, NicError>;

    /// Same as [`AdapterControl::set_admin_state`] for a raw `enable`/`disable`
    /// token. Unknown tokens are rejected before anything is run.
    fn set_admin_state_token(&self, name: &str, token: &str) -> Result<String, NicError> {
        let state: AdminState = token.parse()?;
        self.set_admin_state(name, state)
    }
}

/// [`AdapterControl`] backed by `netsh interface`.
pub struct NetshAdapters {
    program: String,
    prefix: Vec<String>,
    runner: Box<dyn CommandRunner>,
}

impl fmt::Debug for NetshAdapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetshAdapters")
            .field("program", &self.program)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl NetshAdapters {
    /// Create a controller running `tool` (program then leading arguments,
    /// e.g. `["netsh", "-r", "host"]`) with a [`SystemCommandRunner`].
    pub fn new(tool: &[String], decoder: Decoder) -> Self {
        Self::with_runner(tool, Box::new(SystemCommandRunner::new(decoder)))
    }

    /// Create a controller with a custom command runner.
    pub fn with_runner(tool: &[String], runner: Box<dyn CommandRunner>) -> Self {
        let (program, prefix) = match tool.split_first() {
            Some((program, prefix)) => (program.clone(), prefix.to_vec()),
            None => (DEFAULT_TOOL.to_owned(), Vec::new()),
        };
        NetshAdapters {
            program,
            prefix,
            runner,
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, NicError> {
        let args = self
            .prefix
            .iter()
            .cloned()
            .chain(args.iter().map(|a| a.to_string()))
            .collect();
        self.runner.run(&self.program, args)
    }

    /// Enable adapter `name`.
    pub fn enable(&self, name: &str) -> Result<String, NicError> {
        self.set_admin_state(name, AdminState::Enable)
    }

    /// Disable adapter `name`.
    pub fn disable(&self, name: &str) -> Result<String, NicError> {
        self.set_admin_state(name, AdminState::Disable)
    }
}

impl AdapterControl for NetshAdapters {
    fn list_adapters(&self) -> Result<Listing, NicError> {
        let output = self
            .run(&["interface", "show", "interface"])
            .map_err(|e| e.context("Failed to list network adapters"))?;
        let listing =
            parse_interface_table(&output).map_err(|e| e.context("Failed to list network adapters"))?;
        debug!("Adapters: {:?}", listing.adapters);
        Ok(listing)
    }

    fn set_admin_state(&self, name: &str, state: AdminState) -> Result<String, NicError> {
        let name_arg = format!("name=\"{name}\"");
        let admin_arg = format!("admin={state}");
        self.run(&["interface", "set", "interface", &name_arg, &admin_arg])
            .map_err(|e| e.context(format!("Failed to {state} adapter '{name}'")))?;
        info!("Requested {} for adapter '{}'", state, name);
        Ok(format!(
            "Adapter '{name}': {state} request accepted, the operation likely succeeded"
        ))
    }
}
