//! This module holds struct and helpers for parameters and configuration
use ::structopt::clap::AppSettings;
use anyhow::{bail, Context, Result};
use directories_next::ProjectDirs;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use tracing::debug;

use crate::adapters::DEFAULT_TOOL;
use crate::decode::{encoding_for_label, DEFAULT_FALLBACKS};

// Courtesy of structopt_flags crate
/// `-v`/`-q` flags, (de)serialized as a log level name.
#[derive(structopt::StructOpt, Debug, Clone, Default, PartialEq, Eq)]
pub struct QuietVerbose {
    /// Increase the output's verbosity level
    ///
    /// Pass many times to increase verbosity level, up to 3.
    #[structopt(
        name = "quietverbose",
        long = "verbose",
        short = "v",
        parse(from_occurrences),
        conflicts_with = "quietquiet",
        global = true
    )]
    verbosity_level: u8,

    /// Decrease the output's verbosity level.
    ///
    /// Used once, it will set error log level.
    /// Used twice, will silent the log completely
    #[structopt(
        name = "quietquiet",
        long = "quiet",
        short = "q",
        parse(from_occurrences),
        conflicts_with = "quietverbose",
        global = true
    )]
    quiet_level: u8,
}

impl Serialize for QuietVerbose {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.get_level_filter())
    }
}

fn de_from_str<'de, D>(deserializer: D) -> Result<QuietVerbose, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let (verbosity_level, quiet_level) = match s.to_ascii_lowercase().as_ref() {
        "off" => (0, 2),
        "error" => (0, 1),
        "warn" => (0, 0),
        "info" => (1, 0),
        "debug" => (2, 0),
        _ => (3, 0),
    };
    Ok(QuietVerbose {
        verbosity_level,
        quiet_level,
    })
}

impl QuietVerbose {
    /// Level name usable as an `EnvFilter` directive.
    pub fn get_level_filter(&self) -> &'static str {
        let quiet = self.quiet_level.min(2) as i8;
        let verbose = self.verbosity_level.min(3) as i8;
        match verbose - quiet {
            -2 => "Off",
            -1 => "Error",
            0 => "Warn",
            1 => "Info",
            2 => "Debug",
            _ => "Trace",
        }
    }

    /// No `-v` nor `-q` given.
    pub fn is_unset(&self) -> bool {
        self.verbosity_level == 0 && self.quiet_level == 0
    }
}

/// Subcommands. Without one, the interactive console starts.
#[derive(structopt::StructOpt, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List network adapters and their administrative state
    List {
        /// Print the adapters as JSON
        #[structopt(long)]
        json: bool,
    },
    /// Enable the adapter named NAME
    #[allow(missing_docs)]
    Enable { name: String },
    /// Disable the adapter named NAME
    #[allow(missing_docs)]
    Disable { name: String },
    /// Set the administrative STATE (enable or disable) of adapter NAME
    #[allow(missing_docs)]
    Set { name: String, state: String },
    /// Interactive console
    Interactive,
    /// Relaunch the interactive console as administrator
    Elevate,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(structopt::StructOpt, Serialize, Deserialize, Debug, Clone)]
/// List, enable and disable network adapters
///
/// Drives `netsh interface` on Windows. Changing the state of an adapter
/// requires administrator rights.
#[structopt(global_settings(&[AppSettings::ColoredHelp, AppSettings::ColorAuto]))]
pub struct Args {
    /// network configuration tool command line (e.g. "netsh -r HOST")
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(short, long, env = "NICCTL_TOOL")]
    pub tool: Option<String>,

    /// encodings tried when the output is not valid UTF-8 nor in the
    /// locale encoding
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[structopt(short, long = "encoding")]
    pub encodings: Vec<String>,

    /// configuration file
    ///
    /// Defaults to `config.toml` in the user configuration directory.
    #[serde(skip)]
    #[structopt(short, long, env = "NICCTL_CONFIG", parse(from_os_str))]
    pub config: Option<PathBuf>,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    #[serde(
        default,
        deserialize_with = "de_from_str",
        skip_serializing_if = "QuietVerbose::is_unset"
    )]
    pub verbose: QuietVerbose,

    #[allow(missing_docs)]
    #[serde(skip)]
    #[structopt(subcommand)]
    pub cmd: Option<Command>,
}

impl Default for Args {
    fn default() -> Args {
        Args {
            tool: Some(DEFAULT_TOOL.into()),
            encodings: DEFAULT_FALLBACKS.iter().map(|s| s.to_string()).collect(),
            config: None,
            verbose: QuietVerbose::default(),
            cmd: None,
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Program followed by its leading arguments.
    pub tool: Vec<String>,
    /// Fallback encoding labels, all known.
    pub encodings: Vec<String>,
    /// `EnvFilter` level.
    pub log_level: String,
}

/// `config.toml` in the user configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "nicctl", "nicctl").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Args {
    /// Merge configuration Default → Config File → command line args.
    ///
    /// An explicitly given configuration file must exist.
    pub fn merge_config_file(self) -> Result<Args> {
        let path = match &self.config {
            Some(path) if !path.exists() => bail!("Configuration file {:?} not found", path),
            Some(path) => Some(path.clone()),
            None => default_config_path(),
        };
        let mut figment = Figment::from(Serialized::defaults(Args::default()));
        if let Some(path) = &path {
            debug!("Reading configuration from {:?}", path);
            figment = figment.merge(Toml::file(path));
        }
        let mut args: Args = figment
            .merge(Serialized::defaults(&self))
            .extract()
            .with_context(|| format!("Merging configuration with {:?}", path))?;
        args.config = path;
        args.cmd = self.cmd;
        debug!("Merged config and parameters : {:#?}", args);
        Ok(args)
    }

    /// Check parameters and build the [`AppConfig`].
    pub fn validate(&self) -> Result<AppConfig> {
        let tool = self.tool.as_deref().unwrap_or(DEFAULT_TOOL);
        let tool = shell_words::split(tool).with_context(|| format!("Parsing tool '{tool}'"))?;
        if tool.is_empty() {
            bail!("The tool command line is empty");
        }
        for label in &self.encodings {
            if encoding_for_label(label).is_none() {
                bail!("Unknown encoding '{}'", label);
            }
        }
        Ok(AppConfig {
            tool,
            encodings: self.encodings.clone(),
            log_level: self.verbose.get_level_filter().to_owned(),
        })
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use mktemp::Temp;
    use std::fs;
    use structopt::StructOpt;
    use test_log::test;

    fn cli(args: &[&str]) -> Args {
        Args::from_iter(std::iter::once("nicctl").chain(args.iter().copied()))
    }

    #[test]
    fn split_tool_command_line() -> Result<()> {
        let args = Args {
            tool: Some(r#"netsh -r "branch office""#.into()),
            ..Default::default()
        };
        let config = args.validate()?;
        assert_eq!(config.tool, ["netsh", "-r", "branch office"]);
        assert_eq!(config.encodings, ["gbk", "cp936"]);
        assert_eq!(config.log_level, "Warn");
        Ok(())
    }

    #[test]
    fn reject_empty_tool_and_unknown_encoding() {
        let args = Args {
            tool: Some("  ".into()),
            ..Default::default()
        };
        assert!(args.validate().is_err());
        let args = Args {
            encodings: vec!["klingon".into()],
            ..Default::default()
        };
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("klingon"), "Unexpected error: {}", err);
    }

    #[test]
    fn parse_subcommands() {
        assert_eq!(cli(&[]).cmd, None);
        assert_eq!(
            cli(&["list", "--json"]).cmd,
            Some(Command::List { json: true })
        );
        assert_eq!(
            cli(&["set", "Wi-Fi 2", "disable"]).cmd,
            Some(Command::Set {
                name: "Wi-Fi 2".into(),
                state: "disable".into()
            })
        );
        assert_eq!(cli(&["-vv", "list"]).verbose.get_level_filter(), "Debug");
        assert_eq!(cli(&["-q", "list"]).verbose.get_level_filter(), "Error");
    }

    #[test]
    fn merge_file_between_defaults_and_cli() -> Result<()> {
        let temp = Temp::new_file()?;
        let path = temp.to_path_buf();
        fs::write(
            &path,
            "tool = \"netsh -r server\"\nencodings = [\"cp1252\"]\nverbose = \"debug\"\n",
        )?;

        let args = cli(&["--config", path.to_str().unwrap(), "list"]).merge_config_file()?;
        assert_eq!(args.tool.as_deref(), Some("netsh -r server"));
        assert_eq!(args.encodings, ["cp1252"]);
        assert_eq!(args.verbose.get_level_filter(), "Debug");
        assert_eq!(args.cmd, Some(Command::List { json: false }));

        let args = cli(&["--config", path.to_str().unwrap(), "-q", "--tool", "netsh"])
            .merge_config_file()?;
        assert_eq!(args.tool.as_deref(), Some("netsh"));
        assert_eq!(args.verbose.get_level_filter(), "Error");
        Ok(())
    }

    #[test]
    fn fail_on_missing_explicit_config() {
        let temp = Temp::new_dir().unwrap();
        let path = temp.to_path_buf().join("missing.toml");
        let err = cli(&["--config", path.to_str().unwrap()])
            .merge_config_file()
            .unwrap_err();
        assert!(err.to_string().contains("not found"), "Unexpected error: {}", err);
    }

    #[test]
    fn print_as_toml() -> Result<()> {
        let out = toml::to_string(&Args::default())?;
        assert!(out.contains("tool = \"netsh\""), "{}", out);
        assert!(out.contains("encodings") && out.contains("\"cp936\""), "{}", out);
        Ok(())
    }
}
