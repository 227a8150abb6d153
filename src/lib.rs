#![warn(missing_docs)]
//! Nicctl main components and helper functions used by `main`
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub mod adapters;
pub mod command;
pub mod config;
pub mod console;
pub mod decode;
pub mod elevation;
pub mod error;
pub mod session;
pub use adapters::{
    AdapterControl, AdapterRecord, AdapterStatus, AdminState, Listing, NetshAdapters,
};
pub use config::{AppConfig, Args, Command};
pub use error::{ErrorKind, NicError};

/// Setup logging to stderr, keeping stdout for command output
/// (Tracing is a bit more involving to set up but will provide much more feature if needed)
pub fn setup_tracing(config: &AppConfig) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_new(&config.log_level).context("Initializing log filter")?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// Create the netsh backed controller described by `config`.
pub fn create_controller(config: &AppConfig) -> NetshAdapters {
    let decoder = decode::Decoder::system(&config.encodings);
    debug!("Decoding output with {:?}", decoder);
    NetshAdapters::new(&config.tool, decoder)
}

/// Print the adapters listed by `control`, one `name (status)` per line or
/// as a JSON array.
pub fn print_adapters(control: &dyn AdapterControl, json: bool, out: &mut dyn Write) -> Result<()> {
    let listing = control.list_adapters()?;
    for diagnostic in &listing.diagnostics {
        warn!("{}", diagnostic);
    }
    if json {
        serde_json::to_writer_pretty(&mut *out, &listing.adapters)
            .context("Serializing adapters")?;
        writeln!(out)?;
    } else if listing.adapters.is_empty() {
        writeln!(out, "No network adapter found.")?;
    } else {
        for adapter in &listing.adapters {
            writeln!(out, "{} ({})", adapter.name, adapter.status)?;
        }
    }
    Ok(())
}

/// Request `state` for adapter `name` through `control`, from a raw
/// `enable`/`disable` token, and print the resulting message.
pub fn set_state(
    control: &dyn AdapterControl,
    name: &str,
    state: &str,
    out: &mut dyn Write,
) -> Result<()> {
    if !elevation::is_elevated() {
        warn!("Not running as administrator, the request will probably be refused");
    }
    let message = control.set_admin_state_token(name, state)?;
    writeln!(out, "{message}")?;
    Ok(())
}


#[cfg(test)]
mod set_state_should {
    use super::*;
    use crate::adapters::MockAdapterControl;
    use test_log::test;

    #[test]
    fn print_controller_message() -> Result<()> {
        let mut mock = MockAdapterControl::new();
        mock.expect_set_admin_state_token()
            .withf(|name, state| name == "Ethernet" && state == "disable")
            .times(1)
            .returning(|_, _| Ok("Adapter 'Ethernet': disable request accepted".into()));
        let mut out = Vec::new();
        set_state(&mock, "Ethernet", "disable", &mut out)?;
        assert_eq!(
            String::from_utf8(out)?,
            "Adapter 'Ethernet': disable request accepted\n"
        );
        Ok(())
    }
}
