#![doc = include_str!("../README.md")]
use anyhow::{Context, Result};
use std::io;
use tracing::{debug, error, info};

use ::lib::config::{Args, Command};
use ::lib::console::{Console, Exit};
use ::lib::elevation::{is_elevated, relaunch_elevated};
use ::lib::{create_controller, print_adapters, set_state, setup_tracing};

/// Run the interactive console until the user quits or an elevated instance
/// takes over.
fn interactive(control: &dyn ::lib::AdapterControl) -> Result<()> {
    let elevated = is_elevated();
    info!("Running as administrator: {}", elevated);
    let stdin = io::stdin();
    let mut console = Console::new(control, elevated, stdin.lock(), io::stdout());
    loop {
        match console.run()? {
            Exit::Quit => return Ok(()),
            Exit::Elevate => match relaunch_elevated() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    error!("{}", e);
                    println!("{e}");
                }
            },
        }
    }
}

#[paw::main]
fn main(args: Args) -> Result<()> {
    // Merge config Default → Config File → command line args
    let args = args.merge_config_file()?;
    let config = args.validate().context("Validating configuration")?;
    setup_tracing(&config)?;
    debug!("Configuration : {:#?}", config);

    let control = create_controller(&config);
    let mut stdout = io::stdout();
    match args.cmd.clone().unwrap_or(Command::Interactive) {
        Command::List { json } => print_adapters(&control, json, &mut stdout)?,
        Command::Enable { name } => set_state(&control, &name, "enable", &mut stdout)?,
        Command::Disable { name } => set_state(&control, &name, "disable", &mut stdout)?,
        Command::Set { name, state } => set_state(&control, &name, &state, &mut stdout)?,
        Command::Interactive => interactive(&control)?,
        Command::Elevate => {
            if is_elevated() {
                interactive(&control)?
            } else {
                relaunch_elevated()?
            }
        }
        Command::Config => print!(
            "{}",
            toml::to_string(&args).context("Serializing configuration")?
        ),
    }
    Ok(())
}
