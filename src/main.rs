//! This crate contains the source code for the binary for the game mazerunner.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]
#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use clap::Parser as _;
use color_eyre::{eyre::Result, install};
use mazerunner::{
    config::{Cli, Config},
    logging,
    persistence::FileStore,
    App,
};

fn main() -> Result<()> {
    install()?;

    let config = Config::try_from(Cli::parse())?;
    let store = FileStore::new(&config.data_dir)?;
    let _guard = logging::init(&config.data_dir)?;
    let bindings = store.load_key_bindings();

    let mut terminal = ratatui::init();
    let result = App::new(config, Box::new(store), bindings).run(&mut terminal);
    ratatui::restore();

    result
}
