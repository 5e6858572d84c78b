use anyhow::{Context as _, anyhow};
use clap::{Parser, ValueEnum};
use skirmish_core::{Coord, DEFAULT_BOARD_SIZE, Player};
use wasm_bindgen::prelude::*;

mod game;
mod presenter;
mod settings;
mod socket;
mod utils;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Seat {
    One,
    Two,
}

impl From<Seat> for Player {
    fn from(seat: Seat) -> Self {
        match seat {
            Seat::One => Player::Player1,
            Seat::Two => Player::Player2,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Seat of the local player
    #[arg(short, long, value_enum, default_value_t = Seat::One)]
    player: Seat,

    /// Match server to connect to
    #[arg(short, long, default_value = "ws://localhost:8080/match")]
    server: String,

    /// Edge length of the board
    #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: Coord,
}

fn start() -> anyhow::Result<()> {
    use gloo::utils::{document, window};

    let location_hash = window()
        .location()
        .hash()
        .map_err(|err| anyhow!("could not read location hash: {:?}", err))?;

    let args = Args::try_parse_from(location_hash.split(['#', '&'])).context("could not parse args")?;
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).context("could not initialize logger")?;
    }
    log::debug!("args: {:?}", args);

    let root = document()
        .get_element_by_id("match")
        .ok_or_else(|| anyhow!("could not find id=\"match\" element"))?;

    let props = game::GameProps {
        local_player: args.player.into(),
        server_url: args.server.into(),
        board_size: args.size,
    };
    yew::Renderer::<game::GameView>::with_root_and_props(root, props).render();
    log::debug!("App started");
    Ok(())
}

#[wasm_bindgen(start)]
pub fn run_app() {
    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    if let Err(err) = start() {
        gloo::console::error!(format!("{:#}", err));
    }
}
