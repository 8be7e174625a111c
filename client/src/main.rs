use clap::Parser;
use client::game::GameState;
use client::input::InputManager;
use client::network::ClientSession;
use client::rendering::Renderer;
use log::{error, info};
use macroquad::prelude::*;
use shared::TcpTransport;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Board width in tiles, must match the server
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(i32).range(1..=shared::MAX_DIMENSION as i64))]
    board_width: i32,

    /// Board height in tiles, must match the server
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(i32).range(1..=shared::MAX_DIMENSION as i64))]
    board_height: i32,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Grid Client".to_owned(),
        window_width: 800,
        window_height: 600,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    if let Err(e) = run(Args::parse()).await {
        error!("Client failed: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Socket tasks live on tokio; macroquad owns the frame loop.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    info!("Connecting to: {}", args.server);
    let mut transport = runtime.block_on(TcpTransport::connect(&args.server))?;
    info!("Controls: arrows or WASD to move, Enter or Space");

    let mut session = ClientSession::new();
    let mut input = InputManager::new();
    let mut state = GameState::new(args.board_width, args.board_height);
    let mut renderer = Renderer::new(screen_width() as usize, screen_height() as usize);
    let mut connected = true;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        if connected {
            input.update(&mut session.controls);
            match runtime.block_on(session.update(&mut transport)) {
                Ok(Some(roster)) => state.apply_state(roster),
                Ok(None) => {}
                Err(e) => {
                    error!("Session ended: {}", e);
                    connected = false;
                }
            }
        }

        renderer.render(&state, connected && session.is_connected());
        next_frame().await;
    }

    Ok(())
}
