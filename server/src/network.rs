//! Server tick loop: drain connection events until the next deadline, then
//! advance the game and broadcast a state snapshot to every client

use crate::client_manager::ClientManager;
use crate::game::{Game, GameConfig};
use log::{debug, error, info};
use shared::Transport;
use std::io;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Ticks per second
    pub tick_rate: u32,
    pub width: i32,
    pub height: i32,
    pub max_clients: usize,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: shared::DEFAULT_TICK_RATE,
            width: shared::BOARD_WIDTH,
            height: shared::BOARD_HEIGHT,
            max_clients: shared::state::MAX_PLAYERS,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }

    fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            seed: self.seed,
        }
    }
}

/// Fixed-period deadlines that never drift.
///
/// Each deadline is the previous one plus the period, not "now" plus the
/// period, so time spent simulating does not push later ticks back. A server
/// that falls behind runs its overdue ticks back to back.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    period: Duration,
    next_tick: Instant,
}

impl TickSchedule {
    /// First deadline is one period after `start`.
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_tick: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Time left before the deadline, or `None` once it has passed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if now >= self.next_tick {
            None
        } else {
            Some(self.next_tick - now)
        }
    }

    pub fn advance(&mut self) {
        self.next_tick += self.period;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Servicing connections until the deadline
    Draining,
    /// Updating the simulation and queueing snapshots
    Advancing,
}

/// Main server coordinating connections and game simulation
pub struct Server {
    config: ServerConfig,
    game: Game,
    clients: ClientManager,
    schedule: TickSchedule,
    phase: TickPhase,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let game = Game::new(&config.game_config());
        let clients = ClientManager::new(config.max_clients);
        let schedule = TickSchedule::new(config.tick_period(), Instant::now());

        Self {
            config,
            game,
            clients,
            schedule,
            phase: TickPhase::Draining,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    pub fn schedule(&self) -> &TickSchedule {
        &self.schedule
    }

    /// Runs ticks forever; only a transport failure ends the loop.
    pub async fn run<T: Transport>(&mut self, transport: &mut T) -> io::Result<()> {
        info!(
            "Server started: {} Hz, {}x{} board, up to {} clients",
            self.config.tick_rate, self.config.width, self.config.height, self.config.max_clients
        );
        self.schedule = TickSchedule::new(self.config.tick_period(), Instant::now());

        loop {
            if let Err(e) = self.run_tick(transport).await {
                error!("Transport failed: {}", e);
                return Err(e);
            }
        }
    }

    /// One drain phase followed by one advance phase.
    pub async fn run_tick<T: Transport>(&mut self, transport: &mut T) -> io::Result<()> {
        self.drain(transport).await?;
        self.advance(transport);
        Ok(())
    }

    /// Services connections until the current deadline passes, then moves
    /// the deadline forward by one period.
    ///
    /// Polls at least once, with no wait when the deadline is already past,
    /// so a server running behind still reads input every tick.
    pub async fn drain<T: Transport>(&mut self, transport: &mut T) -> io::Result<()> {
        self.phase = TickPhase::Draining;
        loop {
            let remaining = self
                .schedule
                .remaining(Instant::now())
                .unwrap_or(Duration::ZERO);
            let (game, clients) = (&mut self.game, &mut self.clients);
            transport
                .poll(remaining, |connection, event| {
                    clients.handle_event(game, connection, event)
                })
                .await?;

            if self.schedule.remaining(Instant::now()).is_none() {
                break;
            }
        }
        self.schedule.advance();
        Ok(())
    }

    /// Updates the game and queues a snapshot on every client connection.
    pub fn advance<T: Transport>(&mut self, transport: &mut T) {
        self.phase = TickPhase::Advancing;
        self.game.update();
        self.broadcast(transport);
        self.phase = TickPhase::Draining;

        let tick_rate = u64::from(self.config.tick_rate.max(1));
        if self.game.tick % tick_rate == 0 {
            debug!(
                "Tick {}: {} clients",
                self.game.tick,
                self.clients.client_count()
            );
        }
    }

    fn broadcast<T: Transport>(&mut self, transport: &mut T) {
        for game_player in self.game.players() {
            let id = game_player.connection;
            let Some(connection) = transport.connection_mut(id) else {
                continue;
            };
            if let Err(e) = self.game.write_state(id, connection.outgoing_mut()) {
                error!("Failed to encode state for client {}: {}", id, e);
            }
        }
    }
}
