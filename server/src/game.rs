//! Authoritative grid simulation
//!
//! Owns the canonical roster, the board and every counter that used to be
//! process-wide: the next player number and the spawn RNG live here and are
//! reached through the server context only.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    write_state_message, Board, Color, ConnectionId, Controls, Player, Position, ProtocolError,
};

/// Server-side player: the mirrored wire state plus its pending input
#[derive(Debug, Clone)]
pub struct GamePlayer {
    pub connection: ConnectionId,
    pub player: Player,
    /// Buttons folded in since the last tick; never sent to clients
    pub controls: Controls,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    /// Fixed spawn seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: shared::BOARD_WIDTH,
            height: shared::BOARD_HEIGHT,
            seed: None,
        }
    }
}

pub struct Game {
    pub tick: u64,
    board: Board,
    players: Vec<GamePlayer>,
    next_player_number: u32,
    rng: StdRng,
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            tick: 0,
            board: Board::new(config.width, config.height),
            players: Vec::new(),
            next_player_number: 1,
            rng,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Players in spawn order
    pub fn players(&self) -> &[GamePlayer] {
        &self.players
    }

    pub fn player(&self, connection: ConnectionId) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.connection == connection)
    }

    pub fn player_mut(&mut self, connection: ConnectionId) -> Option<&mut GamePlayer> {
        self.players.iter_mut().find(|p| p.connection == connection)
    }

    fn random_color(&mut self) -> Color {
        loop {
            let (r, g, b) = (self.rng.gen(), self.rng.gen(), self.rng.gen());
            if let Some(color) = Color::normalized(r, g, b) {
                return color;
            }
        }
    }

    /// Creates the player owned by `connection` at a random tile.
    pub fn spawn_player(&mut self, connection: ConnectionId) -> &GamePlayer {
        let position = Position::new(
            self.rng.gen_range(0..self.board.width()),
            self.rng.gen_range(0..self.board.height()),
        );
        let color = self.random_color();
        let name = format!("Player {}", self.next_player_number);
        self.next_player_number += 1;

        info!(
            "Added {} for connection {} at ({}, {})",
            name, connection, position.x, position.y
        );
        self.players.push(GamePlayer {
            connection,
            player: Player::new(position, color, name),
            controls: Controls::default(),
        });
        self.board.recount(self.players.iter().map(|p| p.player.position));

        let index = self.players.len() - 1;
        &self.players[index]
    }

    /// Removes the player owned by `connection`, if it still exists.
    pub fn remove_player(&mut self, connection: ConnectionId) -> Option<GamePlayer> {
        let index = self
            .players
            .iter()
            .position(|p| p.connection == connection)?;
        let removed = self.players.remove(index);
        info!(
            "Removed {} (connection {})",
            removed.player.name, connection
        );
        self.board.recount(self.players.iter().map(|p| p.player.position));
        Some(removed)
    }

    /// Advances the simulation by one tick.
    ///
    /// Each held direction moves its player one tile, then the position is
    /// clamped to the board and the press counters are cleared.
    pub fn update(&mut self) {
        for game_player in &mut self.players {
            let controls = &game_player.controls;
            let mut step = Position::default();
            if controls.left.pressed {
                step.x -= 1;
            }
            if controls.right.pressed {
                step.x += 1;
            }
            if controls.down.pressed {
                step.y -= 1;
            }
            if controls.up.pressed {
                step.y += 1;
            }

            let position = &mut game_player.player.position;
            *position = self.board.clamp(Position::new(
                position.x.saturating_add(step.x),
                position.y.saturating_add(step.y),
            ));

            game_player.controls.reset_downs();
        }

        self.board
            .recount(self.players.iter().map(|p| p.player.position));
        self.tick += 1;
        debug!("Tick {}: {} players", self.tick, self.players.len());
    }

    /// Appends the snapshot addressed to `connection` to `out`.
    pub fn write_state(&self, connection: ConnectionId, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
        let roster: Vec<&Player> = self.players.iter().map(|p| &p.player).collect();
        let own = self.players.iter().position(|p| p.connection == connection);
        write_state_message(out, &roster, own)
    }
}
