use log::debug;
use shared::{Board, Player};

/// The client's mirror of the server roster
#[derive(Debug, Clone)]
pub struct GameState {
    pub states_received: u64,
    pub players: Vec<Player>,
    board: Board,
}

impl GameState {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            states_received: 0,
            players: Vec::new(),
            board: Board::new(width, height),
        }
    }

    /// Replaces the roster with a fresh snapshot from the server.
    pub fn apply_state(&mut self, players: Vec<Player>) {
        if players.len() != self.players.len() {
            debug!("Roster size {} -> {}", self.players.len(), players.len());
        }
        self.players = players;
        self.board.recount(self.players.iter().map(|p| p.position));
        self.states_received += 1;
    }

    /// The server lists the receiving client's own player first.
    pub fn local_player(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
}
