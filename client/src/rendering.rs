use crate::game::GameState;
use macroquad::prelude::*;
use shared::{Board, Player, Position};

/// Pixel placement of the board inside the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub tile_size: f32,
    rows: i32,
}

impl BoardLayout {
    const MARGIN: f32 = 40.0;

    /// Largest square tiles that fit the window, centered.
    pub fn fit(board: &Board, width: f32, height: f32) -> Self {
        let columns = board.width() as f32;
        let rows = board.height() as f32;
        let tile_size = ((width - 2.0 * Self::MARGIN) / columns)
            .min((height - 2.0 * Self::MARGIN) / rows)
            .max(1.0);

        Self {
            origin_x: (width - tile_size * columns) / 2.0,
            origin_y: (height - tile_size * rows) / 2.0,
            tile_size,
            rows: board.height(),
        }
    }

    /// Top-left corner of a tile on screen. Row zero is drawn at the bottom.
    pub fn tile_origin(&self, position: Position) -> (f32, f32) {
        let x = self.origin_x + position.x as f32 * self.tile_size;
        let y = self.origin_y + (self.rows - 1 - position.y) as f32 * self.tile_size;
        (x, y)
    }
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub connected: bool,
    pub player_count: usize,
    pub states_received: u64,
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn render(&mut self, state: &GameState, connected: bool) {
        self.width = screen_width();
        self.height = screen_height();
        clear_background(Color::from_rgba(26, 26, 26, 255));

        let layout = BoardLayout::fit(state.board(), self.width, self.height);
        self.draw_board(state.board(), &layout);

        // Back to front so the local player, listed first, ends up on top.
        for (index, player) in state.players.iter().enumerate().rev() {
            self.draw_player(player, &layout, index == 0);
        }

        self.draw_ui(UiConfig {
            connected,
            player_count: state.players.len(),
            states_received: state.states_received,
        });
    }

    fn draw_board(&mut self, board: &Board, layout: &BoardLayout) {
        for y in 0..board.height() {
            for x in 0..board.width() {
                let position = Position::new(x, y);
                let (px, py) = layout.tile_origin(position);
                let shade = 0.15 + 0.6 * board.intensity(position);
                draw_rectangle(
                    px,
                    py,
                    layout.tile_size,
                    layout.tile_size,
                    Color::new(shade, shade, shade, 1.0),
                );
                draw_rectangle_lines(
                    px,
                    py,
                    layout.tile_size,
                    layout.tile_size,
                    1.0,
                    Color::from_rgba(68, 68, 68, 255),
                );
            }
        }
    }

    fn draw_player(&mut self, player: &Player, layout: &BoardLayout, is_local_player: bool) {
        let (px, py) = layout.tile_origin(player.position);
        let inset = layout.tile_size * 0.2;
        let size = layout.tile_size - 2.0 * inset;
        let color = Color::new(player.color.r, player.color.g, player.color.b, 1.0);

        draw_rectangle(px + inset, py + inset, size, size, color);
        if is_local_player {
            draw_rectangle_lines(px + inset, py + inset, size, size, 3.0, WHITE);
        }
        draw_text(&player.name, px + 2.0, py + 12.0, 14.0, WHITE);
    }

    fn draw_ui(&mut self, config: UiConfig) {
        let connection_color = if config.connected { GREEN } else { RED };
        draw_rectangle(10.0, 10.0, 8.0, 8.0, connection_color);
        draw_text(
            if config.connected { "CON" } else { "DISCONNECTED" },
            22.0,
            18.0,
            12.0,
            WHITE,
        );

        let status = format!(
            "{} players, {} states",
            config.player_count, config.states_received
        );
        draw_text(&status, 10.0, 34.0, 12.0, WHITE);
        draw_text("Arrows/WASD move, Enter/Space", 10.0, self.height - 10.0, 12.0, GRAY);
    }
}
