//! Performance benchmarks for the codec and the simulation step

use server::game::{Game, GameConfig};
use shared::{
    read_state_message, write_state_message, Color, Connection, Controls, Player, Position,
};
use std::time::Instant;

fn full_roster() -> Vec<Player> {
    (0..255)
        .map(|i| {
            let color = Color::normalized(1.0, (i % 7) as f32, 0.5).unwrap_or_default();
            Player::new(Position::new(i % 10, i / 10), color, format!("Player {}", i + 1))
        })
        .collect()
}

/// Benchmarks encoding a maximum-size roster
#[test]
fn benchmark_state_encoding() {
    let roster = full_roster();
    let iterations = 2_000;
    let mut out = Vec::with_capacity(16 * 1024);
    let start = Instant::now();

    for i in 0..iterations {
        out.clear();
        write_state_message(&mut out, &roster, Some(i % roster.len())).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "State encoding: {} rosters of {} in {:?} ({:.2} μs/roster)",
        iterations,
        roster.len(),
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks decoding a maximum-size roster
#[test]
fn benchmark_state_decoding() {
    let mut bytes = Vec::new();
    write_state_message(&mut bytes, &full_roster(), None).unwrap();

    let iterations = 2_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let (roster, consumed) = read_state_message(&bytes).unwrap().unwrap();
        assert_eq!(roster.len(), 255);
        assert_eq!(consumed, bytes.len());
    }

    let duration = start.elapsed();
    println!(
        "State decoding: {} rosters in {:?} ({:.2} μs/roster)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks draining a buffer full of controls frames
#[test]
fn benchmark_controls_stream() {
    let mut sender = Controls::default();
    sender.left.press();
    let mut frame = Vec::new();
    sender.write_to(&mut frame);

    let frames = 10_000;
    let mut connection = Connection::new(1);
    for _ in 0..frames {
        connection.receive(&frame);
    }

    let mut receiver = Controls::default();
    let start = Instant::now();
    let handled = connection
        .process_incoming(|buffer| receiver.recv(buffer))
        .unwrap();
    let duration = start.elapsed();

    println!(
        "Controls stream: {} frames in {:?} ({:.2} ns/frame)",
        handled,
        duration,
        duration.as_nanos() as f64 / handled as f64
    );

    assert_eq!(handled, frames);
    assert_eq!(receiver.left.downs, u8::MAX);
    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks simulation steps with a full board
#[test]
fn benchmark_game_update() {
    let mut game = Game::new(&GameConfig {
        seed: Some(42),
        ..GameConfig::default()
    });
    for id in 0..255 {
        game.spawn_player(id);
        game.player_mut(id).unwrap().controls.right.pressed = id % 2 == 0;
    }

    let iterations = 10_000;
    let start = Instant::now();
    for _ in 0..iterations {
        game.update();
    }

    let duration = start.elapsed();
    println!(
        "Game update: {} players × {} ticks in {:?} ({:.2} μs/tick)",
        game.players().len(),
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}
