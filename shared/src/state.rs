//! Full roster snapshot broadcast by the server every tick
//!
//! Payload layout:
//!
//! ```text
//! [count:1] count x { [x:i32][y:i32][r:f32][g:f32][b:f32][name_len:1][name:name_len] }
//! ```
//!
//! All multi-byte fields are little-endian. The receiving client's own player
//! is always written first, which is how a client tells itself apart without
//! an id field.

use crate::error::ProtocolError;
use crate::frame::{begin_frame, finish_frame, try_decode, FrameStatus, MessageType};
use log::warn;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Longest name, in bytes, that fits the one-byte length field
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Most players a single snapshot can describe
pub const MAX_PLAYERS: usize = u8::MAX as usize;

/// Wire size of the position and color fields of one player
pub const RECORD_LEN: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Scales `(r, g, b)` to unit length. The zero vector has no direction.
    pub fn normalized(r: f32, g: f32, b: f32) -> Option<Self> {
        let length = (r * r + g * g + b * b).sqrt();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(Self {
            r: r / length,
            g: g / length,
            b: b / length,
        })
    }

    pub fn length(&self) -> f32 {
        (self.r * self.r + self.g * self.g + self.b * self.b).sqrt()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub position: Position,
    pub color: Color,
    pub name: String,
}

impl Player {
    pub fn new(position: Position, color: Color, name: impl Into<String>) -> Self {
        Self {
            position,
            color,
            name: name.into(),
        }
    }
}

/// Longest prefix of `name` that fits the length byte without splitting a
/// character.
fn wire_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    warn!("player name of {} bytes truncated to {}", name.len(), end);
    &name[..end]
}

fn write_player(out: &mut Vec<u8>, player: &Player) -> Result<(), ProtocolError> {
    bincode::serialize_into(&mut *out, &(player.position, player.color))?;
    let name = wire_name(&player.name);
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

/// Appends a state frame describing `roster` to `out`.
///
/// `own` is the index of the receiving client's player; it is written first and
/// skipped in the pass over everyone else. An index outside `roster` means the
/// receiver has no player and the roster goes out in its own order.
pub fn write_state_message<P: Borrow<Player>>(
    out: &mut Vec<u8>,
    roster: &[P],
    own: Option<usize>,
) -> Result<(), ProtocolError> {
    let own = own.filter(|&index| index < roster.len());
    let ordered = own
        .into_iter()
        .chain((0..roster.len()).filter(|&index| Some(index) != own));

    let count = roster.len().min(MAX_PLAYERS);
    if roster.len() > MAX_PLAYERS {
        warn!(
            "state message capped at {} of {} players",
            MAX_PLAYERS,
            roster.len()
        );
    }

    let mark = begin_frame(out, MessageType::State);
    out.push(count as u8);
    for index in ordered.take(count) {
        write_player(out, roster[index].borrow())?;
    }
    finish_frame(out, mark);
    Ok(())
}

/// Cursor over a frame payload that refuses to read past its end.
struct Reader<'a> {
    payload: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self { payload, at: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ProtocolError> {
        if count > self.payload.len() - self.at {
            return Err(ProtocolError::RanOutOfBytes(MessageType::State));
        }
        let bytes = &self.payload[self.at..self.at + count];
        self.at += count;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn remaining(&self) -> usize {
        self.payload.len() - self.at
    }
}

fn read_player(reader: &mut Reader<'_>) -> Result<Player, ProtocolError> {
    let (position, color): (Position, Color) = bincode::deserialize(reader.take(RECORD_LEN)?)?;
    let name_len = usize::from(reader.read_u8()?);
    let name = String::from_utf8_lossy(reader.take(name_len)?).into_owned();
    Ok(Player {
        position,
        color,
        name,
    })
}

/// Decodes a complete state payload.
pub fn decode_roster(payload: &[u8]) -> Result<Vec<Player>, ProtocolError> {
    let mut reader = Reader::new(payload);
    let count = reader.read_u8()?;
    let mut players = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        players.push(read_player(&mut reader)?);
    }

    if reader.remaining() != 0 {
        return Err(ProtocolError::TrailingData {
            kind: MessageType::State,
            remaining: reader.remaining(),
        });
    }
    Ok(players)
}

/// Reads one state frame from the front of `buffer`.
///
/// Returns the roster and the bytes consumed, or `None` when the front is
/// incomplete. A frame of any other kind is an error.
pub fn read_state_message(buffer: &[u8]) -> Result<Option<(Vec<Player>, usize)>, ProtocolError> {
    match try_decode(buffer, MessageType::State)? {
        FrameStatus::Complete(frame) => {
            let players = decode_roster(frame.payload)?;
            Ok(Some((players, frame.consumed())))
        }
        FrameStatus::Incomplete => Ok(None),
        FrameStatus::OtherType(tag) => Err(ProtocolError::UnexpectedType(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_frame, HEADER_LEN};
    use assert_approx_eq::assert_approx_eq;

    fn roster() -> Vec<Player> {
        vec![
            Player::new(
                Position::new(0, 0),
                Color::normalized(1.0, 0.0, 0.0).unwrap(),
                "Player 1",
            ),
            Player::new(
                Position::new(3, -4),
                Color::normalized(0.0, 1.0, 1.0).unwrap(),
                "Player 2",
            ),
            Player::new(
                Position::new(9, 9),
                Color::normalized(0.2, 0.3, 0.4).unwrap(),
                "Zoë",
            ),
        ]
    }

    fn encode(roster: &[Player], own: Option<usize>) -> Vec<u8> {
        let mut out = Vec::new();
        write_state_message(&mut out, roster, own).unwrap();
        out
    }

    #[test]
    fn test_color_normalization() {
        let color = Color::normalized(3.0, 0.0, 4.0).unwrap();
        assert_approx_eq!(color.r, 0.6, 1e-6);
        assert_approx_eq!(color.b, 0.8, 1e-6);
        assert_approx_eq!(color.length(), 1.0, 1e-6);
        assert!(Color::normalized(0.0, 0.0, 0.0).is_none());
    }

    #[test]
    fn test_player_record_layout() {
        let player = Player::new(
            Position::new(1, -1),
            Color {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            },
            "ab",
        );
        let out = encode(&[player], None);

        let payload = &out[HEADER_LEN..];
        assert_eq!(payload[0], 1);
        assert_eq!(&payload[1..5], &1i32.to_le_bytes());
        assert_eq!(&payload[5..9], &(-1i32).to_le_bytes());
        assert_eq!(&payload[9..13], &1.0f32.to_le_bytes());
        assert_eq!(&payload[13..17], &0.0f32.to_le_bytes());
        assert_eq!(&payload[17..21], &0.0f32.to_le_bytes());
        assert_eq!(payload[21], 2);
        assert_eq!(&payload[22..], b"ab");
        assert_eq!(out[1] as usize, payload.len());
    }

    #[test]
    fn test_round_trip_puts_own_player_first() {
        let players = roster();
        let out = encode(&players, Some(1));

        let (decoded, consumed) = read_state_message(&out).unwrap().unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(
            decoded,
            vec![players[1].clone(), players[0].clone(), players[2].clone()]
        );
    }

    #[test]
    fn test_oversized_roster_is_capped_with_own_first() {
        let color = Color::normalized(1.0, 1.0, 1.0).unwrap();
        let players: Vec<Player> = (0..300)
            .map(|i| Player::new(Position::new(i, 0), color, format!("P{}", i)))
            .collect();
        let out = encode(&players, Some(299));
        assert_eq!(out[HEADER_LEN], 255);

        let (decoded, consumed) = read_state_message(&out).unwrap().unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(decoded.len(), MAX_PLAYERS);
        assert_eq!(decoded[0].name, "P299");
        assert_eq!(decoded[1].name, "P0");
        assert_eq!(decoded[254].name, "P253");
    }

    #[test]
    fn test_round_trip_without_own_player() {
        let players = roster();
        let (decoded, _) = read_state_message(&encode(&players, None))
            .unwrap()
            .unwrap();
        assert_eq!(decoded, players);
    }

    #[test]
    fn test_missing_own_player_keeps_order() {
        let players = roster();
        let (decoded, _) = read_state_message(&encode(&players, Some(7)))
            .unwrap()
            .unwrap();
        assert_eq!(decoded, players);
    }

    #[test]
    fn test_borrowed_roster_encodes_the_same() {
        let players = roster();
        let borrowed: Vec<&Player> = players.iter().collect();
        let mut out = Vec::new();
        write_state_message(&mut out, &borrowed, Some(2)).unwrap();
        assert_eq!(out, encode(&players, Some(2)));
    }

    #[test]
    fn test_empty_roster() {
        let out = encode(&Vec::<Player>::new(), None);
        assert_eq!(out, vec![b's', 1, 0, 0, 0]);
        let (decoded, consumed) = read_state_message(&out).unwrap().unwrap();
        assert!(decoded.is_empty());
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_long_names_are_truncated() {
        let player = Player::new(Position::default(), Color::default(), "x".repeat(300));
        let (decoded, _) = read_state_message(&encode(&[player], None))
            .unwrap()
            .unwrap();
        assert_eq!(decoded[0].name.len(), 255);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let name = format!("{}é", "x".repeat(254));
        let player = Player::new(Position::default(), Color::default(), name);
        let (decoded, _) = read_state_message(&encode(&[player], None))
            .unwrap()
            .unwrap();
        assert_eq!(decoded[0].name, "x".repeat(254));
    }

    #[test]
    fn test_trailing_data_is_fatal() {
        let players = roster();
        let mut payload = encode(&players[..2], None)[HEADER_LEN..].to_vec();
        payload.extend_from_slice(&[0, 0, 0]);
        let mut out = Vec::new();
        encode_frame(&mut out, MessageType::State, &payload);

        let result = read_state_message(&out);
        assert!(matches!(
            result,
            Err(ProtocolError::TrailingData { remaining: 3, .. })
        ));
    }

    #[test]
    fn test_reading_past_declared_length_is_fatal() {
        let players = roster();
        let full = encode(&players, None);
        let short_payload = &full[HEADER_LEN..full.len() - 1];
        let mut out = Vec::new();
        encode_frame(&mut out, MessageType::State, short_payload);

        let result = read_state_message(&out);
        assert!(matches!(
            result,
            Err(ProtocolError::RanOutOfBytes(MessageType::State))
        ));
    }

    #[test]
    fn test_empty_payload_is_fatal() {
        let result = read_state_message(&[b's', 0, 0, 0]);
        assert!(matches!(result, Err(ProtocolError::RanOutOfBytes(_))));
    }

    #[test]
    fn test_incomplete_frame_waits() {
        let out = encode(&roster(), None);
        assert!(read_state_message(&out[..out.len() - 1])
            .unwrap()
            .is_none());
        assert!(read_state_message(&[b's', 9]).unwrap().is_none());
    }

    #[test]
    fn test_foreign_frame_is_rejected() {
        let result = read_state_message(&[0x01, 5, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(result, Err(ProtocolError::UnexpectedType(0x01))));
    }
}
