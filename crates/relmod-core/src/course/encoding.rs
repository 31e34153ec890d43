//! Course command record encoding.
//!
//! Challenge-mode progression is driven by a linear stream of fixed-size
//! 8-byte big-endian records:
//!
//! ```text
//! byte 0    opcode
//! byte 1    argument (goal type for CheckGoal, otherwise 0)
//! bytes 2-3 operand (stage id / frames / jump distance), u16 BE
//! bytes 4-7 reserved, zero
//! ```
//!
//! A `CheckGoal` record guards exactly the next `Jump`; a `Jump` without a
//! preceding check is unconditional.

use strum::{Display, FromRepr};

use crate::buffer::TwoPassWriter;
use crate::layout::course::RECORD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, Display)]
#[repr(u8)]
pub enum Opcode {
    FloorSelect = 0,
    TimeOverride = 1,
    CheckGoal = 2,
    Jump = 3,
    Finish = 4,
}

/// Goal colors as the game encodes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, Display)]
#[repr(u8)]
pub enum GoalType {
    Blue = 0,
    Green = 1,
    Red = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select the floor for the current course slot.
    FloorSelect { stage_id: u16 },
    /// Override the default 60-second time limit for this floor.
    TimeOverride { frames: u16 },
    /// Guard the next `Jump` with a goal-type check.
    CheckGoal { goal: GoalType },
    /// Advance this many floors.
    Jump { floors: u16 },
    /// End of the course.
    Finish,
}

impl Command {
    fn parts(&self) -> (Opcode, u8, u16) {
        match *self {
            Command::FloorSelect { stage_id } => (Opcode::FloorSelect, 0, stage_id),
            Command::TimeOverride { frames } => (Opcode::TimeOverride, 0, frames),
            Command::CheckGoal { goal } => (Opcode::CheckGoal, goal as u8, 0),
            Command::Jump { floors } => (Opcode::Jump, 0, floors),
            Command::Finish => (Opcode::Finish, 0, 0),
        }
    }

    pub fn encode(&self, w: &mut TwoPassWriter<'_>) {
        let (opcode, arg, operand) = self.parts();
        w.write_u8(opcode as u8);
        w.write_u8(arg);
        w.write_u16_be(operand);
        w.write_u32_be(0);
    }

    /// Decode one record, for inspection tooling and tests.
    pub fn decode(record: &[u8]) -> Option<Command> {
        if record.len() != RECORD_SIZE {
            return None;
        }
        let opcode = Opcode::from_repr(record[0])?;
        let operand = u16::from_be_bytes([record[2], record[3]]);
        Some(match opcode {
            Opcode::FloorSelect => Command::FloorSelect { stage_id: operand },
            Opcode::TimeOverride => Command::TimeOverride { frames: operand },
            Opcode::CheckGoal => Command::CheckGoal {
                goal: GoalType::from_repr(record[1])?,
            },
            Opcode::Jump => Command::Jump { floors: operand },
            Opcode::Finish => Command::Finish,
        })
    }

    /// Decode a whole command stream.
    pub fn decode_stream(bytes: &[u8]) -> Option<Vec<Command>> {
        if bytes.len() % RECORD_SIZE != 0 {
            return None;
        }
        bytes.chunks(RECORD_SIZE).map(Command::decode).collect()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::FloorSelect { stage_id } => write!(f, "floor stage={stage_id}"),
            Command::TimeOverride { frames } => write!(f, "time {frames} frames"),
            Command::CheckGoal { goal } => write!(f, "if goal == {goal}"),
            Command::Jump { floors } => write!(f, "jump {floors}"),
            Command::Finish => write!(f, "finish"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::run_two_pass;

    #[test]
    fn test_record_size() {
        let bytes = run_two_pass(|w| Command::Finish.encode(w));
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(bytes, [4, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let commands = [
            Command::FloorSelect { stage_id: 420 },
            Command::TimeOverride { frames: 10800 },
            Command::CheckGoal { goal: GoalType::Green },
            Command::Jump { floors: 5 },
            Command::Finish,
        ];
        let bytes = run_two_pass(|w| {
            for cmd in &commands {
                cmd.encode(w);
            }
        });
        assert_eq!(Command::decode_stream(&bytes).unwrap(), commands);
    }

    #[test]
    fn test_operand_is_big_endian() {
        let bytes = run_two_pass(|w| Command::FloorSelect { stage_id: 0x0102 }.encode(w));
        assert_eq!(&bytes[..4], [0, 0, 0x01, 0x02]);
    }

    #[test]
    fn test_decode_rejects_bad_opcode() {
        assert_eq!(Command::decode(&[9, 0, 0, 0, 0, 0, 0, 0]), None);
        assert_eq!(Command::decode(&[0, 0, 0]), None);
    }
}
