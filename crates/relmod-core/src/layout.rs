//! Memory layout constants for the target game
//!
//! This module centralizes the fixed addresses, table sizes and limits used
//! when rebuilding stage data. Constants are organized by structure type.

/// Number of stage slots in the per-stage lookup tables. Stage ids are dense
/// in `0..STAGE_COUNT`.
pub const STAGE_COUNT: usize = 421;

/// Every story-mode world has exactly this many stages.
pub const STAGES_PER_WORLD: usize = 10;

/// Story mode supports at most this many worlds.
pub const MAX_WORLDS: usize = 10;

/// Stage display names are stored NUL-terminated in a fixed 32-byte slot, so
/// at most 31 bytes of text.
pub const STAGE_NAME_MAX: usize = 31;

/// Default per-stage time limit (60 seconds at 60 frames/sec). Course
/// bytecode omits the time-override record when the limit equals this.
pub const DEFAULT_TIME_LIMIT_FRAMES: u16 = 3600;

/// Number of party-game toggle bits.
pub const PARTY_GAME_COUNT: usize = 12;

/// Vanilla load regions for the game's modules (DOL and RELs)
pub mod regions {
    pub const DOL_BASE: u32 = 0x8000_0000;
    pub const DOL_SIZE: u32 = 0x0019_9F84;

    pub const MAINLOOP_BASE: u32 = 0x8027_0100;
    pub const MAINLOOP_SIZE: u32 = 0x002D_C7CC;
    pub const MAINLOOP_BSS_BASE: u32 = 0x8054_C8E0;
    pub const MAINLOOP_BSS_SIZE: u32 = 0x000D_DA4C;

    pub const MAINGAME_BASE: u32 = 0x808F_3FE0;
    pub const MAINGAME_SIZE: u32 = 0x0008_B484;
    pub const MAINGAME_BSS_BASE: u32 = 0x8097_F4A0;
    pub const MAINGAME_BSS_SIZE: u32 = 0x0000_65F0;

    pub const SELNGC_BASE: u32 = 0x808F_3FE0;
    pub const SELNGC_SIZE: u32 = 0x0005_5C87;
    pub const SELNGC_BSS_BASE: u32 = 0x8094_9CA0;
    pub const SELNGC_BSS_SIZE: u32 = 0x0000_8BD4;
}

/// Layout of the game's challenge-mode course command storage
pub mod course {
    /// Every course command is one fixed-size big-endian record.
    pub const RECORD_SIZE: usize = 8;

    /// Vanilla address of the course command storage inside main_game.rel.
    pub const COMMAND_BASE: u32 = 0x8092_A3C0;

    /// Byte budget of the pre-existing command storage. Courses that do not
    /// fit in what remains of this spill to the heap.
    pub const COMMAND_CAPACITY: usize = 0x0A80;
}
