//! Challenge-mode course bytecode compiler.
//!
//! Each course's ordered stage list compiles to a command stream (see
//! [`encoding`]): a floor-select record per stage, a time-override record
//! when the limit differs from the default, then the goal-jump instructions
//! that implement the course's progression rules. Compilation is two-pass so
//! the measured size can be checked against the reserved command storage
//! before a single byte lands anywhere.

pub mod encoding;

pub use encoding::{Command, GoalType, Opcode};

use tracing::debug;

use crate::buffer::TwoPassWriter;
use crate::config::{CmLayout, CmStageInfo, Course};
use crate::error::{Error, Result};
use crate::layout::{course as course_layout, DEFAULT_TIME_LIMIT_FRAMES};
use crate::reloc::{ModuleId, ModuleMap};

/// The game's pre-existing course command storage, claimed front to back.
/// Courses compile in [`Course::ALL`] order, so earlier courses get priority
/// and late ones are the most likely to spill to the heap.
#[derive(Debug)]
pub struct CommandArena {
    live_base: u32,
    storage: Vec<u8>,
    cursor: usize,
}

impl CommandArena {
    /// Locate the reserved storage in the live address space.
    pub fn locate(modules: &ModuleMap) -> Result<Self> {
        let live_base =
            modules
                .relocate(course_layout::COMMAND_BASE)
                .ok_or(Error::Relocation {
                    addr: course_layout::COMMAND_BASE,
                    module: ModuleId::MainGame,
                })?;
        Ok(Self {
            live_base,
            storage: vec![0u8; course_layout::COMMAND_CAPACITY],
            cursor: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.storage.len() - self.cursor
    }

    /// Claim `size` bytes if they fit, returning the live address of the
    /// claimed slot.
    fn claim(&mut self, size: usize) -> Option<(u32, usize)> {
        if size > self.remaining() {
            return None;
        }
        let offset = self.cursor;
        self.cursor += size;
        Some((self.live_base + offset as u32, offset))
    }

    fn slot_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.storage[offset..offset + len]
    }

    /// Contents of the reserved storage written so far.
    pub fn used(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }
}

/// Where a compiled course ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inside the reserved command storage, at this live address.
    Reserved { addr: u32 },
    /// Fresh heap allocation; the reserved storage was full.
    Heap,
}

/// Backing storage of a compiled command stream.
#[derive(Debug)]
enum CourseBytes {
    /// Slice of the arena's reserved storage; no private copy exists.
    Arena { offset: usize, len: usize },
    /// Fresh heap allocation, for courses the reserved storage rejected.
    Owned(Vec<u8>),
}

#[derive(Debug)]
pub struct CompiledCourse {
    pub course: Course,
    pub placement: Placement,
    bytes: CourseBytes,
}

impl CompiledCourse {
    /// The compiled command stream. Reserved-placement courses read straight
    /// out of the arena that compiled them.
    pub fn bytes<'a>(&'a self, arena: &'a CommandArena) -> &'a [u8] {
        match &self.bytes {
            CourseBytes::Arena { offset, len } => &arena.storage[*offset..*offset + *len],
            CourseBytes::Owned(bytes) => bytes,
        }
    }

    pub fn commands(&self, arena: &CommandArena) -> Vec<Command> {
        Command::decode_stream(self.bytes(arena)).expect("compiler emits whole records")
    }
}

/// Compile all eight courses in priority order.
pub fn compile_all(layout: &CmLayout, arena: &mut CommandArena) -> Result<Vec<CompiledCourse>> {
    let mut compiled = Vec::with_capacity(Course::ALL.len());
    for (course, stages) in layout.courses() {
        compiled.push(compile_course(course, &stages.stages, arena)?);
    }
    Ok(compiled)
}

/// Compile one course: measuring pass, placement decision, writing pass.
pub fn compile_course(
    course: Course,
    stages: &[CmStageInfo],
    arena: &mut CommandArena,
) -> Result<CompiledCourse> {
    if stages.is_empty() {
        return Err(Error::EmptyCourse {
            course: course.key(),
        });
    }

    let mut writer = TwoPassWriter::new();
    emit_course(stages, &mut writer);
    let size = writer.measured_len();

    // The writing pass lands directly in the claimed slot when the course
    // fits; only spilled courses get their own allocation.
    let (placement, bytes) = match arena.claim(size) {
        Some((addr, offset)) => {
            writer.materialize_into(arena.slot_mut(offset, size));
            emit_course(stages, &mut writer);
            writer.finish();
            debug!(
                "course {course}: {size} bytes in reserved storage at {addr:#010x}, {} left",
                arena.remaining()
            );
            (
                Placement::Reserved { addr },
                CourseBytes::Arena { offset, len: size },
            )
        }
        None => {
            writer.materialize();
            emit_course(stages, &mut writer);
            let bytes = writer.into_bytes();
            debug!(
                "course {course}: {size} bytes spilled to heap ({} left in reserved storage)",
                arena.remaining()
            );
            (Placement::Heap, CourseBytes::Owned(bytes))
        }
    };

    Ok(CompiledCourse {
        course,
        placement,
        bytes,
    })
}

/// The emit sequence; deterministic, run once per pass.
fn emit_course(stages: &[CmStageInfo], w: &mut TwoPassWriter<'_>) {
    for (idx, stage) in stages.iter().enumerate() {
        Command::FloorSelect {
            stage_id: stage.stage.stage_id,
        }
        .encode(w);

        if stage.stage.time_limit_frames != DEFAULT_TIME_LIMIT_FRAMES {
            Command::TimeOverride {
                frames: stage.stage.time_limit_frames,
            }
            .encode(w);
        }

        if idx == stages.len() - 1 {
            // Jump distances are irrelevant on the final stage.
            Command::Finish.encode(w);
        } else {
            emit_goal_jumps(stage, w);
        }
    }
}

/// Goal-jump emission, by tie-break priority: one default jump when all
/// three distances agree, three guarded jumps when all differ, otherwise one
/// guarded jump for the odd goal out and a default jump for the shared pair.
/// Pair matching checks green==red, then blue==red, then blue==green.
fn emit_goal_jumps(stage: &CmStageInfo, w: &mut TwoPassWriter<'_>) {
    let (blue, green, red) = (
        stage.blue_goal_jump,
        stage.green_goal_jump,
        stage.red_goal_jump,
    );

    let check_and_jump = |w: &mut TwoPassWriter<'_>, goal: GoalType, floors: u16| {
        Command::CheckGoal { goal }.encode(w);
        Command::Jump { floors }.encode(w);
    };

    if blue == green && green == red {
        Command::Jump { floors: blue }.encode(w);
    } else if blue != green && green != red && blue != red {
        check_and_jump(w, GoalType::Blue, blue);
        check_and_jump(w, GoalType::Green, green);
        check_and_jump(w, GoalType::Red, red);
    } else if green == red {
        check_and_jump(w, GoalType::Blue, blue);
        Command::Jump { floors: green }.encode(w);
    } else if blue == red {
        check_and_jump(w, GoalType::Green, green);
        Command::Jump { floors: blue }.encode(w);
    } else {
        // blue == green
        check_and_jump(w, GoalType::Red, red);
        Command::Jump { floors: blue }.encode(w);
    }
}
