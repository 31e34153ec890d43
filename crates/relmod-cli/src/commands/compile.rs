//! Compile command implementation.
//!
//! Shows each compiled course's placement and bytecode, either as a
//! hexdump or decoded one command per line.

use anyhow::{bail, Result};
use relmod_core::{CommandArena, CompiledCourse, LoadedMod, Placement};

pub fn run(loaded: &LoadedMod, course_key: Option<&str>, disasm: bool) -> Result<()> {
    let Some(arena) = &loaded.arena else {
        bail!("custom_stage_info is disabled in this config; no courses to compile");
    };

    if let Some(key) = course_key {
        let Some(compiled) = loaded.courses.iter().find(|c| c.course.key() == key) else {
            bail!("unknown course \"{key}\"");
        };
        print_course(compiled, arena, disasm);
        return Ok(());
    }

    for compiled in &loaded.courses {
        print_course(compiled, arena, disasm);
        println!();
    }
    Ok(())
}

fn print_course(compiled: &CompiledCourse, arena: &CommandArena, disasm: bool) {
    let placement = match compiled.placement {
        Placement::Reserved { addr } => format!("reserved storage at 0x{addr:08X}"),
        Placement::Heap => "heap (reserved storage full)".to_string(),
    };
    let bytes = compiled.bytes(arena);
    println!(
        "{}: {} bytes, {}",
        compiled.course.key(),
        bytes.len(),
        placement
    );

    if disasm {
        for (i, command) in compiled.commands(arena).iter().enumerate() {
            println!("  {i:3}: {command}");
        }
    } else {
        hexdump(bytes);
    }
}

fn hexdump(bytes: &[u8]) {
    for (i, chunk) in bytes.chunks(16).enumerate() {
        print!("0x{:03X}: ", i * 16);
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                print!(" ");
            }
            print!("{byte:02X} ");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use relmod_core::course::Command;

    // The CLI leans on Display for disassembly; pin the format.
    #[test]
    fn test_command_display() {
        assert_eq!(Command::FloorSelect { stage_id: 7 }.to_string(), "floor stage=7");
        assert_eq!(Command::Jump { floors: 3 }.to_string(), "jump 3");
        assert_eq!(Command::Finish.to_string(), "finish");
    }
}
