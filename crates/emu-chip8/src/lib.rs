//! CHIP-8 virtual machine emulator.
//!
//! The core is a fetch-decode-execute engine over a single owned machine
//! state, plus a 60Hz timer synchronizer that is decoupled from the
//! (driver-paced) instruction rate. The machine itself has no host
//! dependencies; the winit/pixels/cpal host lives behind the `native`
//! feature and only talks to the core through the narrow public API
//! (`cycle`, `framebuffer`, `press_key`/`release_key`).

mod chip8;
mod disasm;
mod exec;
mod font;
mod instruction;
mod state;
mod timer;

#[cfg(feature = "native")]
pub mod audio;
#[cfg(feature = "native")]
pub mod keymap;

pub use chip8::{Chip8, CycleOutcome};
pub use disasm::disassemble;
pub use exec::ExecError;
pub use font::{FONT, GLYPH_SIZE};
pub use instruction::{Instruction, Opcode};
pub use state::{Chip8State, DISPLAY_HEIGHT, DISPLAY_WIDTH, FrameBuffer, STACK_DEPTH, TICK};
