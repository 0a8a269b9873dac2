//! Top-level CHIP-8 system.
//!
//! Owns the machine state plus the two injected sources it draws on: a
//! [`Clock`] for the 60Hz timer cadence and a [`RandomSource`] for CXNN.
//! The driving loop calls [`Chip8::cycle`] once per instruction slot; pacing
//! between cycles is the driver's job, only the timer cadence is intrinsic.

use emu_core::{Clock, RandomSource, ThreadRandom, WallClock};
use format_ch8::{PROGRAM_START, Rom};

use crate::exec::ExecError;
use crate::state::{Chip8State, FrameBuffer};

/// What one executed cycle reported back to the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// The framebuffer changed; the renderer should redraw.
    pub redraw: bool,
    /// The sound timer crossed 1 -> 0; the host should beep once.
    pub beep: bool,
}

/// CHIP-8 virtual machine.
pub struct Chip8 {
    pub(crate) state: Chip8State,
    pub(crate) random: Box<dyn RandomSource>,
    pub(crate) clock: Box<dyn Clock>,
}

impl Chip8 {
    /// Create a machine with the given program loaded, on the host clock
    /// and thread RNG.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        Self::with_sources(rom, Box::new(ThreadRandom), Box::new(WallClock))
    }

    /// Create a machine with explicit clock and random sources.
    ///
    /// Deterministic tests inject their doubles here.
    #[must_use]
    pub fn with_sources(
        rom: &Rom,
        random: Box<dyn RandomSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut state = Chip8State::new(clock.now());
        state.memory[PROGRAM_START..PROGRAM_START + rom.data().len()]
            .copy_from_slice(rom.data());
        Self {
            state,
            random,
            clock,
        }
    }

    /// Run one cycle: execute at most one instruction (none while awaiting
    /// a key), then catch the timers up to the clock.
    ///
    /// # Errors
    ///
    /// Fails without partially mutating state on an illegal opcode, a call
    /// stack overflow/underflow, or an out-of-range memory access. The
    /// machine remains inspectable afterwards; the driver decides whether
    /// to halt.
    pub fn cycle(&mut self) -> Result<CycleOutcome, ExecError> {
        let redraw = if self.state.waiting_key.is_none() {
            self.step()?
        } else {
            false
        };
        let beep = self.sync_timers();
        Ok(CycleOutcome { redraw, beep })
    }

    /// The display rows (MSB = leftmost pixel).
    #[must_use]
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Read-only view of the machine state, for traces and halt reports.
    #[must_use]
    pub fn state(&self) -> &Chip8State {
        &self.state
    }

    /// True while FX0A has instruction progression suspended.
    #[must_use]
    pub fn waiting_for_key(&self) -> bool {
        self.state.waiting_key.is_some()
    }

    /// Press key `key` (low nibble selects one of the 16 keys).
    ///
    /// A key-down edge (the key was not already held) completes a pending
    /// FX0A wait: the key index lands in the destination register and
    /// execution resumes on the next cycle. Host key-repeat on a held key
    /// is not an edge.
    pub fn press_key(&mut self, key: u8) {
        let key = key & 0xF;
        let bit = 1u16 << key;
        let edge = self.state.keys & bit == 0;
        self.state.keys |= bit;
        if edge {
            if let Some(x) = self.state.waiting_key.take() {
                self.state.v[x as usize] = key;
            }
        }
    }

    /// Release key `key`.
    pub fn release_key(&mut self, key: u8) {
        self.state.keys &= !(1u16 << (key & 0xF));
    }
}
