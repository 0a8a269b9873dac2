//! 60Hz timer synchronization.
//!
//! The two countdown timers decay at 60Hz regardless of how fast the driver
//! paces instruction cycles. After every cycle the synchronizer compares the
//! clock against the next-tick deadline and applies exactly one decrement
//! per crossed 1/60s boundary, catching up over multiple boundaries after a
//! host stall. Catch-up is capped: past [`MAX_CATCHUP`] ticks the deadline
//! resynchronizes to `now + TICK` instead of replaying an arbitrarily long
//! backlog.

use crate::chip8::Chip8;
use crate::state::TICK;

/// Upper bound on ticks replayed in one catch-up (3 seconds at 60Hz).
const MAX_CATCHUP: u32 = 180;

impl Chip8 {
    /// Catch the timers up to the current time.
    ///
    /// Returns true if the sound timer crossed 1 -> 0 (the beep edge).
    pub(crate) fn sync_timers(&mut self) -> bool {
        let now = self.clock.now();
        let mut beep = false;
        let mut ticks = 0u32;

        while now >= self.state.next_tick {
            if ticks == MAX_CATCHUP {
                // Pathological clock jump; drop the backlog and resync.
                self.state.next_tick = now + TICK;
                break;
            }
            if self.state.delay_timer > 0 {
                self.state.delay_timer -= 1;
            }
            if self.state.sound_timer > 0 {
                self.state.sound_timer -= 1;
                beep |= self.state.sound_timer == 0;
            }
            self.state.next_tick += TICK;
            ticks += 1;
        }

        beep
    }
}
