//! CHIP-8 emulator binary.
//!
//! Runs a ROM in a winit window with a pixels framebuffer, or headless for
//! smoke tests. The window redraws only when a cycle reports a framebuffer
//! change; instruction pacing happens here, against the wall clock, at a
//! configurable rate (the machine itself only paces its 60Hz timers).

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use emu_chip8::audio::Beeper;
use emu_chip8::{Chip8, DISPLAY_HEIGHT, DISPLAY_WIDTH, ExecError, disassemble, keymap};
use format_ch8::Rom;
use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Framebuffer dimensions.
const FB_WIDTH: u32 = DISPLAY_WIDTH as u32;
const FB_HEIGHT: u32 = DISPLAY_HEIGHT as u32;

/// Default window scale factor.
const DEFAULT_SCALE: u32 = 10;

/// Default instruction rate in instructions per second.
const DEFAULT_CYCLE_HZ: u32 = 540;

/// Default headless run length (ten seconds at the default rate).
const DEFAULT_HEADLESS_CYCLES: u32 = DEFAULT_CYCLE_HZ * 10;

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    rom_path: Option<PathBuf>,
    scale: u32,
    cycle_hz: u32,
    headless: bool,
    cycles: u32,
    trace: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        scale: DEFAULT_SCALE,
        cycle_hz: DEFAULT_CYCLE_HZ,
        headless: false,
        cycles: DEFAULT_HEADLESS_CYCLES,
        trace: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scale" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.scale = s.parse().unwrap_or(DEFAULT_SCALE);
                }
            }
            "--cycle-hz" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.cycle_hz = s.parse().unwrap_or(DEFAULT_CYCLE_HZ);
                }
            }
            "--headless" => {
                cli.headless = true;
            }
            "--cycles" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.cycles = s.parse().unwrap_or(DEFAULT_HEADLESS_CYCLES);
                }
            }
            "--trace" => {
                cli.trace = true;
            }
            "--help" | "-h" => {
                eprintln!("Usage: emu-chip8 [OPTIONS] <rom>");
                eprintln!();
                eprintln!("Yet another CHIP-8 emulator.");
                eprintln!();
                eprintln!("Arguments:");
                eprintln!("  <rom>            Path to the CHIP-8 ROM to run");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --scale <n>      Window scale factor [default: 10]");
                eprintln!("  --cycle-hz <n>   Instructions per second [default: 540]");
                eprintln!("  --headless       Run without a window, dump the screen as text");
                eprintln!(
                    "  --cycles <n>     Cycles to run in headless mode [default: {DEFAULT_HEADLESS_CYCLES}]"
                );
                eprintln!("  --trace          Stream per-instruction disassembly to stderr");
                process::exit(0);
            }
            other if !other.starts_with('-') && cli.rom_path.is_none() => {
                cli.rom_path = Some(PathBuf::from(other));
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Print the instruction about to execute.
fn trace_line(chip8: &Chip8) {
    let state = chip8.state();
    let pc = state.pc as usize;
    if pc + 1 >= state.memory.len() {
        return; // the next cycle reports the fetch fault itself
    }
    let op = u16::from(state.memory[pc]) << 8 | u16::from(state.memory[pc + 1]);
    eprintln!("{:04X}  {:04X}  {}", state.pc, op, disassemble(op));
}

/// Report a machine fault and the register snapshot.
fn report_halt(chip8: &Chip8, err: &ExecError) {
    eprintln!("Machine halted: {err}");
    eprintln!("  {}", chip8.state());
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

fn run_headless(cli: &CliArgs, mut chip8: Chip8) {
    for _ in 0..cli.cycles {
        if cli.trace && !chip8.waiting_for_key() {
            trace_line(&chip8);
        }
        if let Err(err) = chip8.cycle() {
            report_halt(&chip8, &err);
            process::exit(1);
        }
    }

    // Dump the framebuffer as text, one character per pixel.
    for row in chip8.framebuffer() {
        let line: String = (0..DISPLAY_WIDTH)
            .map(|x| if row >> (63 - x) & 1 == 0 { '.' } else { '#' })
            .collect();
        println!("{line}");
    }
}

// ---------------------------------------------------------------------------
// Windowed mode (winit + pixels)
// ---------------------------------------------------------------------------

struct App {
    chip8: Chip8,
    beeper: Option<Beeper>,
    window: Option<&'static Window>,
    pixels: Option<Pixels<'static>>,
    scale: u32,
    cycle_hz: u32,
    trace: bool,
    halted: bool,
    dirty: bool,
    last_run: Instant,
    cycle_debt: f64,
    title: String,
}

impl App {
    fn new(chip8: Chip8, beeper: Option<Beeper>, cli: &CliArgs, title: String) -> Self {
        Self {
            chip8,
            beeper,
            window: None,
            pixels: None,
            scale: cli.scale,
            cycle_hz: cli.cycle_hz,
            trace: cli.trace,
            halted: false,
            dirty: true,
            last_run: Instant::now(),
            cycle_debt: 0.0,
            title,
        }
    }

    /// Run the cycles that have come due since the last call.
    fn run_pending_cycles(&mut self) {
        if self.halted {
            return;
        }

        let now = Instant::now();
        let elapsed = now - self.last_run;
        self.last_run = now;

        // Cap the batch at a quarter second of cycles so a window stall
        // doesn't fast-forward the program.
        let due = (elapsed.as_secs_f64() * f64::from(self.cycle_hz) + self.cycle_debt)
            .min(f64::from(self.cycle_hz) / 4.0);
        self.cycle_debt = due.fract();

        for _ in 0..due as u32 {
            if self.trace && !self.chip8.waiting_for_key() {
                trace_line(&self.chip8);
            }
            match self.chip8.cycle() {
                Ok(outcome) => {
                    self.dirty |= outcome.redraw;
                    if outcome.beep
                        && let Some(beeper) = &mut self.beeper
                    {
                        beeper.beep();
                    }
                }
                Err(err) => {
                    // Recoverable by design: stop executing, keep the
                    // window (and the final frame) up for inspection.
                    report_halt(&self.chip8, &err);
                    self.halted = true;
                    break;
                }
            }
        }
    }

    fn update_pixels(&mut self) {
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };

        let fb = self.chip8.framebuffer();
        let frame = pixels.frame_mut();

        for (y, row) in fb.iter().enumerate() {
            for x in 0..DISPLAY_WIDTH {
                let lit = row >> (63 - x) & 1 != 0;
                let value = if lit { 0xFF } else { 0x00 };
                let offset = (y * DISPLAY_WIDTH + x) * 4;
                frame[offset] = value; // R
                frame[offset + 1] = value; // G
                frame[offset + 2] = value; // B
                frame[offset + 3] = 0xFF; // A
            }
        }
    }

    fn handle_key(&mut self, keycode: KeyCode, pressed: bool) {
        if let Some(key) = keymap::map_keycode(keycode) {
            if pressed {
                self.chip8.press_key(key);
            } else {
                self.chip8.release_key(key);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already created
        }

        let window_size =
            winit::dpi::LogicalSize::new(FB_WIDTH * self.scale, FB_HEIGHT * self.scale);
        let attrs = WindowAttributes::default()
            .with_title(&self.title)
            .with_inner_size(window_size)
            .with_resizable(false);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                // Leak the window for a 'static reference; it lives for the
                // whole process and the OS reclaims it at exit.
                let window: &'static Window = Box::leak(Box::new(window));
                let inner = window.inner_size();
                let surface = SurfaceTexture::new(inner.width, inner.height, window);
                match Pixels::new(FB_WIDTH, FB_HEIGHT, surface) {
                    Ok(pixels) => {
                        self.pixels = Some(pixels);
                    }
                    Err(e) => {
                        eprintln!("Failed to create pixels: {e}");
                        event_loop.exit();
                        return;
                    }
                }
                self.window = Some(window);
                self.last_run = Instant::now();
            }
            Err(e) => {
                eprintln!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    // Escape exits
                    if keycode == KeyCode::Escape && event.state == ElementState::Pressed {
                        event_loop.exit();
                        return;
                    }
                    self.handle_key(keycode, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                self.run_pending_cycles();

                if self.dirty {
                    self.update_pixels();
                    self.dirty = false;
                }

                if let Some(pixels) = self.pixels.as_ref() {
                    if let Err(e) = pixels.render() {
                        eprintln!("Render error: {e}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window {
            window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = parse_args();

    let Some(ref rom_path) = cli.rom_path else {
        eprintln!("Missing ROM path (see --help)");
        process::exit(1);
    };

    let rom = match Rom::load(rom_path) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("Failed to load ROM {}: {e}", rom_path.display());
            process::exit(1);
        }
    };
    let chip8 = Chip8::new(&rom);

    if cli.headless {
        run_headless(&cli, chip8);
        return;
    }

    let beeper = Beeper::new();
    if beeper.is_none() {
        eprintln!("No audio device; running silent");
    }

    let title = match rom_path.file_stem() {
        Some(stem) => format!("CHIP-8: {}", stem.to_string_lossy()),
        None => "CHIP-8".to_string(),
    };
    let mut app = App::new(chip8, beeper, &cli, title);

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            eprintln!("Failed to create event loop: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("Event loop error: {e}");
        process::exit(1);
    }
}
