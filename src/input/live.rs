//! Live mouse and keyboard input through a global rdev hook.
//!
//! One background thread (`pointlab-rdev-hook`) runs `rdev::listen` for the
//! whole process and writes into a mutex-guarded snapshot. The frame loop
//! polls that snapshot once per frame. Skeletal and wand devices have no
//! driver here, so their slots stay empty.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::input::InputSource;
use crate::models::config::InputMode;
use crate::models::input::{FrameInput, KeyboardSnapshot, MouseSnapshot};

pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

// ─── Shared state ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct HookState {
    mouse: MouseSnapshot,
    acknowledge: bool,
    escape: bool,
    /// Latest number key pressed since the previous poll.
    debug_key: Option<u8>,
}

/// State shared between the hook thread and the frame loop.
#[derive(Debug, Default)]
pub struct HookGlobal {
    state: Mutex<HookState>,
}

impl HookGlobal {
    fn lock(&self) -> MutexGuard<'_, HookState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// ─── Hook thread ──────────────────────────────────────────────────────────────

fn spawn_hook_thread(global: Arc<HookGlobal>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("pointlab-rdev-hook".to_string())
        .spawn(move || {
            if let Err(e) = rdev::listen(move |event| handle_event(&global, event)) {
                log::error!("rdev::listen error: {e:?}");
            }
        })?;
    Ok(())
}

fn handle_event(global: &HookGlobal, event: rdev::Event) {
    let mut state = global.lock();
    match event.event_type {
        rdev::EventType::MouseMove { x, y } => {
            state.mouse.x = x;
            state.mouse.y = y;
        }
        rdev::EventType::ButtonPress(button) => set_button(&mut state.mouse, button, true),
        rdev::EventType::ButtonRelease(button) => set_button(&mut state.mouse, button, false),
        rdev::EventType::KeyPress(key) => match key {
            rdev::Key::Return | rdev::Key::KpReturn => state.acknowledge = true,
            rdev::Key::Escape => state.escape = true,
            other => {
                if let Some(n) = number_key(other) {
                    state.debug_key = Some(n);
                }
            }
        },
        rdev::EventType::KeyRelease(key) => {
            if matches!(key, rdev::Key::Return | rdev::Key::KpReturn) {
                state.acknowledge = false;
            }
        }
        rdev::EventType::Wheel { .. } => {}
    }
}

fn set_button(mouse: &mut MouseSnapshot, button: rdev::Button, down: bool) {
    match button {
        rdev::Button::Left => mouse.left = down,
        rdev::Button::Right => mouse.right = down,
        rdev::Button::Middle => mouse.middle = down,
        _ => {}
    }
}

fn number_key(key: rdev::Key) -> Option<u8> {
    let n = match key {
        rdev::Key::Num0 => 0,
        rdev::Key::Num1 => 1,
        rdev::Key::Num2 => 2,
        rdev::Key::Num3 => 3,
        rdev::Key::Num4 => 4,
        rdev::Key::Num5 => 5,
        rdev::Key::Num6 => 6,
        rdev::Key::Num7 => 7,
        rdev::Key::Num8 => 8,
        rdev::Key::Num9 => 9,
        _ => return None,
    };
    Some(n)
}

// ─── Source ───────────────────────────────────────────────────────────────────

/// Frame-paced source reading the global hook.
pub struct LiveInput {
    global: Arc<HookGlobal>,
    last_poll: Instant,
}

impl LiveInput {
    pub fn start(mode: InputMode) -> std::io::Result<Self> {
        let global = Arc::new(HookGlobal::default());
        spawn_hook_thread(Arc::clone(&global))?;
        if mode != InputMode::Mouse {
            log::error!("live_input: no {} device driver available; only mouse and keyboard are read", mode);
        }
        log::info!("live_input: hook started, mode={}", mode);
        Ok(Self {
            global,
            last_poll: Instant::now(),
        })
    }
}

/// Builds one frame from the hook snapshot, consuming one-shot keys.
fn take_frame(global: &HookGlobal, dt: f64) -> FrameInput {
    let mut state = global.lock();
    let keys = KeyboardSnapshot {
        acknowledge: state.acknowledge,
        escape: std::mem::take(&mut state.escape),
        debug_trial: state.debug_key.take(),
    };
    FrameInput {
        dt,
        mouse: Some(state.mouse),
        skeleton: None,
        wand: None,
        keys,
    }
}

impl InputSource for LiveInput {
    fn poll(&mut self) -> Option<FrameInput> {
        let since = self.last_poll.elapsed();
        if since < FRAME_INTERVAL {
            std::thread::sleep(FRAME_INTERVAL - since);
        }
        let now = Instant::now();
        let dt = now.duration_since(self.last_poll).as_secs_f64();
        self.last_poll = now;
        Some(take_frame(&self.global, dt))
    }

    fn set_pointer(&mut self, x: f64, y: f64) {
        if let Err(e) = rdev::simulate(&rdev::EventType::MouseMove { x, y }) {
            log::warn!("set_pointer: simulate failed: {e:?}");
            return;
        }
        let mut state = self.global.lock();
        state.mouse.x = x;
        state.mouse.y = y;
    }
}
