//! Recording driver and in-memory clipboard for side-effect assertions.

use super::{Clipboard, FocusHandle, InputDriver, MouseButton, ScrollDirection, Toggle};
use anyhow::{bail, Result};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Type(String),
    Tap(String, Vec<String>),
    Toggle(String, Toggle, Vec<String>),
    Move(i32, i32),
    Drag(i32, i32),
    Scroll(u32, ScrollDirection),
    Click(MouseButton, bool),
    Button(MouseButton, Toggle),
    Focus(String),
    Restore(String),
}

#[derive(Debug)]
struct Inner {
    events: Vec<(Instant, Event)>,
    pointer: (i32, i32),
    focus: String,
}

#[derive(Debug)]
pub struct RecordingDriver {
    inner: Mutex<Inner>,
    fail_focus: bool,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Vec::new(),
                pointer: (0, 0),
                focus: "initial".to_string(),
            }),
            fail_focus: false,
        }
    }
}

impl RecordingDriver {
    pub fn with_pointer(x: i32, y: i32) -> Self {
        let driver = Self::default();
        driver.inner().pointer = (x, y);
        driver
    }

    /// A driver whose `focus_process` always fails.
    pub fn failing_focus() -> Self {
        Self {
            fail_focus: true,
            ..Self::default()
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: Event) {
        self.inner().events.push((Instant::now(), event));
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner().events.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn timed_events(&self) -> Vec<(Instant, Event)> {
        self.inner().events.clone()
    }

    pub fn focus(&self) -> String {
        self.inner().focus.clone()
    }
}

impl InputDriver for RecordingDriver {
    fn type_string(&self, text: &str) -> Result<()> {
        self.record(Event::Type(text.to_string()));
        Ok(())
    }

    fn key_tap(&self, key: &str, mods: &[String]) -> Result<()> {
        self.record(Event::Tap(key.to_string(), mods.to_vec()));
        Ok(())
    }

    fn key_toggle(&self, key: &str, toggle: Toggle, mods: &[String]) -> Result<()> {
        self.record(Event::Toggle(key.to_string(), toggle, mods.to_vec()));
        Ok(())
    }

    fn mouse_move(&self, x: i32, y: i32) -> Result<()> {
        self.inner().pointer = (x, y);
        self.record(Event::Move(x, y));
        Ok(())
    }

    fn mouse_drag(&self, x: i32, y: i32) -> Result<()> {
        self.inner().pointer = (x, y);
        self.record(Event::Drag(x, y));
        Ok(())
    }

    fn mouse_scroll(&self, count: u32, direction: ScrollDirection) -> Result<()> {
        self.record(Event::Scroll(count, direction));
        Ok(())
    }

    fn mouse_click(&self, button: MouseButton, double: bool) -> Result<()> {
        self.record(Event::Click(button, double));
        Ok(())
    }

    fn mouse_toggle(&self, button: MouseButton, toggle: Toggle) -> Result<()> {
        self.record(Event::Button(button, toggle));
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32)> {
        Ok(self.inner().pointer)
    }

    fn active_process(&self) -> Result<FocusHandle> {
        Ok(FocusHandle(self.focus()))
    }

    fn focus_process(&self, name: &str) -> Result<()> {
        if self.fail_focus {
            bail!("no window for {}", name);
        }
        self.inner().focus = name.to_string();
        self.record(Event::Focus(name.to_string()));
        Ok(())
    }

    fn restore_focus(&self, previous: &FocusHandle) -> Result<()> {
        self.inner().focus = previous.0.clone();
        self.record(Event::Restore(previous.0.clone()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<String>,
    writes: Mutex<usize>,
}

impl MemoryClipboard {
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self) -> Result<String> {
        Ok(self.content.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn write(&self, text: &str) -> Result<()> {
        *self.content.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
