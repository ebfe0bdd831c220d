//! Driver that only logs what it would inject.

use super::{Clipboard, FocusHandle, InputDriver, MouseButton, ScrollDirection, Toggle};
use anyhow::Result;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    pointer: (i32, i32),
    clipboard: String,
    focus: Option<String>,
}

/// Tracks pointer, clipboard and focus in memory so relative moves and
/// clipboard reads behave plausibly.
#[derive(Debug, Default)]
pub struct DryRunDriver {
    state: Mutex<State>,
}

impl DryRunDriver {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl InputDriver for DryRunDriver {
    fn type_string(&self, text: &str) -> Result<()> {
        tracing::info!(chars = text.chars().count(), "dry-run: type text");
        Ok(())
    }

    fn key_tap(&self, key: &str, mods: &[String]) -> Result<()> {
        tracing::info!(key, ?mods, "dry-run: tap key");
        Ok(())
    }

    fn key_toggle(&self, key: &str, toggle: Toggle, mods: &[String]) -> Result<()> {
        tracing::info!(key, ?toggle, ?mods, "dry-run: toggle key");
        Ok(())
    }

    fn mouse_move(&self, x: i32, y: i32) -> Result<()> {
        tracing::info!(x, y, "dry-run: move pointer");
        self.state().pointer = (x, y);
        Ok(())
    }

    fn mouse_drag(&self, x: i32, y: i32) -> Result<()> {
        tracing::info!(x, y, "dry-run: drag pointer");
        self.state().pointer = (x, y);
        Ok(())
    }

    fn mouse_scroll(&self, count: u32, direction: ScrollDirection) -> Result<()> {
        tracing::info!(count, ?direction, "dry-run: scroll");
        Ok(())
    }

    fn mouse_click(&self, button: MouseButton, double: bool) -> Result<()> {
        tracing::info!(?button, double, "dry-run: click");
        Ok(())
    }

    fn mouse_toggle(&self, button: MouseButton, toggle: Toggle) -> Result<()> {
        tracing::info!(?button, ?toggle, "dry-run: toggle button");
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32)> {
        Ok(self.state().pointer)
    }

    fn active_process(&self) -> Result<FocusHandle> {
        let focus = self.state().focus.clone().unwrap_or_default();
        Ok(FocusHandle(focus))
    }

    fn focus_process(&self, name: &str) -> Result<()> {
        tracing::info!(process = name, "dry-run: focus process");
        self.state().focus = Some(name.to_string());
        Ok(())
    }

    fn restore_focus(&self, previous: &FocusHandle) -> Result<()> {
        tracing::info!(handle = %previous, "dry-run: restore focus");
        self.state().focus = Some(previous.0.clone()).filter(|f| !f.is_empty());
        Ok(())
    }
}

impl Clipboard for DryRunDriver {
    fn read(&self) -> Result<String> {
        Ok(self.state().clipboard.clone())
    }

    fn write(&self, text: &str) -> Result<()> {
        tracing::info!(chars = text.chars().count(), "dry-run: write clipboard");
        self.state().clipboard = text.to_string();
        Ok(())
    }
}
