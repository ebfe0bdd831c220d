//! Executes compiled steps against an input driver.

use super::step::{ButtonAction, Coord, KeyAction, MouseOp, Step};
use crate::driver::{FocusHandle, InputDriver, Toggle};
use anyhow::Result;
use std::thread;
use std::time::Duration;

/// What happened during one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub skipped: usize,
}

pub struct Interpreter<'a> {
    driver: &'a dyn InputDriver,
    pause: Duration,
}

impl<'a> Interpreter<'a> {
    pub fn new(driver: &'a dyn InputDriver, pause: Duration) -> Self {
        Self { driver, pause }
    }

    /// Run all steps in order, pausing after each one. Blocks the calling thread.
    ///
    /// A failing or malformed step is logged and skipped; it never stops the run.
    pub fn run(&self, steps: &[Step]) -> RunSummary {
        let mut summary = RunSummary::default();
        self.run_into(steps, &mut summary);
        summary
    }

    fn run_into(&self, steps: &[Step], summary: &mut RunSummary) {
        for step in steps {
            tracing::debug!(?step, "macro step");
            match self.step(step, summary) {
                Ok(true) => summary.executed += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    tracing::error!(?step, error = %e, "macro step failed");
                    summary.skipped += 1;
                }
            }
            thread::sleep(self.pause);
        }
    }

    /// Ok(false) for steps that were skipped on purpose.
    fn step(&self, step: &Step, summary: &mut RunSummary) -> Result<bool> {
        match step {
            Step::Text(text) => self.driver.type_string(text)?,
            Step::Tap(key) => self.driver.key_tap(key, &[])?,
            Step::Chord { action, key, mods } => match action {
                KeyAction::Tap => self.driver.key_tap(key, mods)?,
                KeyAction::Down => self.driver.key_toggle(key, Toggle::Down, mods)?,
                KeyAction::Up => self.driver.key_toggle(key, Toggle::Up, mods)?,
            },
            Step::Mouse(ops) => return self.mouse(ops),
            Step::Focus { process, steps } => {
                let Some(_guard) = FocusGuard::switch(self.driver, process) else {
                    return Ok(false);
                };
                self.run_into(steps, summary);
            }
            Step::Malformed(reason) => {
                tracing::error!(reason = %reason, "skipping malformed macro step");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn mouse(&self, ops: &[MouseOp]) -> Result<bool> {
        for op in ops {
            match op {
                MouseOp::Button(button, action) => match action {
                    ButtonAction::Click => self.driver.mouse_click(*button, false)?,
                    ButtonAction::Double => self.driver.mouse_click(*button, true)?,
                    ButtonAction::Toggle(t) => self.driver.mouse_toggle(*button, *t)?,
                },
                MouseOp::Move(x, y) => {
                    let (x, y) = self.resolve(*x, *y)?;
                    self.driver.mouse_move(x, y)?;
                }
                MouseOp::Drag(x, y) => {
                    let (x, y) = self.resolve(*x, *y)?;
                    self.driver.mouse_drag(x, y)?;
                }
                MouseOp::Scroll(count, dir) => self.driver.mouse_scroll(*count, *dir)?,
                MouseOp::Abort(reason) => {
                    tracing::error!(reason = %reason, "abandoning rest of mouse sequence");
                    break;
                }
            }
        }
        Ok(true)
    }

    fn resolve(&self, x: Coord, y: Coord) -> Result<(i32, i32)> {
        if !x.is_relative() && !y.is_relative() {
            return Ok((x.resolve(0), y.resolve(0)));
        }
        let (px, py) = self.driver.pointer_position()?;
        Ok((x.resolve(px), y.resolve(py)))
    }
}

/// Restores the previously focused window when dropped.
struct FocusGuard<'a> {
    driver: &'a dyn InputDriver,
    previous: FocusHandle,
    process: String,
}

impl<'a> FocusGuard<'a> {
    fn switch(driver: &'a dyn InputDriver, process: &str) -> Option<Self> {
        let previous = match driver.active_process() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(process, error = %e, "cannot remember focus, skipping switch");
                return None;
            }
        };
        if let Err(e) = driver.focus_process(process) {
            tracing::error!(process, error = %e, "cannot focus process, skipping its steps");
            return None;
        }
        tracing::debug!(process, "macro switched focus");
        Some(Self {
            driver,
            previous,
            process: process.to_string(),
        })
    }
}

impl Drop for FocusGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!(process = %self.process, "macro switching focus back");
        if let Err(e) = self.driver.restore_focus(&self.previous) {
            tracing::warn!(error = %e, "failed to restore focus");
        }
    }
}
