//! Input injection capability.
//!
//! The server and the macro interpreter only talk to [`InputDriver`] and
//! [`Clipboard`]. Concrete backends live in the submodules.

use anyhow::{bail, Result};
use std::fmt;
use std::sync::Arc;

pub mod dry_run;
#[cfg(test)]
pub mod testing;
pub mod xdotool;

use crate::models::config::DriverKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "left" => Some(Self::Left),
            "middle" => Some(Self::Middle),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Opaque handle of a focused window or process, used to restore focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusHandle(pub String);

impl fmt::Display for FocusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyboard and mouse injection.
pub trait InputDriver: Send + Sync {
    fn type_string(&self, text: &str) -> Result<()>;
    fn key_tap(&self, key: &str, mods: &[String]) -> Result<()>;
    fn key_toggle(&self, key: &str, toggle: Toggle, mods: &[String]) -> Result<()>;
    fn mouse_move(&self, x: i32, y: i32) -> Result<()>;
    fn mouse_drag(&self, x: i32, y: i32) -> Result<()>;
    fn mouse_scroll(&self, count: u32, direction: ScrollDirection) -> Result<()>;
    fn mouse_click(&self, button: MouseButton, double: bool) -> Result<()>;
    fn mouse_toggle(&self, button: MouseButton, toggle: Toggle) -> Result<()>;
    fn pointer_position(&self) -> Result<(i32, i32)>;

    fn active_process(&self) -> Result<FocusHandle> {
        bail!("process focus is not supported by this driver")
    }

    fn focus_process(&self, name: &str) -> Result<()> {
        bail!("cannot focus {}: process focus is not supported by this driver", name)
    }

    fn restore_focus(&self, previous: &FocusHandle) -> Result<()> {
        bail!("cannot restore focus to {}: not supported by this driver", previous)
    }
}

pub trait Clipboard: Send + Sync {
    fn read(&self) -> Result<String>;
    fn write(&self, text: &str) -> Result<()>;
}

/// Build the configured backend pair.
pub fn build(kind: DriverKind) -> (Arc<dyn InputDriver>, Arc<dyn Clipboard>) {
    match kind {
        DriverKind::DryRun => {
            let driver = Arc::new(dry_run::DryRunDriver::default());
            (driver.clone(), driver)
        }
        DriverKind::Xdotool => (
            Arc::new(xdotool::XdotoolDriver::default()),
            Arc::new(xdotool::XclipClipboard::default()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words() {
        assert_eq!(MouseButton::parse("middle"), Some(MouseButton::Middle));
        assert_eq!(MouseButton::parse("center"), None);
        assert_eq!(ScrollDirection::parse("left"), Some(ScrollDirection::Left));
        assert_eq!(ScrollDirection::parse("sideways"), None);
    }

    #[test]
    fn test_build_dry_run_shares_state() {
        let (input, clipboard) = build(DriverKind::DryRun);
        input.mouse_move(3, 4).unwrap();
        assert_eq!(input.pointer_position().unwrap(), (3, 4));
        clipboard.write("x").unwrap();
        assert_eq!(clipboard.read().unwrap(), "x");
    }

    struct Inert;

    impl InputDriver for Inert {
        fn type_string(&self, _: &str) -> Result<()> {
            Ok(())
        }
        fn key_tap(&self, _: &str, _: &[String]) -> Result<()> {
            Ok(())
        }
        fn key_toggle(&self, _: &str, _: Toggle, _: &[String]) -> Result<()> {
            Ok(())
        }
        fn mouse_move(&self, _: i32, _: i32) -> Result<()> {
            Ok(())
        }
        fn mouse_drag(&self, _: i32, _: i32) -> Result<()> {
            Ok(())
        }
        fn mouse_scroll(&self, _: u32, _: ScrollDirection) -> Result<()> {
            Ok(())
        }
        fn mouse_click(&self, _: MouseButton, _: bool) -> Result<()> {
            Ok(())
        }
        fn mouse_toggle(&self, _: MouseButton, _: Toggle) -> Result<()> {
            Ok(())
        }
        fn pointer_position(&self) -> Result<(i32, i32)> {
            Ok((0, 0))
        }
    }

    #[test]
    fn test_default_focus_unsupported() {
        let driver = Inert;
        assert!(driver.active_process().is_err());
        assert!(driver.focus_process("firefox").is_err());
        assert!(driver.restore_focus(&FocusHandle("1".into())).is_err());
    }
}
