//! X11 backend wrapping the `xdotool` and `xclip` command line tools.

use super::{Clipboard, FocusHandle, InputDriver, MouseButton, ScrollDirection, Toggle};
use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct XdotoolDriver {
    program: String,
}

impl Default for XdotoolDriver {
    fn default() -> Self {
        Self {
            program: "xdotool".to_string(),
        }
    }
}

impl XdotoolDriver {
    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    fn run(&self, args: &[String]) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(args);
        let verb = args.first().map_or("", String::as_str);
        run(cmd).with_context(|| format!("{} {}", self.program, verb))
    }

    fn output(&self, args: &[&str]) -> Result<String> {
        let mut cmd = self.command();
        cmd.args(args);
        output(cmd).with_context(|| format!("{} {}", self.program, args.join(" ")))
    }
}

/// Map common key names to X keysyms; everything else passes through.
pub fn keysym(name: &str) -> String {
    let mapped = match name.to_ascii_lowercase().as_str() {
        "enter" | "return" => "Return",
        "tab" => "Tab",
        "esc" | "escape" => "Escape",
        "backspace" => "BackSpace",
        "delete" | "del" => "Delete",
        "insert" => "Insert",
        "space" => "space",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "home" => "Home",
        "end" => "End",
        "pageup" => "Prior",
        "pagedown" => "Next",
        "ctrl" | "control" => "ctrl",
        "alt" => "alt",
        "shift" => "shift",
        "cmd" | "command" | "super" | "win" => "super",
        lower => {
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                return format!("F{}", n);
            }
            return name.to_string();
        }
    };
    mapped.to_string()
}

/// `mods+...+key` in xdotool's combination syntax.
pub fn combo(key: &str, mods: &[String]) -> String {
    mods.iter()
        .map(|m| keysym(m))
        .chain(std::iter::once(keysym(key)))
        .collect::<Vec<_>>()
        .join("+")
}

fn button_number(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "1",
        MouseButton::Middle => "2",
        MouseButton::Right => "3",
    }
}

fn scroll_button(direction: ScrollDirection) -> &'static str {
    match direction {
        ScrollDirection::Up => "4",
        ScrollDirection::Down => "5",
        ScrollDirection::Left => "6",
        ScrollDirection::Right => "7",
    }
}

/// Parse `xdotool getmouselocation --shell` output.
pub fn parse_location(text: &str) -> Result<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("X=") {
            x = Some(v.trim().parse::<i32>().context("parse pointer x")?);
        } else if let Some(v) = line.strip_prefix("Y=") {
            y = Some(v.trim().parse::<i32>().context("parse pointer y")?);
        }
    }
    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => bail!("unexpected getmouselocation output: {}", text.trim()),
    }
}

/// Screen coordinates for xdotool, which reads a leading `-` as an option.
fn screen_coords(x: i32, y: i32) -> (String, String) {
    (x.max(0).to_string(), y.max(0).to_string())
}

fn args<const N: usize>(list: [&str; N]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl InputDriver for XdotoolDriver {
    fn type_string(&self, text: &str) -> Result<()> {
        self.run(&args(["type", "--clearmodifiers", "--", text]))
    }

    fn key_tap(&self, key: &str, mods: &[String]) -> Result<()> {
        self.run(&args(["key", "--clearmodifiers", "--", &combo(key, mods)]))
    }

    fn key_toggle(&self, key: &str, toggle: Toggle, mods: &[String]) -> Result<()> {
        let verb = match toggle {
            Toggle::Down => "keydown",
            Toggle::Up => "keyup",
        };
        self.run(&args([verb, "--", &combo(key, mods)]))
    }

    fn mouse_move(&self, x: i32, y: i32) -> Result<()> {
        let (x, y) = screen_coords(x, y);
        self.run(&args(["mousemove", "--sync", &x, &y]))
    }

    fn mouse_drag(&self, x: i32, y: i32) -> Result<()> {
        let (x, y) = screen_coords(x, y);
        self.run(&args([
            "mousedown",
            "1",
            "mousemove",
            "--sync",
            &x,
            &y,
            "mouseup",
            "1",
        ]))
    }

    fn mouse_scroll(&self, count: u32, direction: ScrollDirection) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        self.run(&args([
            "click",
            "--repeat",
            &count.to_string(),
            scroll_button(direction),
        ]))
    }

    fn mouse_click(&self, button: MouseButton, double: bool) -> Result<()> {
        let repeat = if double { "2" } else { "1" };
        self.run(&args(["click", "--repeat", repeat, button_number(button)]))
    }

    fn mouse_toggle(&self, button: MouseButton, toggle: Toggle) -> Result<()> {
        let verb = match toggle {
            Toggle::Down => "mousedown",
            Toggle::Up => "mouseup",
        };
        self.run(&args([verb, button_number(button)]))
    }

    fn pointer_position(&self) -> Result<(i32, i32)> {
        let out = self.output(&["getmouselocation", "--shell"])?;
        parse_location(&out)
    }

    fn active_process(&self) -> Result<FocusHandle> {
        let out = self.output(&["getactivewindow"])?;
        Ok(FocusHandle(out.trim().to_string()))
    }

    fn focus_process(&self, name: &str) -> Result<()> {
        let out = self.output(&["search", "--onlyvisible", "--class", name])?;
        let window = out
            .lines()
            .next()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(|| anyhow!("no visible window for {}", name))?;
        self.run(&args(["windowactivate", "--sync", window]))
    }

    fn restore_focus(&self, previous: &FocusHandle) -> Result<()> {
        self.run(&args(["windowactivate", "--sync", &previous.0]))
    }
}

#[derive(Debug, Clone)]
pub struct XclipClipboard {
    program: String,
}

impl Default for XclipClipboard {
    fn default() -> Self {
        Self {
            program: "xclip".to_string(),
        }
    }
}

impl Clipboard for XclipClipboard {
    fn read(&self) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-selection", "clipboard", "-o"]);
        output(cmd).context("xclip read")
    }

    fn write(&self, text: &str) -> Result<()> {
        // xclip forks a selection owner that outlives the command and keeps
        // inherited pipes open, so only stdin is piped.
        let mut child = Command::new(&self.program)
            .args(["-selection", "clipboard", "-i"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("run xclip")?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .context("write to xclip")?;
        }
        let status = child.wait().context("wait for xclip")?;
        if !status.success() {
            bail!("xclip failed: {}", status);
        }
        Ok(())
    }
}

fn run(mut cmd: Command) -> Result<()> {
    let output = cmd.output().context("run command")?;
    if output.status.success() {
        return Ok(());
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("command failed: {}{}", stdout, stderr);
}

fn output(mut cmd: Command) -> Result<String> {
    let output = cmd.output().context("run command")?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("command failed: {}", stderr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keysym_mapping() {
        assert_eq!(keysym("enter"), "Return");
        assert_eq!(keysym("ESC"), "Escape");
        assert_eq!(keysym("f5"), "F5");
        assert_eq!(keysym("a"), "a");
        assert_eq!(keysym("KP_Add"), "KP_Add");
        assert_eq!(keysym("foo"), "foo");
    }

    #[test]
    fn test_combo_order() {
        let mods = vec!["ctrl".to_string(), "shift".to_string()];
        assert_eq!(combo("t", &mods), "ctrl+shift+t");
        assert_eq!(combo("enter", &[]), "Return");
    }

    #[test]
    fn test_parse_location() {
        let out = "X=640\nY=-12\nSCREEN=0\nWINDOW=4194311\n";
        assert_eq!(parse_location(out).unwrap(), (640, -12));
        assert!(parse_location("SCREEN=0\n").is_err());
        assert!(parse_location("X=a\nY=1\n").is_err());
    }

    #[test]
    fn test_negative_coords_clamped() {
        assert_eq!(screen_coords(-5, 12), ("0".to_string(), "12".to_string()));
        assert_eq!(screen_coords(640, -1), ("640".to_string(), "0".to_string()));
    }

    #[cfg(unix)]
    fn fake_xclip(dir: &tempfile::TempDir, body: &str) -> XclipClipboard {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join("xclip");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        XclipClipboard {
            program: path.to_string_lossy().into_owned(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_clipboard_write_returns_while_owner_lives() {
        let dir = tempfile::TempDir::new().unwrap();
        // stays alive holding stdout/stderr, like xclip's selection owner
        let clip = fake_xclip(&dir, "cat > /dev/null\nsleep 30 &\nexit 0");
        let start = std::time::Instant::now();
        clip.write("hello").unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_clipboard_write_failure_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let clip = fake_xclip(&dir, "cat > /dev/null\nexit 3");
        assert!(clip.write("hello").is_err());
    }

    #[test]
    fn test_missing_binary_is_error() {
        let driver = XdotoolDriver {
            program: "/nonexistent/xdotool".to_string(),
        };
        assert!(driver.key_tap("a", &[]).is_err());
        assert!(driver.pointer_position().is_err());
    }
}
