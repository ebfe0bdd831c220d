//! Compilation of parsed expressions into executable steps.

use super::parse::{Brace, Expr};
use crate::driver::{MouseButton, ScrollDirection, Toggle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Tap,
    Down,
    Up,
}

impl KeyAction {
    fn keyword(word: &str) -> Option<Self> {
        match word {
            "tap" => Some(Self::Tap),
            "down" => Some(Self::Down),
            "up" => Some(Self::Up),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coord {
    Abs(i32),
    /// Offset from the pointer position read right before the move.
    Rel(i32),
}

impl Coord {
    fn parse(token: &str) -> Option<Self> {
        if let Some(n) = token.strip_prefix('+') {
            return n.parse().ok().map(Coord::Rel);
        }
        if let Some(n) = token.strip_prefix('-') {
            return n.parse::<i32>().ok().map(|n| Coord::Rel(-n));
        }
        token.parse().ok().map(Coord::Abs)
    }

    pub fn is_relative(self) -> bool {
        matches!(self, Coord::Rel(_))
    }

    pub fn resolve(self, current: i32) -> i32 {
        match self {
            Coord::Abs(v) => v,
            Coord::Rel(d) => current.saturating_add(d),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Click,
    Double,
    Toggle(Toggle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MouseOp {
    Button(MouseButton, ButtonAction),
    Move(Coord, Coord),
    Drag(Coord, Coord),
    Scroll(u32, ScrollDirection),
    /// Stops the rest of the sequence; earlier ops still run.
    Abort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Text(String),
    Tap(String),
    Chord {
        action: KeyAction,
        key: String,
        mods: Vec<String>,
    },
    Mouse(Vec<MouseOp>),
    Focus {
        process: String,
        steps: Vec<Step>,
    },
    /// Logged and skipped at run time.
    Malformed(String),
}

pub fn compile(exprs: &[Expr]) -> Vec<Step> {
    exprs.iter().map(compile_one).collect()
}

fn compile_one(expr: &Expr) -> Step {
    match expr {
        Expr::Atom {
            text, quoted: true, ..
        } => Step::Text(text.clone()),
        Expr::Atom {
            text, meta: true, ..
        } => Step::Malformed(format!("meta atom \\{} outside a key chord", text)),
        Expr::Atom { text, .. } => Step::Tap(text.clone()),
        Expr::Seq { meta: true, .. } => Step::Malformed("meta sequence".to_string()),
        Expr::Seq {
            brace: Brace::Square,
            elems,
            ..
        } => chord(elems),
        Expr::Seq {
            brace: Brace::Curly,
            elems,
            ..
        } => Step::Mouse(mouse(elems)),
        Expr::Seq {
            brace: Brace::Paren,
            elems,
            ..
        } => focus(elems),
    }
}

/// `[key mods...]` or `[action key mods...]`.
///
/// The first element is an action keyword when it carries the meta marker,
/// or when it is a bare `tap`/`down`/`up` followed by more elements.
fn chord(elems: &[Expr]) -> Step {
    let mut words = Vec::with_capacity(elems.len());
    for e in elems {
        match e.text() {
            Some(t) => words.push((t, matches!(e, Expr::Atom { meta: true, .. }))),
            None => return Step::Malformed("nested sequence in key chord".to_string()),
        }
    }
    let Some(&(first, first_meta)) = words.first() else {
        return Step::Malformed("empty key chord".to_string());
    };

    let explicit = if first_meta {
        match KeyAction::keyword(first) {
            Some(action) => Some(action),
            None => return Step::Malformed(format!("unknown key action \\{}", first)),
        }
    } else if words.len() > 1 {
        KeyAction::keyword(first)
    } else {
        None
    };

    let (action, rest) = match explicit {
        Some(action) => (action, &words[1..]),
        None => (KeyAction::Tap, &words[..]),
    };
    let Some(&(key, _)) = rest.first() else {
        return Step::Malformed(format!("missing key after {:?} in key chord", action));
    };
    Step::Chord {
        action,
        key: key.to_string(),
        mods: rest[1..].iter().map(|(m, _)| m.to_string()).collect(),
    }
}

fn mouse(elems: &[Expr]) -> Vec<MouseOp> {
    let mut ops = Vec::new();
    let mut tokens = elems.iter();
    while let Some(e) = tokens.next() {
        let Some(word) = e.text() else {
            ops.push(MouseOp::Abort("nested sequence in mouse actions".to_string()));
            break;
        };
        let op = match word {
            "left" | "middle" | "right" => {
                let button = MouseButton::parse(word).unwrap_or(MouseButton::Left);
                match tokens.next().and_then(Expr::text) {
                    Some("click") => MouseOp::Button(button, ButtonAction::Click),
                    Some("double") => MouseOp::Button(button, ButtonAction::Double),
                    Some("down") => MouseOp::Button(button, ButtonAction::Toggle(Toggle::Down)),
                    Some("up") => MouseOp::Button(button, ButtonAction::Toggle(Toggle::Up)),
                    other => MouseOp::Abort(format!(
                        "unknown mouse-button action {:?}",
                        other.unwrap_or("")
                    )),
                }
            }
            "click" | "drag" => {
                let x = tokens.next().and_then(Expr::text).and_then(Coord::parse);
                let y = tokens.next().and_then(Expr::text).and_then(Coord::parse);
                match (x, y) {
                    (Some(x), Some(y)) if word == "click" => MouseOp::Move(x, y),
                    (Some(x), Some(y)) => MouseOp::Drag(x, y),
                    _ => MouseOp::Abort(format!("{} needs two coordinates", word)),
                }
            }
            "scroll" => {
                let count = tokens
                    .next()
                    .and_then(Expr::text)
                    .and_then(|t| t.parse::<u32>().ok());
                let dir = tokens
                    .next()
                    .and_then(Expr::text)
                    .and_then(ScrollDirection::parse);
                match (count, dir) {
                    (Some(count), Some(dir)) => MouseOp::Scroll(count, dir),
                    _ => MouseOp::Abort("scroll needs a count and a direction".to_string()),
                }
            }
            other => MouseOp::Abort(format!("unknown mouse action {:?}", other)),
        };
        let abort = matches!(op, MouseOp::Abort(_));
        ops.push(op);
        if abort {
            break;
        }
    }
    ops
}

/// `(process steps...)`
fn focus(elems: &[Expr]) -> Step {
    match elems.split_first() {
        Some((Expr::Atom { text, .. }, rest)) if !text.is_empty() => Step::Focus {
            process: text.clone(),
            steps: compile(rest),
        },
        Some(_) => Step::Malformed("focus switch needs a process name".to_string()),
        None => Step::Malformed("empty focus switch".to_string()),
    }
}

/// Number of steps including those nested in focus switches.
pub fn count(steps: &[Step]) -> usize {
    steps
        .iter()
        .map(|s| match s {
            Step::Focus { steps, .. } => 1 + count(steps),
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::parse::parse;

    fn compile_src(src: &str) -> Vec<Step> {
        compile(&parse(src).unwrap())
    }

    fn mods(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_text_and_tap() {
        assert_eq!(
            compile_src(r#""Hello" [tap enter] tab"#),
            vec![
                Step::Text("Hello".to_string()),
                Step::Chord {
                    action: KeyAction::Tap,
                    key: "enter".to_string(),
                    mods: vec![]
                },
                Step::Tap("tab".to_string()),
            ]
        );
    }

    #[test]
    fn test_chord_forms() {
        assert_eq!(
            compile_src("[t ctrl shift]"),
            vec![Step::Chord {
                action: KeyAction::Tap,
                key: "t".to_string(),
                mods: mods(&["ctrl", "shift"])
            }]
        );
        assert_eq!(
            compile_src(r"[\down shift]"),
            vec![Step::Chord {
                action: KeyAction::Down,
                key: "shift".to_string(),
                mods: vec![]
            }]
        );
        assert_eq!(
            compile_src("[up a alt]"),
            vec![Step::Chord {
                action: KeyAction::Up,
                key: "a".to_string(),
                mods: mods(&["alt"])
            }]
        );
        // a lone bare keyword is the key itself
        assert_eq!(
            compile_src("[up]"),
            vec![Step::Chord {
                action: KeyAction::Tap,
                key: "up".to_string(),
                mods: vec![]
            }]
        );
    }

    #[test]
    fn test_chord_malformed() {
        assert!(matches!(compile_src(r"[\down]")[0], Step::Malformed(_)));
        assert!(matches!(compile_src(r"[\jump a]")[0], Step::Malformed(_)));
        assert!(matches!(compile_src("[]")[0], Step::Malformed(_)));
        assert!(matches!(compile_src("[a [b]]")[0], Step::Malformed(_)));
    }

    #[test]
    fn test_mouse_ops() {
        assert_eq!(
            compile_src("{left click right double click +10 -5 drag 3 4 scroll 2 down middle up}"),
            vec![Step::Mouse(vec![
                MouseOp::Button(MouseButton::Left, ButtonAction::Click),
                MouseOp::Button(MouseButton::Right, ButtonAction::Double),
                MouseOp::Move(Coord::Rel(10), Coord::Rel(-5)),
                MouseOp::Drag(Coord::Abs(3), Coord::Abs(4)),
                MouseOp::Scroll(2, ScrollDirection::Down),
                MouseOp::Button(MouseButton::Middle, ButtonAction::Toggle(Toggle::Up)),
            ])]
        );
    }

    #[test]
    fn test_mouse_unknown_token_aborts_rest() {
        let steps = compile_src("{left click wiggle right click}");
        let Step::Mouse(ops) = &steps[0] else {
            panic!("expected mouse step");
        };
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], MouseOp::Button(MouseButton::Left, ButtonAction::Click));
        assert!(matches!(ops[1], MouseOp::Abort(_)));
    }

    #[test]
    fn test_mouse_missing_coordinate() {
        let steps = compile_src("{click 10}");
        assert!(matches!(&steps[0], Step::Mouse(ops) if matches!(ops[..], [MouseOp::Abort(_)])));
    }

    #[test]
    fn test_focus_nesting() {
        let steps = compile_src(r#"(editor "x" [tap s ctrl])"#);
        assert_eq!(count(&steps), 3);
        let Step::Focus { process, steps } = &steps[0] else {
            panic!("expected focus step");
        };
        assert_eq!(process, "editor");
        assert_eq!(steps[0], Step::Text("x".to_string()));
        assert!(matches!(compile_src("()")[0], Step::Malformed(_)));
        assert!(matches!(compile_src("([a] b)")[0], Step::Malformed(_)));
    }

    #[test]
    fn test_meta_outside_chord_malformed() {
        assert!(matches!(compile_src(r"\enter")[0], Step::Malformed(_)));
        assert!(matches!(compile_src(r"\[a]")[0], Step::Malformed(_)));
    }

    #[test]
    fn test_coord_parse() {
        assert_eq!(Coord::parse("+7"), Some(Coord::Rel(7)));
        assert_eq!(Coord::parse("-7"), Some(Coord::Rel(-7)));
        assert_eq!(Coord::parse("42"), Some(Coord::Abs(42)));
        assert_eq!(Coord::parse("x"), None);
        assert_eq!(Coord::Rel(-5).resolve(100), 95);
        assert_eq!(Coord::Abs(3).resolve(100), 3);
    }
}
