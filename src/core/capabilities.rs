//! Runtime-toggleable set of enabled API operations.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ApiSet: u32 {
        const TYPE_TEXT = 1 << 0;
        const KEY_TAP = 1 << 1;
        const CLIPBOARD_WRITE = 1 << 2;
        const CLIPBOARD_READ = 1 << 3;
        const SAVE_TEXTS = 1 << 4;
        const RUN_MACRO = 1 << 5;
    }
}

/// Wire names, in canonical order.
const NAMES: &[(ApiSet, &str)] = &[
    (ApiSet::TYPE_TEXT, "type-text"),
    (ApiSet::KEY_TAP, "key-tap"),
    (ApiSet::CLIPBOARD_WRITE, "clipboard-write"),
    (ApiSet::CLIPBOARD_READ, "clipboard-read"),
    (ApiSet::SAVE_TEXTS, "save-texts"),
    (ApiSet::RUN_MACRO, "run-macro"),
];

impl ApiSet {
    /// Set written into a freshly initialized config.
    pub fn suggested() -> Self {
        ApiSet::TYPE_TEXT | ApiSet::CLIPBOARD_WRITE | ApiSet::CLIPBOARD_READ | ApiSet::SAVE_TEXTS
    }

    /// Parse a comma separated list of names. Unknown names are ignored.
    pub fn parse(text: &str) -> Self {
        let mut set = ApiSet::empty();
        for word in text.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            match Self::from_wire_name(word) {
                Some(flag) => set |= flag,
                None => tracing::warn!(name = word, "ignoring unknown api name"),
            }
        }
        set
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }

    /// Name of a single flag; empty for combinations.
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, n)| *n)
            .unwrap_or("")
    }

    pub fn active(self, flag: ApiSet) -> bool {
        self.contains(flag)
    }

    pub fn names(self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, n)| *n)
            .collect()
    }

    pub fn to_text(self) -> String {
        self.names().join(",")
    }

    /// Every known flag with its name.
    pub fn known() -> impl Iterator<Item = (ApiSet, &'static str)> {
        NAMES.iter().copied()
    }
}

impl fmt::Display for ApiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_insensitive() {
        let a = ApiSet::parse("run-macro,type-text");
        let b = ApiSet::parse(" type-text , run-macro ");
        assert_eq!(a, b);
        assert!(a.active(ApiSet::RUN_MACRO));
        assert!(a.active(ApiSet::TYPE_TEXT));
        assert!(!a.active(ApiSet::KEY_TAP));
    }

    #[test]
    fn test_unknown_names_ignored() {
        let set = ApiSet::parse("key-tap,launch-missiles,,");
        assert_eq!(set, ApiSet::KEY_TAP);
    }

    #[test]
    fn test_wire_names_differ_from_constants() {
        assert_eq!(ApiSet::from_wire_name("type-text"), Some(ApiSet::TYPE_TEXT));
        assert_eq!(ApiSet::from_wire_name("TYPE_TEXT"), None);
        assert_eq!(ApiSet::from_name("TYPE_TEXT"), Some(ApiSet::TYPE_TEXT));
        assert!(ApiSet::parse("TYPE_TEXT").is_empty());
    }

    #[test]
    fn test_empty_means_nothing() {
        assert!(ApiSet::parse("").is_empty());
        assert_eq!(ApiSet::empty().to_text(), "");
    }

    #[test]
    fn test_to_text_canonical_order() {
        let set = ApiSet::parse("save-texts,key-tap,clipboard-read");
        assert_eq!(set.to_text(), "key-tap,clipboard-read,save-texts");
        assert_eq!(ApiSet::parse(&set.to_text()), set);
    }

    #[test]
    fn test_suggested_set() {
        assert_eq!(
            ApiSet::suggested().to_text(),
            "type-text,clipboard-write,clipboard-read,save-texts"
        );
    }

    #[test]
    fn test_single_flag_name() {
        assert_eq!(ApiSet::RUN_MACRO.name(), "run-macro");
        assert_eq!((ApiSet::RUN_MACRO | ApiSet::KEY_TAP).name(), "");
    }
}
