//! Inferred types recovered from `reveal_type(...)` diagnostics.
//!
//! The extracted text is engine-native: `builtins.int`, `int` and
//! `Literal[1]` may all describe the same value.

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealType {
    pub typ: String,
    pub sym: Option<String>,
}

/// Apply `re` to `text`; requires a `typ` group, `sym` is optional.
pub fn capture(re: &Regex, text: &str) -> Option<RevealType> {
    let caps = re.captures(text)?;
    let typ = caps.name("typ")?.as_str().to_string();
    let sym = caps.name("sym").map(|m| m.as_str().to_string());
    Some(RevealType { typ, sym })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_with_and_without_symbol() {
        let re = Regex::new(r#"Type of "(?P<sym>.*?)" is "(?P<typ>.*)""#).unwrap();
        assert_eq!(
            capture(&re, r#"Type of "x" is "int""#),
            Some(RevealType {
                typ: "int".into(),
                sym: Some("x".into())
            })
        );
        assert_eq!(capture(&re, "Name \"y\" is not defined"), None);

        let re = Regex::new(r"revealed type: (?P<typ>.*)").unwrap();
        assert_eq!(capture(&re, "revealed type: int").unwrap().sym, None);
    }
}
