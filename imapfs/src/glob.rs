//! # Glob module
//!
//! Matching of single path components against shell-like patterns.
//! Supported syntax: `*` (any sequence), `?` (any character),
//! `[abc]`, `[a-z]` and `[!abc]` (character classes). A component
//! made of `**` only matches any number of path levels, which is
//! handled by the filesystem itself (see [`is_recursive`]).

use regex::Regex;

use crate::{Error, Result};

/// Return `true` if the given pattern component matches any number
/// of path levels.
pub fn is_recursive(component: &str) -> bool {
    component == "**"
}

/// A compiled glob pattern for one path component.
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&translate(pattern))
            .map_err(|err| Error::CompileGlobError(err, pattern.to_owned()))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Translate a glob component into an anchored regular expression.
fn translate(pattern: &str) -> String {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                // consecutive stars are equivalent to a single one
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                regex.push_str("[^/]*");
            }
            '?' => regex.push_str("[^/]"),
            '[' => {
                let mut class = String::new();
                let mut closed = false;

                if matches!(chars.peek(), Some('!') | Some('^')) {
                    chars.next();
                    class.push('^');
                }

                // a leading bracket is part of the class
                if chars.peek() == Some(&']') {
                    chars.next();
                    class.push_str("\\]");
                }

                for c in chars.by_ref() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' | '[' | '&' | '~' => {
                            class.push('\\');
                            class.push(c);
                        }
                        c => class.push(c),
                    }
                }

                if closed {
                    regex.push('[');
                    regex.push_str(&class);
                    regex.push(']');
                } else {
                    // unclosed class, match the characters literally
                    regex.push_str(&regex::escape("["));
                    regex.push_str(&regex::escape(&class));
                }
            }
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    regex.push('$');
    regex
}
