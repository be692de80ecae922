//! Source rewriting applied before evaluation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINE_COMMENT: Regex = Regex::new(r"(?m)^([ \t]*)//(.*)$").unwrap();
}

/// Turn line-leading `//` comments into `#` comments.
///
/// Only a `//` preceded by nothing but whitespace on its line is rewritten;
/// markers elsewhere (`x = 1 // 2`, URLs in strings) are left alone.
pub fn slash_comments_to_hash(source: &str) -> String {
    LINE_COMMENT.replace_all(source, "${1}#${2}").into_owned()
}
