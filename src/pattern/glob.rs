use regex::Regex;

use super::core::InvalidPatternError;

/// Translate a glob-token path into an anchored character-level expression.
///
/// `+` and `?` keep their repetition meaning over the preceding character,
/// `*` matches any run of characters (crossing `/`), everything else is
/// matched literally. A `:name` segment matches one path segment's worth of
/// characters without capturing.
pub(super) fn compile_glob(path: &str) -> Result<Regex, InvalidPatternError> {
    let mut expr = String::with_capacity(path.len() + 8);
    expr.push('^');
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            expr.push('/');
        }
        if segment.starts_with(':') {
            expr.push_str("[^/]+");
            continue;
        }
        for ch in segment.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '+' | '?' => expr.push(ch),
                '.' | '^' | '$' | '|' | '(' | ')' | '[' | ']' | '{' | '}' | '\\' => {
                    expr.push('\\');
                    expr.push(ch);
                }
                _ => expr.push(ch),
            }
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|source| InvalidPatternError::Expression {
        pattern: path.to_string(),
        source,
    })
}
