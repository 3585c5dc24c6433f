//! JSON pointer (RFC 6901) tokens.

/// Decodes one pointer token: `~1` is `/`, `~0` is `~`.
///
/// A `~` followed by anything else is kept as is.
///
/// ```
/// use pathstore_path::unescape_component;
///
/// assert_eq!(unescape_component("a~1b"), "a/b");
/// assert_eq!(unescape_component("~01"), "~1");
/// ```
pub fn unescape_component(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('1') => {
                chars.next();
                out.push('/');
            }
            Some('0') => {
                chars.next();
                out.push('~');
            }
            _ => out.push('~'),
        }
    }
    out
}

/// Encodes a key as a pointer token.
///
/// ```
/// use pathstore_path::escape_component;
///
/// assert_eq!(escape_component("m~n/o"), "m~0n~1o");
/// ```
pub fn escape_component(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            c => out.push(c),
        }
    }
    out
}

/// Whether `token` is a canonical array index: ASCII digits, no sign, no
/// leading zero.
///
/// ```
/// use pathstore_path::is_valid_index;
///
/// assert!(is_valid_index("10"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("+1"));
/// ```
pub fn is_valid_index(token: &str) -> bool {
    match token.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        digits => digits.iter().all(u8::is_ascii_digit),
    }
}
