use crate::error::Error;

pub const COMMENT_CHARS: [char; 2] = [';', '*'];

/// Drop everything from the first comment character on.
pub fn strip_comment(line: &str) -> &str {
    match line.find(|c| COMMENT_CHARS.contains(&c)) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Letter first, then letters, digits or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(head) if head.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    Byte(u8),
    Word(u16),
}

impl Number {
    pub fn value(&self) -> u16 {
        match self {
            Number::Byte(b) => *b as u16,
            Number::Word(w) => *w,
        }
    }
}

/// `$` always starts a number; without it a leading decimal digit does.
pub fn is_numeric(s: &str) -> bool {
    s.starts_with('$') || s.starts_with(|c: char| c.is_ascii_digit())
}

/// Two hex digits make a byte, four make a word. Nothing is padded.
pub fn parse_hex(s: &str) -> Result<Number, Error> {
    let digits = s.strip_prefix('$').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Conversion(s.to_string()));
    }
    let conversion = |_| Error::Conversion(s.to_string());
    match digits.len() {
        2 => Ok(Number::Byte(u8::from_str_radix(digits, 16).map_err(conversion)?)),
        4 => Ok(Number::Word(u16::from_str_radix(digits, 16).map_err(conversion)?)),
        n => Err(Error::AddressLength(
            s.to_string(),
            format!("has {} hex digit(s), expected 2 or 4", n),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments() {
        assert_eq!(strip_comment("lda #$01 ; load"), "lda #$01 ");
        assert_eq!(strip_comment("* banner"), "");
        assert_eq!(strip_comment("nop"), "nop");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("LOOP"));
        assert!(is_identifier("a1_b"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("$10"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn hex() {
        assert_eq!(parse_hex("$0a").unwrap(), Number::Byte(0x0A));
        assert_eq!(parse_hex("8000").unwrap(), Number::Word(0x8000));
        assert!(matches!(parse_hex("$1"), Err(Error::AddressLength(..))));
        assert!(matches!(parse_hex("$123"), Err(Error::AddressLength(..))));
        assert!(matches!(parse_hex("$zz"), Err(Error::Conversion(_))));
        assert!(matches!(parse_hex("$"), Err(Error::Conversion(_))));
    }
}
