//! File     : version.rs
//! Abstract :
//!     A `version` is an ordered sequence of numeric and alphabetic tokens
//!     used to rank the releases of a core.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::str::FromStr;

use serde::de::{self};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum Token {
    Num(u64),
    Alpha(String),
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.cmp(b),
            (Self::Alpha(a), Self::Alpha(b)) => a.cmp(b),
            // a release number always outranks a pre-release label
            (Self::Num(_), Self::Alpha(_)) => Ordering::Greater,
            (Self::Alpha(_), Self::Num(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Alpha(s) => write!(f, "{}", s),
        }
    }
}

const ZERO: Token = Token::Num(0);

#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    tokens: Vec<Token>,
}

impl Version {
    /// Creates the version `0`.
    pub fn new() -> Self {
        Self {
            text: String::from("0"),
            tokens: vec![ZERO],
        }
    }

    pub fn get_tokens(&self) -> &Vec<Token> {
        &self.tokens
    }

    /// Returns the token at position `i`, treating missing positions as `0`.
    fn token(&self, i: usize) -> &Token {
        self.tokens.get(i).unwrap_or(&ZERO)
    }

    /// Tokens with trailing zeros removed, so `1.0` and `1.0.0` are identical.
    fn normalized(&self) -> &[Token] {
        let mut end = self.tokens.len();
        while end > 0 && self.tokens[end - 1] == ZERO {
            end -= 1;
        }
        &self.tokens[..end]
    }

    /// Checks if `other` shares every numeric token of `self` up to and
    /// including the leftmost non-zero one.
    pub fn is_caret_compatible(&self, other: &Version) -> bool {
        let pivot = self
            .tokens
            .iter()
            .position(|t| match t {
                Token::Num(n) => *n != 0,
                Token::Alpha(_) => true,
            })
            .unwrap_or(self.tokens.len().saturating_sub(1));
        (0..=pivot).all(|i| self.token(i) == other.token(i))
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        for i in 0..len {
            match self.token(i).cmp(other.token(i)) {
                Ordering::Equal => continue,
                o => return o,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() == true {
            return Err(VersionError::EmptyVersion);
        }
        let mut tokens = Vec::new();
        let mut word = String::new();

        let flush = |word: &mut String, tokens: &mut Vec<Token>| -> Result<(), VersionError> {
            if word.is_empty() == false {
                let tk = match word.chars().next() {
                    Some(c) if c.is_ascii_digit() => Token::Num(word.parse::<u64>()?),
                    _ => Token::Alpha(word.to_ascii_lowercase()),
                };
                tokens.push(tk);
                word.clear();
            }
            Ok(())
        };

        for c in s.chars() {
            match c {
                '.' | '-' | '_' | '+' => flush(&mut word, &mut tokens)?,
                c if c.is_ascii_alphanumeric() => {
                    // split at every digit/letter boundary
                    if let Some(prev) = word.chars().last() {
                        if prev.is_ascii_digit() != c.is_ascii_digit() {
                            flush(&mut word, &mut tokens)?;
                        }
                    }
                    word.push(c);
                }
                _ => return Err(VersionError::InvalidCharacter(c)),
            }
        }
        flush(&mut word, &mut tokens)?;

        if tokens.is_empty() == true {
            return Err(VersionError::EmptyVersion);
        }
        Ok(Self {
            text: s.to_string(),
            tokens: tokens,
        })
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct LayerVisitor;

        impl<'de> de::Visitor<'de> for LayerVisitor {
            type Value = Version;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a version string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match Version::from_str(v) {
                    Ok(v) => Ok(v),
                    Err(e) => Err(de::Error::custom(e)),
                }
            }
        }

        deserializer.deserialize_str(LayerVisitor)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, PartialEq)]
pub enum VersionError {
    EmptyVersion,
    InvalidCharacter(char),
    InvalidDigit(ParseIntError),
}

impl Error for VersionError {}

impl Display for VersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        use VersionError::*;
        match self {
            EmptyVersion => write!(f, "empty version"),
            InvalidCharacter(c) => write!(f, "invalid character {:?} in version", c),
            InvalidDigit(_) => write!(f, "invalid digit in version"),
        }
    }
}

impl From<ParseIntError> for VersionError {
    fn from(value: ParseIntError) -> Self {
        Self::InvalidDigit(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn v(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    #[test]
    fn tokenize() {
        assert_eq!(
            v("1.10rc2").get_tokens(),
            &vec![
                Token::Num(1),
                Token::Num(10),
                Token::Alpha(String::from("rc")),
                Token::Num(2)
            ]
        );
        assert_eq!(v("2_0-beta").get_tokens().len(), 3);
    }

    #[test]
    fn ordering() {
        assert!(v("1.2") < v("1.10"));
        assert!(v("1.0rc1") < v("1.0"));
        assert!(v("1.0a") < v("1.0b"));
        assert!(v("0.9.9") < v("1"));
        assert!(v("2.0") > v("1.99.99"));
    }

    #[test]
    fn trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        let mut set = HashSet::new();
        set.insert(v("1.0"));
        assert_eq!(set.contains(&v("1.0.0")), true);
        // original text is kept for display
        assert_eq!(v("1.0.0").to_string(), "1.0.0");
    }

    #[test]
    fn caret() {
        assert_eq!(v("1.2").is_caret_compatible(&v("1.9")), true);
        assert_eq!(v("1.2").is_caret_compatible(&v("2.0")), false);
        assert_eq!(v("0.3").is_caret_compatible(&v("0.3.7")), true);
        assert_eq!(v("0.3").is_caret_compatible(&v("0.4")), false);
        assert_eq!(v("0").is_caret_compatible(&v("0.0.1")), true);
    }

    #[test]
    fn from_str_bad() {
        assert_eq!(Version::from_str(""), Err(VersionError::EmptyVersion));
        assert_eq!(Version::from_str("..."), Err(VersionError::EmptyVersion));
        assert_eq!(
            Version::from_str("1.0:2"),
            Err(VersionError::InvalidCharacter(':'))
        );
    }

    #[test]
    fn serde_string() {
        let text = serde_json::to_string(&v("1.4.0")).unwrap();
        assert_eq!(text, "\"1.4.0\"");
        let back: Version = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v("1.4"));
    }
}
