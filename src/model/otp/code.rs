use std::fmt::Display;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LENGTH: usize = 6;

/// A one-time-password code: exactly six decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code {
    digits: [u8; LENGTH],
}

impl Code {
    /// Generate a uniformly random code.
    pub fn random() -> Self {
        let digit_dist = Uniform::from(0..=9);
        let mut rng = rand::thread_rng();
        let mut digits = [0; LENGTH];
        for digit in &mut digits {
            *digit = digit_dist.sample(&mut rng);
        }
        Self { digits }
    }

    pub fn digits(&self) -> &[u8; LENGTH] {
        &self.digits
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for digit in self.digits {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Count chars rather than bytes so multi-byte input reports a sensible length.
        let len = s.chars().count();
        if len != LENGTH {
            return Err(ParseError::InvalidLength(len));
        }
        let mut digits = [0; LENGTH];
        for (digit, c) in digits.iter_mut().zip(s.chars()) {
            *digit = match c {
                '0'..='9' => c as u8 - b'0',
                _ => return Err(ParseError::InvalidChar(c)),
            };
        }
        Ok(Self { digits })
    }
}

impl TryFrom<String> for Code {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.to_string()
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("code must contain exactly 6 characters, found {0}")]
    InvalidLength(usize),
    #[error("code must contain only digits, found '{0}'")]
    InvalidChar(char),
}
