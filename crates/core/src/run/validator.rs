//! Module-11 RUN check character computation and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RunError;

/// Separator characters accepted (and stripped) in permissive mode.
const SEPARATORS: [char; 2] = ['-', '.'];

/// How separator punctuation in a RUN is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunFormat {
    /// Hyphens and periods are a format error (`123456785`).
    #[default]
    Strict,
    /// Hyphens and periods are stripped before validating (`12.345.678-5`).
    Permissive,
}

impl RunFormat {
    /// Map the boolean `strict_format` flag onto a format mode.
    pub fn from_strict(strict_format: bool) -> Self {
        if strict_format {
            RunFormat::Strict
        } else {
            RunFormat::Permissive
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, RunFormat::Strict)
    }
}

/// A validated RUN, stored in compact normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Run {
    body: String,
    check: char,
}

impl Run {
    /// Numeric body (everything before the check character).
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Check character, `0`-`9` or `K`.
    pub fn check(&self) -> char {
        self.check
    }

    /// Human-readable form with thousands separators, e.g. `12.345.678-5`.
    pub fn formatted(&self) -> String {
        let digits: Vec<char> = self.body.chars().collect();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(*c);
        }
        out.push('-');
        out.push(self.check);
        out
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.body, self.check)
    }
}

impl FromStr for Run {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_run(s, RunFormat::Strict)
    }
}

/// Compute the module-11 check character for a digit body.
///
/// Returns `None` if the body is empty or contains anything but ASCII digits.
pub fn compute_check_digit(body: &str) -> Option<char> {
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = body
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .zip((2..=7).cycle())
        .map(|(digit, weight)| digit * weight)
        .sum();

    let residue = (11 - sum % 11) % 11;
    match residue {
        10 => Some('K'),
        r => char::from_digit(r, 10),
    }
}

/// Validate a RUN string (`body` followed by one check character).
///
/// Leading and trailing whitespace is ignored and the check character is
/// uppercased. In [`RunFormat::Strict`] mode hyphens and periods are rejected;
/// in [`RunFormat::Permissive`] mode they are removed first.
pub fn validate_run(input: &str, format: RunFormat) -> Result<Run, RunError> {
    let normalized = input.trim().to_uppercase();

    let compact: String = match format {
        RunFormat::Strict => {
            if normalized.contains(SEPARATORS) {
                return Err(RunError::format(
                    normalized,
                    "contains periods and/or hyphen",
                ));
            }
            normalized.clone()
        }
        RunFormat::Permissive => normalized.chars().filter(|c| !SEPARATORS.contains(c)).collect(),
    };

    let mut chars = compact.chars();
    let check = chars
        .next_back()
        .ok_or_else(|| RunError::format(normalized.clone(), "value is empty"))?;
    let body = chars.as_str();

    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RunError::format(
            normalized,
            format!("body {:?} must contain only digits", body),
        ));
    }

    if !(check.is_ascii_digit() || check == 'K') {
        return Err(RunError::format(
            normalized,
            format!("{:?} is not a check character", check),
        ));
    }

    // Body is non-empty and all digits, so a check character always exists.
    let expected = compute_check_digit(body)
        .ok_or_else(|| RunError::format(normalized.clone(), "body must contain only digits"))?;

    if expected != check {
        return Err(RunError::ChecksumMismatch {
            value: normalized,
            expected,
        });
    }

    Ok(Run {
        body: body.to_string(),
        check,
    })
}

/// Boolean form of [`validate_run`].
pub fn is_valid_run(input: &str, format: RunFormat) -> bool {
    validate_run(input, format).is_ok()
}
