use std::fmt;

/// Opening classification code: one letter `A`..=`E` followed by two digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassificationCode([u8; 3]);

impl ClassificationCode {
    /// Parses exactly three bytes `[A-E][0-9][0-9]`.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes: [u8; 3] = s.as_bytes().try_into().ok()?;
        let [letter, d1, d2] = bytes;
        if !(b'A'..=b'E').contains(&letter) || !d1.is_ascii_digit() || !d2.is_ascii_digit() {
            return None;
        }
        Some(Self(bytes))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII bytes pass `parse`.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for ClassificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
