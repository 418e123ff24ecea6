//! Validated value types shared across the simward workspace.
//!
//! These wrappers guarantee their invariant at construction time so that
//! downstream code (stores, services, handlers) never needs to re-check it.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed; if the trimmed result is empty,
    /// `TextError::Empty` is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a page range.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageRangeError {
    /// The input did not match `"N"` or `"N-M"`
    #[error("Page range must be a page number or 'start-end', got '{0}'")]
    Malformed(String),
    /// Page numbers are 1-based; zero is never a valid page
    #[error("Page numbers start at 1")]
    ZeroPage,
    /// The start of the range was greater than the end
    #[error("Page range start {0} is greater than end {1}")]
    Inverted(u32, u32),
}

/// A validated, 1-based page selection within a paginated file.
///
/// Accepts either a single page (`"4"`) or an inclusive span (`"1-3"`).
/// Investigation-request approvals attach one of these to each file grant
/// that requires pagination, and the file-view path checks requested ranges
/// against the granted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Parses a page range from its string form.
    ///
    /// # Errors
    ///
    /// Returns `PageRangeError` if the input is not `"N"` or `"N-M"`, if any
    /// page number is zero, or if the range is inverted.
    pub fn parse(input: &str) -> Result<Self, PageRangeError> {
        let trimmed = input.trim();

        let (start_text, end_text) = match trimmed.split_once('-') {
            Some((s, e)) => (s.trim(), e.trim()),
            None => (trimmed, trimmed),
        };

        let start: u32 = start_text
            .parse()
            .map_err(|_| PageRangeError::Malformed(input.to_owned()))?;
        let end: u32 = end_text
            .parse()
            .map_err(|_| PageRangeError::Malformed(input.to_owned()))?;

        if start == 0 || end == 0 {
            return Err(PageRangeError::ZeroPage);
        }
        if start > end {
            return Err(PageRangeError::Inverted(start, end));
        }

        Ok(Self { start, end })
    }

    /// First page of the range (1-based, inclusive).
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last page of the range (inclusive).
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Returns true if `other` lies entirely within this range.
    pub fn contains(&self, other: &PageRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl std::str::FromStr for PageRange {
    type Err = PageRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageRange::parse(s)
    }
}

impl serde::Serialize for PageRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for PageRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PageRange::parse(&s).map_err(serde::de::Error::custom)
    }
}
