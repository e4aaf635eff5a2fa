//! Partition limits and the human file-size notation they are parsed from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// A file size given in 1000-based units (`10mb` = 10_000_000 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSize {
    bytes: u64,
}

impl FileSize {
    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    pub fn total_bytes(self) -> u64 {
        self.bytes
    }

    /// Parse notations like `500` (bytes), `10kb`, `1.5mb`, `2gb`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().to_ascii_lowercase();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| ExportError::PartitionLimit(input.to_string()))?;
        let magnitude: u64 = match unit.trim() {
            "" | "b" => 1,
            "kb" => 1_000,
            "mb" => 1_000_000,
            "gb" => 1_000_000_000,
            _ => return Err(ExportError::PartitionLimit(input.to_string())),
        };

        if !value.is_finite() || value < 0.0 {
            return Err(ExportError::PartitionLimit(input.to_string()));
        }
        Ok(Self {
            bytes: (value * magnitude as f64).round() as u64,
        })
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.bytes)
    }
}

/// When to cut the current output file and roll over to the next partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartitionLimit {
    /// Never reached; the export stays in one file.
    #[default]
    Null,
    MessageCount(u64),
    ByteSize(FileSize),
}

impl PartitionLimit {
    /// Parse `"1000"` as a message count and unit-suffixed values as sizes.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::Null);
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            let count = trimmed
                .parse()
                .map_err(|_| ExportError::PartitionLimit(input.to_string()))?;
            return Ok(Self::MessageCount(count));
        }
        Ok(Self::ByteSize(FileSize::parse(trimmed)?))
    }

    pub fn is_reached(self, messages_written: u64, bytes_written: u64) -> bool {
        match self {
            Self::Null => false,
            Self::MessageCount(limit) => messages_written >= limit,
            Self::ByteSize(size) => bytes_written >= size.total_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_parsing() {
        assert_eq!(FileSize::parse("10mb").unwrap().total_bytes(), 10_000_000);
        assert_eq!(FileSize::parse("1.5mb").unwrap().total_bytes(), 1_500_000);
        assert_eq!(FileSize::parse("500kb").unwrap().total_bytes(), 500_000);
        assert_eq!(FileSize::parse("1gb").unwrap().total_bytes(), 1_000_000_000);
        assert_eq!(FileSize::parse("123").unwrap().total_bytes(), 123);
        assert_eq!(FileSize::parse("42b").unwrap().total_bytes(), 42);
    }

    #[test]
    fn file_size_rejects_garbage() {
        assert!(FileSize::parse("invalid").is_err());
        assert!(FileSize::parse("10tb").is_err());
        assert!(FileSize::parse("mb10").is_err());
        assert!(FileSize::parse("").is_err());
    }

    #[test]
    fn limit_parsing_distinguishes_count_and_size() {
        assert_eq!(
            PartitionLimit::parse("1000").unwrap(),
            PartitionLimit::MessageCount(1000)
        );
        assert_eq!(
            PartitionLimit::parse("10mb").unwrap(),
            PartitionLimit::ByteSize(FileSize::from_bytes(10_000_000))
        );
        assert_eq!(PartitionLimit::parse("").unwrap(), PartitionLimit::Null);
    }

    #[test]
    fn reached_semantics() {
        assert!(!PartitionLimit::Null.is_reached(u64::MAX, u64::MAX));
        assert!(PartitionLimit::MessageCount(3).is_reached(3, 0));
        assert!(!PartitionLimit::MessageCount(3).is_reached(2, 0));
        let size = PartitionLimit::ByteSize(FileSize::from_bytes(100));
        assert!(size.is_reached(0, 100));
        assert!(!size.is_reached(0, 99));
    }
}
