//! Decoding of wire events
//!
//! An event arrives as one comma-separated line `<timestamp>,<x>,<y>`:
//! an epoch-second integer, a decimal string and a 64-bit integer. Anything
//! else is rejected here so the aggregator only ever sees typed values.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty event payload")]
    Empty,

    #[error("expected 3 comma-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid timestamp '{0}': expected an integer epoch second")]
    Timestamp(String),

    #[error("invalid x '{0}': expected a decimal number")]
    X(String),

    #[error("invalid y '{0}': expected a 64-bit integer")]
    Y(String),
}

/// One decoded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: i64,
    pub x: Decimal,
    pub y: i64,
}

impl FromStr for Event {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [timestamp, x, y] = fields[..] else {
            return Err(ParseError::FieldCount(fields.len()));
        };

        Ok(Event {
            timestamp: timestamp
                .parse()
                .map_err(|_| ParseError::Timestamp(timestamp.to_string()))?,
            x: Decimal::from_str(x).map_err(|_| ParseError::X(x.to_string()))?,
            y: y.parse().map_err(|_| ParseError::Y(y.to_string()))?,
        })
    }
}
