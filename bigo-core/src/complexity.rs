//! Complexity classes
//!
//! Global invariants enforced:
//! - The variant order is the only definition of "worse than"
//! - Labels round-trip through `as_str` / `FromStr`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Worst-case time complexity class, ordered from best to worst.
///
/// The derived `Ord` follows declaration order:
/// `O(1) < O(log n) < O(n) < O(n log n) < O(n²) < O(2^n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComplexityClass {
    Constant,
    Logarithmic,
    Linear,
    Linearithmic,
    Quadratic,
    Exponential,
}

impl ComplexityClass {
    /// Every class, best first.
    pub const ALL: [ComplexityClass; 6] = [
        ComplexityClass::Constant,
        ComplexityClass::Logarithmic,
        ComplexityClass::Linear,
        ComplexityClass::Linearithmic,
        ComplexityClass::Quadratic,
        ComplexityClass::Exponential,
    ];

    /// Big-O label as shown on snippet badges
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Logarithmic => "O(log n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Linearithmic => "O(n log n)",
            ComplexityClass::Quadratic => "O(n²)",
            ComplexityClass::Exponential => "O(2^n)",
        }
    }

    /// Position in the total order, 0 for `O(1)`.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "constant",
            ComplexityClass::Logarithmic => "logarithmic",
            ComplexityClass::Linear => "linear",
            ComplexityClass::Linearithmic => "linearithmic",
            ComplexityClass::Quadratic => "quadratic",
            ComplexityClass::Exponential => "exponential",
        }
    }

    /// Canonical one-line description of how running time grows.
    pub fn sentence(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => {
                "Constant time - executes in fixed time regardless of input size"
            }
            ComplexityClass::Logarithmic => {
                "Logarithmic time - time increases logarithmically with input size"
            }
            ComplexityClass::Linear => "Linear time - time increases linearly with input size",
            ComplexityClass::Linearithmic => {
                "Linearithmic time - time increases as n times log n"
            }
            ComplexityClass::Quadratic => {
                "Quadratic time - time increases quadratically with input size"
            }
            ComplexityClass::Exponential => {
                "Exponential time - time doubles with each additional input"
            }
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known complexity class
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown complexity class: {0:?} (expected one of O(1), O(log n), O(n), O(n log n), O(n²), O(2^n))")]
pub struct ParseComplexityError(pub String);

impl FromStr for ComplexityClass {
    type Err = ParseComplexityError;

    /// Accepts the canonical labels plus common spellings.
    ///
    /// Matching ignores case and whitespace, so `"o(N LOG N)"` and
    /// `"O(nlogn)"` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        let class = match key.as_str() {
            "o(1)" | "constant" => ComplexityClass::Constant,
            "o(logn)" | "logarithmic" | "log" => ComplexityClass::Logarithmic,
            "o(n)" | "linear" => ComplexityClass::Linear,
            "o(nlogn)" | "linearithmic" | "nlogn" => ComplexityClass::Linearithmic,
            "o(n²)" | "o(n^2)" | "o(n*n)" | "o(n2)" | "quadratic" => ComplexityClass::Quadratic,
            "o(2^n)" | "o(2ⁿ)" | "exponential" => ComplexityClass::Exponential,
            _ => return Err(ParseComplexityError(s.to_string())),
        };
        Ok(class)
    }
}

impl Serialize for ComplexityClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComplexityClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_severity() {
        for pair in ComplexityClass::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should rank below {}", pair[0], pair[1]);
        }
        assert_eq!(ComplexityClass::Constant.rank(), 0);
        assert_eq!(ComplexityClass::Exponential.rank(), 5);
    }

    #[test]
    fn max_picks_worst() {
        let worst = [
            ComplexityClass::Linear,
            ComplexityClass::Exponential,
            ComplexityClass::Logarithmic,
        ]
        .into_iter()
        .max();
        assert_eq!(worst, Some(ComplexityClass::Exponential));
    }

    #[test]
    fn labels_parse_back() {
        for class in ComplexityClass::ALL {
            assert_eq!(class.as_str().parse::<ComplexityClass>(), Ok(class));
            assert_eq!(class.name().parse::<ComplexityClass>(), Ok(class));
        }
    }

    #[test]
    fn aliases_parse() {
        assert_eq!("O(n^2)".parse(), Ok(ComplexityClass::Quadratic));
        assert_eq!("o(N LOG N)".parse(), Ok(ComplexityClass::Linearithmic));
        assert_eq!(" Quadratic ".parse(), Ok(ComplexityClass::Quadratic));
        assert!("O(n^3)".parse::<ComplexityClass>().is_err());
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&ComplexityClass::Quadratic).unwrap();
        assert_eq!(json, "\"O(n²)\"");
        let back: ComplexityClass = serde_json::from_str("\"O(log n)\"").unwrap();
        assert_eq!(back, ComplexityClass::Logarithmic);
    }
}
