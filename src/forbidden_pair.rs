use std::fmt;
use std::str::FromStr;

use crate::error::RepairError;

/// An unordered pair of treatments that must never share a block.
///
/// Equality ignores element order: `(3, 5)` and `(5, 3)` name the same
/// constraint.
#[derive(Debug, Clone, Copy)]
pub struct ForbiddenPair(pub usize, pub usize);

impl ForbiddenPair {
    pub fn new(a: usize, b: usize) -> Self {
        Self(a, b)
    }

    /// True when `{a, b}` is exactly this pair, in either order.
    pub fn matches(&self, a: usize, b: usize) -> bool {
        (self.0 == a && self.1 == b) || (self.0 == b && self.1 == a)
    }

    pub fn contains(&self, treatment: usize) -> bool {
        self.0 == treatment || self.1 == treatment
    }

    /// Checks both members against the treatment domain `1..=treatments`.
    /// Pair sets are immutable input, so this runs once, before repair
    /// begins.
    pub fn check_in_range(&self, treatments: usize) -> Result<(), RepairError> {
        if [self.0, self.1]
            .iter()
            .any(|&t| t < 1 || t > treatments)
        {
            return Err(RepairError::PairOutOfRange {
                a: self.0,
                b: self.1,
                treatments,
            });
        }
        Ok(())
    }
}

impl PartialEq for ForbiddenPair {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.0, other.1)
    }
}

impl Eq for ForbiddenPair {}

impl fmt::Display for ForbiddenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Parses the CLI form `"i,j"`.
impl FromStr for ForbiddenPair {
    type Err = RepairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| RepairError::ParsePair(format!("expected \"i,j\", got {s:?}")))?;
        let parse = |tok: &str| {
            tok.trim()
                .parse::<usize>()
                .map_err(|_| RepairError::ParsePair(format!("invalid treatment id {tok:?}")))
        };
        let (a, b) = (parse(a)?, parse(b)?);
        if a == b {
            return Err(RepairError::ParsePair(format!(
                "a pair needs two distinct treatments, got {s:?}"
            )));
        }
        Ok(Self(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_order() {
        assert_eq!(ForbiddenPair(3, 5), ForbiddenPair(5, 3));
        assert_ne!(ForbiddenPair(3, 5), ForbiddenPair(3, 4));
    }

    #[test]
    fn matches_either_order() {
        let pair = ForbiddenPair(1, 2);
        assert!(pair.matches(1, 2));
        assert!(pair.matches(2, 1));
        assert!(!pair.matches(1, 3));
    }

    #[test]
    fn range_check_rejects_out_of_domain_ids() {
        assert!(ForbiddenPair(1, 6).check_in_range(6).is_ok());
        assert!(matches!(
            ForbiddenPair(0, 5).check_in_range(6),
            Err(RepairError::PairOutOfRange {
                a: 0,
                b: 5,
                treatments: 6
            })
        ));
        assert!(ForbiddenPair(1, 99).check_in_range(6).is_err());
    }

    #[test]
    fn parses_cli_form() {
        let pair: ForbiddenPair = "4,7".parse().unwrap();
        assert_eq!(pair, ForbiddenPair(4, 7));
        assert!(" 4 , 7 ".parse::<ForbiddenPair>().is_ok());
        assert!("4".parse::<ForbiddenPair>().is_err());
        assert!("4,x".parse::<ForbiddenPair>().is_err());
        assert!("4,4".parse::<ForbiddenPair>().is_err());
    }
}
