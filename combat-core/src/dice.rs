//! Dice notation and rolling.
//!
//! Supports `XdY+Z`, several dice groups (`2d6+1d4+3`), keep highest/lowest
//! (`4d6kh3`), and advantage/disadvantage on single d20 rolls. Every roll
//! takes the caller's RNG so a seeded engine replays identically.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Most dice a single group may roll (`100d6` is the largest accepted).
pub const MAX_DICE_PER_GROUP: u32 = 100;

/// Error type for dice parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many dice: {count} (at most {max} per group)")]
    TooManyDice { count: u32, max: u32 },
    #[error("Modifier out of range in {0}")]
    ModifierOverflow(String),
    #[error("Cannot keep {keep} dice when only rolling {count} (in {notation})")]
    InvalidKeepCount {
        keep: u32,
        count: u32,
        notation: String,
    },
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Combine two sources (advantage + disadvantage = normal).
    pub fn combine(self, other: Advantage) -> Advantage {
        match (self, other) {
            (Advantage::Normal, x) | (x, Advantage::Normal) => x,
            (a, b) if a == b => a,
            _ => Advantage::Normal,
        }
    }
}

/// Die sizes accepted in notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        Some(match sides {
            4 => DieType::D4,
            6 => DieType::D6,
            8 => DieType::D8,
            10 => DieType::D10,
            12 => DieType::D12,
            20 => DieType::D20,
            100 => DieType::D100,
            _ => return None,
        })
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// One `NdS` group, optionally keeping only the highest or lowest dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGroup {
    pub count: u32,
    pub die: DieType,
    pub keep: Option<Keep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keep {
    Highest(u32),
    Lowest(u32),
}

/// A parsed dice expression such as `2d6+3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub groups: Vec<DiceGroup>,
    pub modifier: i32,
}

impl DiceExpression {
    /// A single d20 plus a flat modifier.
    pub fn d20(modifier: i32) -> Self {
        Self {
            groups: vec![DiceGroup {
                count: 1,
                die: DieType::D20,
                keep: None,
            }],
            modifier,
        }
    }

    /// A flat value with no dice.
    pub fn flat(value: i32) -> Self {
        Self {
            groups: Vec::new(),
            modifier: value,
        }
    }

    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation: String = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut expr = DiceExpression {
            groups: Vec::new(),
            modifier: 0,
        };
        let mut term = String::new();
        let mut sign = 1;

        for ch in notation.chars() {
            if ch == '+' || ch == '-' {
                if !term.is_empty() {
                    expr.push_term(&term, sign)?;
                    term.clear();
                }
                sign = if ch == '+' { 1 } else { -1 };
            } else {
                term.push(ch);
            }
        }
        if !term.is_empty() {
            expr.push_term(&term, sign)?;
        }

        if expr.groups.is_empty() && expr.modifier == 0 {
            return Err(DiceError::NoDice);
        }
        Ok(expr)
    }

    fn push_term(&mut self, term: &str, sign: i32) -> Result<(), DiceError> {
        let invalid = || DiceError::InvalidNotation(term.to_string());

        let Some((count, rest)) = term.split_once('d') else {
            let value: i32 = term.parse().map_err(|_| invalid())?;
            self.modifier = self
                .modifier
                .checked_add(sign * value)
                .ok_or_else(|| DiceError::ModifierOverflow(term.to_string()))?;
            return Ok(());
        };

        let count: u32 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        if count > MAX_DICE_PER_GROUP {
            return Err(DiceError::TooManyDice {
                count,
                max: MAX_DICE_PER_GROUP,
            });
        }

        let (sides, keep) = if let Some((sides, n)) = rest.split_once("kh") {
            (sides, Some(Keep::Highest(n.parse().map_err(|_| invalid())?)))
        } else if let Some((sides, n)) = rest.split_once("kl") {
            (sides, Some(Keep::Lowest(n.parse().map_err(|_| invalid())?)))
        } else {
            (rest, None)
        };

        let sides: u32 = sides.parse().map_err(|_| invalid())?;
        let die = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        if let Some(Keep::Highest(n) | Keep::Lowest(n)) = keep {
            if n > count {
                return Err(DiceError::InvalidKeepCount {
                    keep: n,
                    count,
                    notation: term.to_string(),
                });
            }
        }

        self.groups.push(DiceGroup { count, die, keep });
        Ok(())
    }

    /// The same expression with every dice count doubled (critical hits).
    ///
    /// Fails if a doubled group would exceed twice `MAX_DICE_PER_GROUP`,
    /// which only happens for expressions built by hand or deserialized.
    pub fn doubled(&self) -> Result<Self, DiceError> {
        let groups = self
            .groups
            .iter()
            .map(|g| {
                let count = g
                    .count
                    .checked_mul(2)
                    .filter(|&c| c <= MAX_DICE_PER_GROUP * 2)
                    .ok_or(DiceError::TooManyDice {
                        count: g.count,
                        max: MAX_DICE_PER_GROUP,
                    })?;
                Ok(DiceGroup {
                    count,
                    die: g.die,
                    keep: g.keep,
                })
            })
            .collect::<Result<Vec<_>, DiceError>>()?;
        Ok(Self {
            groups,
            modifier: self.modifier,
        })
    }

    pub fn roll<R: Rng>(&self, rng: &mut R) -> RollResult {
        let groups: Vec<GroupResult> = self
            .groups
            .iter()
            .map(|group| {
                let rolls: Vec<u32> = (0..group.count)
                    .map(|_| rng.gen_range(1..=group.die.sides()))
                    .collect();
                let mut kept = rolls.clone();
                match group.keep {
                    Some(Keep::Highest(n)) => {
                        kept.sort_unstable_by(|a, b| b.cmp(a));
                        kept.truncate(n as usize);
                    }
                    Some(Keep::Lowest(n)) => {
                        kept.sort_unstable();
                        kept.truncate(n as usize);
                    }
                    None => {}
                }
                GroupResult {
                    die: group.die,
                    rolls,
                    kept,
                }
            })
            .collect();

        let natural = if self.is_single_d20() {
            groups.first().and_then(|g| g.kept.first().copied())
        } else {
            None
        };
        let total = groups.iter().map(GroupResult::subtotal).sum::<i32>() + self.modifier;

        RollResult {
            expression: self.clone(),
            groups,
            total,
            natural,
        }
    }

    /// Roll with advantage/disadvantage. Only single d20 rolls are affected.
    pub fn roll_with_advantage<R: Rng>(
        &self,
        advantage: Advantage,
        rng: &mut R,
    ) -> RollResult {
        if advantage == Advantage::Normal || !self.is_single_d20() {
            return self.roll(rng);
        }

        let first = rng.gen_range(1..=20u32);
        let second = rng.gen_range(1..=20u32);
        let chosen = match advantage {
            Advantage::Advantage => first.max(second),
            _ => first.min(second),
        };

        RollResult {
            expression: self.clone(),
            groups: vec![GroupResult {
                die: DieType::D20,
                rolls: vec![first, second],
                kept: vec![chosen],
            }],
            total: chosen as i32 + self.modifier,
            natural: Some(chosen),
        }
    }

    fn is_single_d20(&self) -> bool {
        matches!(
            self.groups.as_slice(),
            [DiceGroup {
                count: 1,
                die: DieType::D20,
                keep: None
            }]
        )
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for group in &self.groups {
            if !first {
                write!(f, "+")?;
            }
            first = false;
            write!(f, "{}{}", group.count, group.die)?;
            match group.keep {
                Some(Keep::Highest(n)) => write!(f, "kh{n}")?,
                Some(Keep::Lowest(n)) => write!(f, "kl{n}")?,
                None => {}
            }
        }
        match (first, self.modifier) {
            (true, m) => write!(f, "{m}"),
            (false, 0) => Ok(()),
            (false, m) if m > 0 => write!(f, "+{m}"),
            (false, m) => write!(f, "{m}"),
        }
    }
}

/// Dice rolled for one group; `kept` is what counts toward the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupResult {
    pub die: DieType,
    pub rolls: Vec<u32>,
    pub kept: Vec<u32>,
}

impl GroupResult {
    pub fn subtotal(&self) -> i32 {
        self.kept.iter().sum::<u32>() as i32
    }
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub groups: Vec<GroupResult>,
    pub total: i32,
    /// The kept d20 face, for single-d20 rolls only.
    pub natural: Option<u32>,
}

impl RollResult {
    pub fn meets_dc(&self, dc: i32) -> bool {
        self.total >= dc
    }

    pub fn is_critical(&self) -> bool {
        self.natural == Some(20)
    }

    pub fn is_fumble(&self) -> bool {
        self.natural == Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("1d20").unwrap();
        assert_eq!(expr, DiceExpression::d20(0));
    }

    #[test]
    fn test_parse_with_modifier() {
        assert_eq!(DiceExpression::parse("1d20+5").unwrap().modifier, 5);
        assert_eq!(DiceExpression::parse("2d6 - 2").unwrap().modifier, -2);
    }

    #[test]
    fn test_parse_multiple_groups() {
        let expr = DiceExpression::parse("2d6+1d4+3").unwrap();
        assert_eq!(expr.groups.len(), 2);
        assert_eq!(expr.modifier, 3);
        assert_eq!(expr.to_string(), "2d6+1d4+3");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(DiceExpression::parse(""), Err(DiceError::NoDice));
        assert_eq!(
            DiceExpression::parse("1d7"),
            Err(DiceError::InvalidDieSize(7))
        );
        assert!(matches!(
            DiceExpression::parse("4d6kh5"),
            Err(DiceError::InvalidKeepCount {
                keep: 5,
                count: 4,
                ..
            })
        ));
        assert!(DiceExpression::parse("xd6").is_err());
    }

    #[test]
    fn test_keep_highest() {
        let mut rng = StdRng::seed_from_u64(7);
        let expr = DiceExpression::parse("4d6kh3").unwrap();
        for _ in 0..50 {
            let result = expr.roll(&mut rng);
            assert_eq!(result.groups[0].rolls.len(), 4);
            assert_eq!(result.groups[0].kept.len(), 3);
            assert!((3..=18).contains(&result.total));
        }
    }

    #[test]
    fn test_roll_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let result = DiceExpression::d20(5).roll(&mut rng);
            assert!((6..=25).contains(&result.total));
            assert_eq!(result.natural.map(|n| n as i32 + 5), Some(result.total));
        }
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let expr = DiceExpression::parse("3d8+2").unwrap();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(expr.roll(&mut a), expr.roll(&mut b));
        }
    }

    #[test]
    fn test_advantage_keeps_higher() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let result = DiceExpression::d20(0).roll_with_advantage(Advantage::Advantage, &mut rng);
            let rolls = &result.groups[0].rolls;
            assert_eq!(rolls.len(), 2);
            assert_eq!(result.total as u32, rolls[0].max(rolls[1]));
        }
    }

    #[test]
    fn test_doubled_for_critical() {
        let expr = DiceExpression::parse("2d6+3").unwrap().doubled().unwrap();
        assert_eq!(expr.groups[0].count, 4);
        assert_eq!(expr.modifier, 3);
    }

    #[test]
    fn test_dice_count_is_bounded() {
        assert_eq!(
            DiceExpression::parse("3000000000d6"),
            Err(DiceError::TooManyDice {
                count: 3_000_000_000,
                max: MAX_DICE_PER_GROUP
            })
        );
        assert!(DiceExpression::parse("100d6").is_ok());
        assert!(DiceExpression::parse("100d6").unwrap().doubled().is_ok());

        let built = DiceExpression {
            groups: vec![DiceGroup {
                count: u32::MAX,
                die: DieType::D6,
                keep: None,
            }],
            modifier: 0,
        };
        assert!(matches!(built.doubled(), Err(DiceError::TooManyDice { .. })));
    }

    #[test]
    fn test_modifier_overflow_is_rejected() {
        assert_eq!(
            DiceExpression::parse("1d6+2147483647+1"),
            Err(DiceError::ModifierOverflow("1".to_string()))
        );
    }

    #[test]
    fn test_advantage_combine() {
        assert_eq!(
            Advantage::Normal.combine(Advantage::Advantage),
            Advantage::Advantage
        );
        assert_eq!(
            Advantage::Advantage.combine(Advantage::Disadvantage),
            Advantage::Normal
        );
        assert_eq!(
            Advantage::Disadvantage.combine(Advantage::Disadvantage),
            Advantage::Disadvantage
        );
    }
}
