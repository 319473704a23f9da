// src/progress/level.rs

use std::fmt;

use serde::Serialize;

/// Default XP thresholds; position `i` unlocks level `i + 1`.
pub const DEFAULT_THRESHOLDS: [i64; 5] = [0, 100, 250, 500, 1000];

/// One step of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelTier {
    pub level: i32,
    /// Minimum cumulative XP required to reach `level`.
    pub min_xp: i64,
}

/// Reasons a level table is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelTableError {
    Empty,
    FirstTierNotZero,
    NotAscending { position: usize },
}

impl fmt::Display for LevelTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelTableError::Empty => write!(f, "level table has no tiers"),
            LevelTableError::FirstTierNotZero => {
                write!(f, "level table must start with level 1 at 0 XP")
            }
            LevelTableError::NotAscending { position } => {
                write!(f, "level table is not strictly ascending at tier {}", position)
            }
        }
    }
}

impl std::error::Error for LevelTableError {}

/// Ordered step function from cumulative XP to level.
///
/// Always starts with level 1 at 0 XP. The last tier is the ceiling: any XP
/// beyond its threshold stays at that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    tiers: Vec<LevelTier>,
}

impl LevelTable {
    pub fn new(tiers: Vec<LevelTier>) -> Result<Self, LevelTableError> {
        let first = tiers.first().ok_or(LevelTableError::Empty)?;
        if first.level != 1 || first.min_xp != 0 {
            return Err(LevelTableError::FirstTierNotZero);
        }

        for (position, pair) in tiers.windows(2).enumerate() {
            if pair[1].level <= pair[0].level || pair[1].min_xp <= pair[0].min_xp {
                return Err(LevelTableError::NotAscending {
                    position: position + 1,
                });
            }
        }

        Ok(Self { tiers })
    }

    /// Builds a table where the n-th threshold unlocks level n (1-based).
    pub fn from_thresholds(thresholds: &[i64]) -> Result<Self, LevelTableError> {
        let tiers = thresholds
            .iter()
            .enumerate()
            .map(|(i, &min_xp)| LevelTier {
                level: i as i32 + 1,
                min_xp,
            })
            .collect();
        Self::new(tiers)
    }

    /// Parses a comma separated threshold list such as `0,100,250`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let thresholds = raw
            .split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid level threshold in '{}': {}", raw, e))?;

        Self::from_thresholds(&thresholds).map_err(|e| e.to_string())
    }

    /// Level reached with `xp` cumulative experience.
    pub fn level_for(&self, xp: i64) -> i32 {
        self.tiers
            .iter()
            .take_while(|tier| tier.min_xp <= xp)
            .last()
            .map(|tier| tier.level)
            .unwrap_or(1)
    }

    /// The tier following the one `xp` currently sits in, if any.
    pub fn next_tier(&self, xp: i64) -> Option<LevelTier> {
        self.tiers.iter().find(|tier| tier.min_xp > xp).copied()
    }

    pub fn max_level(&self) -> i32 {
        self.tiers.last().map(|tier| tier.level).unwrap_or(1)
    }

    pub fn tiers(&self) -> &[LevelTier] {
        &self.tiers
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        let tiers = DEFAULT_THRESHOLDS
            .iter()
            .enumerate()
            .map(|(i, &min_xp)| LevelTier {
                level: i as i32 + 1,
                min_xp,
            })
            .collect();
        Self { tiers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_default_table() {
        let table = LevelTable::default();
        assert_eq!(table.level_for(0), 1);
        assert_eq!(table.level_for(99), 1);
        assert_eq!(table.level_for(100), 2);
        assert_eq!(table.level_for(249), 2);
        assert_eq!(table.level_for(250), 3);
        assert_eq!(table.level_for(500), 4);
        assert_eq!(table.level_for(1000), 5);
        assert_eq!(table.level_for(10000), 5);
    }

    #[test]
    fn test_level_for_is_monotonic() {
        let table = LevelTable::default();
        let mut previous = table.level_for(0);
        for xp in 0..=1500 {
            let level = table.level_for(xp);
            assert!(level >= previous, "level dropped at {} xp", xp);
            previous = level;
        }
    }

    #[test]
    fn test_negative_xp_is_level_one() {
        assert_eq!(LevelTable::default().level_for(-5), 1);
    }

    #[test]
    fn test_extended_table_raises_ceiling() {
        let table = LevelTable::parse("0,100,250,500,1000,2000").unwrap();
        assert_eq!(table.level_for(10000), 6);
        assert_eq!(table.max_level(), 6);
    }

    #[test]
    fn test_next_tier() {
        let table = LevelTable::default();
        assert_eq!(
            table.next_tier(90),
            Some(LevelTier {
                level: 2,
                min_xp: 100
            })
        );
        assert_eq!(table.next_tier(1000), None);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(LevelTable::new(vec![]), Err(LevelTableError::Empty));
        assert_eq!(
            LevelTable::from_thresholds(&[10, 100]),
            Err(LevelTableError::FirstTierNotZero)
        );
        assert_eq!(
            LevelTable::from_thresholds(&[0, 100, 100]),
            Err(LevelTableError::NotAscending { position: 2 })
        );
        assert!(LevelTable::parse("0,abc").is_err());
    }
}
