use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Search limits: iterative deepening stops at `max_depth` or once
/// `time_budget` has elapsed, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyProfile {
    max_depth: u32,
    time_budget: Duration,
}

impl DifficultyProfile {
    pub fn new(max_depth: u32, time_budget: Duration) -> Result<Self, ConfigError> {
        if max_depth == 0 {
            return Err(ConfigError::InvalidDepth(max_depth));
        }
        if time_budget.is_zero() {
            return Err(ConfigError::InvalidTimeBudget(time_budget));
        }
        Ok(Self {
            max_depth,
            time_budget,
        })
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    pub fn with_max_depth(self, max_depth: u32) -> Result<Self, ConfigError> {
        Self::new(max_depth, self.time_budget)
    }

    pub fn with_time_budget(self, time_budget: Duration) -> Result<Self, ConfigError> {
        Self::new(self.max_depth, time_budget)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn profile(self) -> DifficultyProfile {
        let (max_depth, seconds) = match self {
            Difficulty::Easy => (2, 2),
            Difficulty::Medium => (3, 3),
            Difficulty::Hard => (4, 5),
            Difficulty::Expert => (5, 8),
        };
        DifficultyProfile {
            max_depth,
            time_budget: Duration::from_secs(seconds),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDifficulty(s.to_string()))
    }
}

impl From<Difficulty> for DifficultyProfile {
    fn from(level: Difficulty) -> Self {
        level.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_table() {
        let expected = [(2, 2), (3, 3), (4, 5), (5, 8)];
        for (level, (depth, secs)) in Difficulty::ALL.into_iter().zip(expected) {
            let profile = level.profile();
            assert_eq!(profile.max_depth(), depth);
            assert_eq!(profile.time_budget(), Duration::from_secs(secs));
        }
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("EXPERT".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(
            "grandmaster".parse::<Difficulty>(),
            Err(ConfigError::UnknownDifficulty("grandmaster".to_string()))
        );
        for level in Difficulty::ALL {
            assert_eq!(level.to_string().parse::<Difficulty>(), Ok(level));
        }
    }

    #[test]
    fn test_profile_validation() {
        assert_eq!(
            DifficultyProfile::new(0, Duration::from_secs(1)),
            Err(ConfigError::InvalidDepth(0))
        );
        assert_eq!(
            DifficultyProfile::new(3, Duration::ZERO),
            Err(ConfigError::InvalidTimeBudget(Duration::ZERO))
        );

        let profile = Difficulty::Medium.profile().with_max_depth(7).unwrap();
        assert_eq!(profile.max_depth(), 7);
        assert_eq!(profile.time_budget(), Duration::from_secs(3));
        assert!(profile.with_time_budget(Duration::ZERO).is_err());
    }
}
