use crate::config::level_percent;
use crate::{Error, Result};
use std::str::FromStr;

/// Which coverage levels (integer percent) a caller asks for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelSelector {
    #[default]
    All,
    One(i32),
    Many(Vec<i32>),
}

impl LevelSelector {
    /// Concrete levels given the configured fractions.
    ///
    /// `All` yields the configured levels as unique percents, highest first.
    /// Explicit selections are returned as given.
    pub fn resolve(&self, configured: &[f64]) -> Vec<i32> {
        match self {
            LevelSelector::All => {
                let mut levels: Vec<i32> = configured.iter().map(|&f| level_percent(f)).collect();
                levels.sort_unstable_by(|a, b| b.cmp(a));
                levels.dedup();
                levels
            }
            LevelSelector::One(level) => vec![*level],
            LevelSelector::Many(levels) => levels.clone(),
        }
    }

    pub fn contains(&self, level: i32) -> bool {
        match self {
            LevelSelector::All => true,
            LevelSelector::One(l) => *l == level,
            LevelSelector::Many(ls) => ls.contains(&level),
        }
    }
}

impl From<i32> for LevelSelector {
    fn from(level: i32) -> Self {
        LevelSelector::One(level)
    }
}

impl From<Vec<i32>> for LevelSelector {
    fn from(levels: Vec<i32>) -> Self {
        LevelSelector::Many(levels)
    }
}

impl FromStr for LevelSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(LevelSelector::All);
        }
        let parts: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(Error::config("empty level selector"));
        }
        let levels = parts
            .iter()
            .map(|p| {
                p.parse::<i32>()
                    .map_err(|_| Error::config(format!("unrecognized level selector '{s}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(match levels.as_slice() {
            [one] if parts.len() == 1 => LevelSelector::One(*one),
            _ => LevelSelector::Many(levels),
        })
    }
}
