use serde::Serialize;

const DEFAULT_LEVELS: u64 = 20;

/// Default table: level `n + 1` unlocks at `50·n·(n+1)` XP (0, 100, 300, 600, …).
pub fn default_thresholds() -> Vec<u64> {
    (0..DEFAULT_LEVELS).map(|n| 50 * n * (n + 1)).collect()
}

/// Cumulative XP thresholds; strictly increasing and starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelTable {
    thresholds: Vec<u64>,
}

impl LevelTable {
    pub fn new(thresholds: Vec<u64>) -> Result<Self, String> {
        match thresholds.first() {
            None => return Err("table must not be empty".into()),
            Some(&first) if first != 0 => {
                return Err(format!("first threshold must be 0, got {first}"));
            }
            Some(_) => {}
        }
        if let Some(pair) = thresholds.windows(2).find(|w| w[1] <= w[0]) {
            return Err(format!(
                "thresholds must be strictly increasing ({} then {})",
                pair[0], pair[1]
            ));
        }
        Ok(Self { thresholds })
    }

    pub fn max_level(&self) -> u32 {
        u32::try_from(self.thresholds.len()).unwrap_or(u32::MAX)
    }

    /// Number of thresholds reached by `total_xp`; always at least 1.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        let reached = self.thresholds.partition_point(|&t| t <= total_xp);
        u32::try_from(reached).unwrap_or(u32::MAX).max(1)
    }

    /// XP still needed for the next level, `None` at the top of the table.
    pub fn xp_to_next(&self, total_xp: u64) -> Option<u64> {
        self.thresholds
            .iter()
            .find(|&&t| t > total_xp)
            .map(|t| t - total_xp)
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
        }
    }
}
