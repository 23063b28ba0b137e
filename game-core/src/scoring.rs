use game_types::MAX_ATTEMPTS;

/// Points for a correct guess.
///
/// `base - attempt_penalty * (attempts - 1) + time_bonus * max(0, bonus_window - seconds)`,
/// never below `floor`. This is a house rule, not something inherent to the
/// game; a flat award per solve would be equally valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub base: u32,
    pub attempt_penalty: u32,
    pub bonus_window_secs: u32,
    pub bonus_per_sec: u32,
    pub floor: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base: 1000,
            attempt_penalty: 100,
            bonus_window_secs: 120,
            bonus_per_sec: 5,
            floor: 100,
        }
    }
}

impl ScoringPolicy {
    pub fn score(&self, attempts_used: u32, time_used_secs: u64) -> u32 {
        let attempts_used = attempts_used.clamp(1, MAX_ATTEMPTS);
        let penalty = i64::from(self.attempt_penalty) * i64::from(attempts_used - 1);
        let seconds_left = i64::from(self.bonus_window_secs)
            .saturating_sub(i64::try_from(time_used_secs).unwrap_or(i64::MAX))
            .max(0);
        let bonus = seconds_left * i64::from(self.bonus_per_sec);

        let raw = i64::from(self.base) - penalty + bonus;
        let score = raw.max(i64::from(self.floor));
        u32::try_from(score).unwrap_or(u32::MAX)
    }
}
