//! Score keeping: clamped running score, session high score, and per-pass feedback tiers.

/// Scores clamp here instead of wrapping.
pub const MAX_SCORE: u32 = 999_999;

pub const NEW_HIGH_SCORE_MESSAGE: &str = "New high score!";

const TIER1_MIN: u32 = 100;
const TIER2_MIN: u32 = 150;
const TIER3_MIN: u32 = 250;

/// Outcome of a score update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub score: u32,
    /// The score strictly exceeded the stored high score, which now equals it.
    pub high_score_beaten: bool,
    /// First time this session the high score was beaten; announce it once.
    pub announce_record: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    score: u32,
    high_score: u32,
    record_announced: bool,
}

impl Scoreboard {
    pub fn new(high_score: u32) -> Self {
        Self {
            score: 0,
            high_score: high_score.min(MAX_SCORE),
            record_announced: false,
        }
    }

    pub const fn score(&self) -> u32 {
        self.score
    }

    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// True once this session has set a new record.
    pub const fn record_set(&self) -> bool {
        self.record_announced
    }

    /// Start a new session: score back to zero, record announcement re-armed.
    pub fn reset_session(&mut self) {
        self.score = 0;
        self.record_announced = false;
    }

    pub fn add(&mut self, points: u32) -> ScoreChange {
        self.set(self.score.saturating_add(points))
    }

    pub fn set(&mut self, value: u32) -> ScoreChange {
        self.score = value.min(MAX_SCORE);
        let high_score_beaten = self.score > self.high_score;
        let mut announce_record = false;
        if high_score_beaten {
            self.high_score = self.score;
            announce_record = !self.record_announced;
            self.record_announced = true;
        }
        ScoreChange {
            score: self.score,
            high_score_beaten,
            announce_record,
        }
    }
}

/// Feedback band selected by the points earned in one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTier {
    Good,
    Great,
    Incredible,
}

impl FeedbackTier {
    /// `[100, 150)` → Good, `[150, 250)` → Great, `250+` → Incredible, below 100 → none.
    pub const fn for_points(points: u32) -> Option<Self> {
        if points >= TIER3_MIN {
            Some(Self::Incredible)
        } else if points >= TIER2_MIN {
            Some(Self::Great)
        } else if points >= TIER1_MIN {
            Some(Self::Good)
        } else {
            None
        }
    }

    pub const fn messages(self) -> &'static [&'static str] {
        match self {
            Self::Good => &["Nice!", "Good!", "Well done!"],
            Self::Great => &["Great!", "Awesome!", "Fantastic!"],
            Self::Incredible => &["Incredible!", "Unbelievable!"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accumulates() {
        let mut board = Scoreboard::new(1_000);
        board.add(50);
        let change = board.add(100);
        assert_eq!(change.score, 150);
        assert!(!change.high_score_beaten);
        assert_eq!(board.high_score(), 1_000);
    }

    #[test]
    fn test_clamps_at_max() {
        let mut board = Scoreboard::new(0);
        board.set(999_950);
        let change = board.add(150);
        assert_eq!(change.score, MAX_SCORE);
        assert_eq!(board.add(u32::MAX).score, MAX_SCORE);
        assert_eq!(board.high_score(), MAX_SCORE);
    }

    #[test]
    fn test_record_announced_once_per_session() {
        let mut board = Scoreboard::new(100);
        let first = board.add(100);
        assert!(!first.high_score_beaten, "equal is not a record");
        let second = board.add(50);
        assert!(second.high_score_beaten);
        assert!(second.announce_record);
        let third = board.add(50);
        assert!(third.high_score_beaten);
        assert!(!third.announce_record);
        assert_eq!(board.high_score(), 200);
        assert!(board.record_set());

        board.reset_session();
        assert_eq!(board.score(), 0);
        board.add(150);
        assert!(!board.record_set());
        assert!(board.add(100).announce_record);
    }

    #[test]
    fn test_feedback_tier_boundaries() {
        assert_eq!(FeedbackTier::for_points(0), None);
        assert_eq!(FeedbackTier::for_points(50), None);
        assert_eq!(FeedbackTier::for_points(99), None);
        assert_eq!(FeedbackTier::for_points(100), Some(FeedbackTier::Good));
        assert_eq!(FeedbackTier::for_points(149), Some(FeedbackTier::Good));
        assert_eq!(FeedbackTier::for_points(150), Some(FeedbackTier::Great));
        assert_eq!(FeedbackTier::for_points(249), Some(FeedbackTier::Great));
        assert_eq!(FeedbackTier::for_points(250), Some(FeedbackTier::Incredible));
        assert_eq!(FeedbackTier::for_points(10_000), Some(FeedbackTier::Incredible));
    }

    #[test]
    fn test_every_tier_has_messages() {
        for tier in [FeedbackTier::Good, FeedbackTier::Great, FeedbackTier::Incredible] {
            assert!(!tier.messages().is_empty());
        }
    }
}
