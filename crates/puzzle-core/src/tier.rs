//! Rating tier and puzzle difficulty bands.

/// A named band of user ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub name: &'static str,
    pub min: i32,
    /// Inclusive upper bound; `i32::MAX` for the open-ended top band.
    pub max: i32,
}

const TIERS: &[Tier] = &[
    Tier { name: "Beginner", min: 0, max: 1199 },
    Tier { name: "Novice", min: 1200, max: 1399 },
    Tier { name: "Intermediate", min: 1400, max: 1599 },
    Tier { name: "Advanced", min: 1600, max: 1799 },
    Tier { name: "Expert", min: 1800, max: 1999 },
    Tier { name: "Master", min: 2000, max: 2199 },
    Tier { name: "International Master", min: 2200, max: 2399 },
    Tier { name: "Grandmaster", min: 2400, max: i32::MAX },
];

/// The tier a user rating falls into. Ratings below zero clamp into the
/// bottom band.
pub fn user_tier(rating: i32) -> &'static Tier {
    TIERS
        .iter()
        .find(|t| rating >= t.min && rating <= t.max)
        .unwrap_or(&TIERS[0])
}

/// Difficulty label for a puzzle rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Expert,
    Master,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
            Difficulty::Master => "Master",
        }
    }
}

pub fn puzzle_difficulty(rating: i32) -> Difficulty {
    match rating {
        ..=799 => Difficulty::Beginner,
        800..=1199 => Difficulty::Easy,
        1200..=1599 => Difficulty::Medium,
        1600..=1999 => Difficulty::Hard,
        2000..=2399 => Difficulty::Expert,
        _ => Difficulty::Master,
    }
}
