//! Glicko-2 rating updates for single puzzle-vs-user pairings.
//!
//! Each attempt is scored as one rating period containing a single game
//! against a synthetic opponent rated at the puzzle's difficulty: a win for
//! the user if solved, a loss otherwise. The implementation follows
//! Glickman's published update equations, including the iterative volatility
//! step (Illinois-method root finding).

use serde::{Deserialize, Serialize};

/// Starting rating for a fresh install.
pub const DEFAULT_RATING: f64 = 1500.0;
/// Starting rating deviation.
pub const DEFAULT_DEVIATION: f64 = 200.0;
/// Starting (and per-puzzle opponent) volatility.
pub const DEFAULT_VOLATILITY: f64 = 0.06;

/// System constant constraining volatility change over time.
const TAU: f64 = 0.5;
/// Conversion between the Glicko scale and the internal Glicko-2 scale.
const SCALE: f64 = 173.7178;
/// Convergence tolerance for the volatility iteration.
const CONVERGENCE: f64 = 1e-6;

/// A rating with its uncertainty and volatility, on the conventional
/// (1500-centered) Glicko scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64,
}

impl Rating {
    pub fn new(rating: f64, deviation: f64, volatility: f64) -> Self {
        Self {
            rating,
            deviation,
            volatility,
        }
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::new(DEFAULT_RATING, DEFAULT_DEVIATION, DEFAULT_VOLATILITY)
    }
}

/// The outcome of a single pairing, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    fn score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
        }
    }
}

/// Run one Glicko-2 rating period for `player` containing a single game
/// against `opponent`, and return the player's updated rating.
///
/// The update is monotonic in the rating gap: a win never lowers the rating
/// and a loss never raises it, and beating a stronger opponent moves the
/// rating more than beating a weaker one.
pub fn update(player: Rating, opponent: Rating, outcome: Outcome) -> Rating {
    // Step 2: convert to the Glicko-2 scale.
    let mu = (player.rating - DEFAULT_RATING) / SCALE;
    let phi = player.deviation / SCALE;
    let mu_j = (opponent.rating - DEFAULT_RATING) / SCALE;
    let phi_j = opponent.deviation / SCALE;
    let score = outcome.score();

    // Step 3: estimated variance of the rating from the game outcome.
    let g = g(phi_j);
    let e = expectation(mu, mu_j, g);
    let v = 1.0 / (g * g * e * (1.0 - e));

    // Step 4: estimated improvement.
    let delta = v * g * (score - e);

    // Step 5: new volatility.
    let sigma_prime = new_volatility(player.volatility, delta, phi, v);

    // Steps 6-7: new deviation and rating.
    let phi_star = (phi * phi + sigma_prime * sigma_prime).sqrt();
    let phi_prime = 1.0 / (1.0 / (phi_star * phi_star) + 1.0 / v).sqrt();
    let mu_prime = mu + phi_prime * phi_prime * g * (score - e);

    // Step 8: back to the Glicko scale.
    Rating {
        rating: mu_prime * SCALE + DEFAULT_RATING,
        deviation: phi_prime * SCALE,
        volatility: sigma_prime,
    }
}

fn g(phi: f64) -> f64 {
    use std::f64::consts::PI;
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

/// Expected score against an opponent at `mu_j` with spread factor `g`.
fn expectation(mu: f64, mu_j: f64, g: f64) -> f64 {
    1.0 / (1.0 + (-g * (mu - mu_j)).exp())
}

/// Solve for the new volatility (the `sigma'` of step 5) with the Illinois
/// variant of regula falsi, as prescribed by the Glicko-2 paper.
fn new_volatility(sigma: f64, delta: f64, phi: f64, v: f64) -> f64 {
    let a = (sigma * sigma).ln();
    let delta_sq = delta * delta;
    let phi_sq = phi * phi;

    let f = |x: f64| {
        let ex = x.exp();
        let num = ex * (delta_sq - phi_sq - v - ex);
        let den = 2.0 * (phi_sq + v + ex) * (phi_sq + v + ex);
        num / den - (x - a) / (TAU * TAU)
    };

    let mut big_a = a;
    let mut big_b = if delta_sq > phi_sq + v {
        (delta_sq - phi_sq - v).ln()
    } else {
        let mut k = 1.0;
        while f(a - k * TAU) < 0.0 {
            k += 1.0;
        }
        a - k * TAU
    };

    let mut f_a = f(big_a);
    let mut f_b = f(big_b);

    while (big_b - big_a).abs() > CONVERGENCE {
        let big_c = big_a + (big_a - big_b) * f_a / (f_b - f_a);
        let f_c = f(big_c);

        if f_c * f_b <= 0.0 {
            big_a = big_b;
            f_a = f_b;
        } else {
            f_a /= 2.0;
        }

        big_b = big_c;
        f_b = f_c;
    }

    (big_a / 2.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle(rating: f64, deviation: f64) -> Rating {
        Rating::new(rating, deviation, DEFAULT_VOLATILITY)
    }

    #[test]
    fn test_win_raises_rating_and_loss_lowers_it() {
        let player = Rating::default();
        let opp = puzzle(1500.0, 100.0);

        let won = update(player, opp, Outcome::Win);
        let lost = update(player, opp, Outcome::Loss);

        assert!(won.rating > player.rating + 1.0);
        assert!(lost.rating < player.rating - 1.0);
    }

    #[test]
    fn test_harder_puzzle_awards_more_on_win() {
        let player = Rating::default();
        let easy = update(player, puzzle(1200.0, 100.0), Outcome::Win);
        let hard = update(player, puzzle(1900.0, 100.0), Outcome::Win);

        assert!(hard.rating - player.rating > easy.rating - player.rating);
    }

    #[test]
    fn test_easier_puzzle_penalizes_more_on_loss() {
        let player = Rating::default();
        let easy = update(player, puzzle(1200.0, 100.0), Outcome::Loss);
        let hard = update(player, puzzle(1900.0, 100.0), Outcome::Loss);

        // Losing to a much easier puzzle costs more than losing to a hard one.
        assert!(player.rating - easy.rating > player.rating - hard.rating);
    }

    #[test]
    fn test_deviation_shrinks_after_a_game() {
        let player = Rating::default();
        let updated = update(player, puzzle(1500.0, 100.0), Outcome::Win);
        assert!(updated.deviation < player.deviation);
        assert!(updated.deviation > 0.0);
    }

    #[test]
    fn test_matches_published_glicko2_example_direction() {
        // Glickman's worked example uses three games; with a single game
        // against the first opponent (1400, RD 30, win) a 1500/200 player
        // should land noticeably above 1500 with a reduced RD.
        let player = Rating::new(1500.0, 200.0, 0.06);
        let updated = update(player, puzzle(1400.0, 30.0), Outcome::Win);

        assert!(updated.rating > 1510.0 && updated.rating < 1600.0);
        assert!(updated.deviation < 200.0);
        assert!((updated.volatility - 0.06).abs() < 0.01);
    }

    #[test]
    fn test_confident_rating_moves_less() {
        let confident = Rating::new(1500.0, 50.0, 0.06);
        let uncertain = Rating::new(1500.0, 350.0, 0.06);
        let opp = puzzle(1500.0, 100.0);

        let confident_gain = update(confident, opp, Outcome::Win).rating - 1500.0;
        let uncertain_gain = update(uncertain, opp, Outcome::Win).rating - 1500.0;

        assert!(uncertain_gain > confident_gain);
    }
}
