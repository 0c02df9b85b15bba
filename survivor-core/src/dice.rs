//! d20 rolls for risky options.
//!
//! Dice are rolled locally when a choice is submitted and travel with the
//! choice to the game-master, which decides what the roll means against its
//! difficulty class.

use rand::Rng;

/// Sides on the option die.
pub const D20_SIDES: u32 = 20;

/// Roll a d20, uniform in `[1, 20]`.
pub fn roll_d20<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(1..=D20_SIDES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SessionRng;

    #[test]
    fn test_roll_range() {
        let mut rng = SessionRng::new(7);
        for _ in 0..200 {
            let value = roll_d20(&mut rng);
            assert!((1..=20).contains(&value));
        }
    }
}
