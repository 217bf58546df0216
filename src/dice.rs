//! Dice rolls driving weekly volume.
//!
//! Generation uses two six-sided dice per lift per week and never repeats a
//! lift's pair in consecutive weeks. Rerolls draw from the narrower face set
//! {1, 2, 4, 6}; each of those faces falls in its own volume-table bucket.
//!
//! Randomness comes through [`DieSource`] so tests can inject a seeded or
//! scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::WEEKS;
use crate::error::ProgramError;

/// Faces used when generating a program.
pub const STANDARD_FACES: &[u8] = &[1, 2, 3, 4, 5, 6];

/// Faces used when rerolling a week.
pub const REROLL_FACES: &[u8] = &[1, 2, 4, 6];

/// Upper bound on redraws while looking for a pair that differs from the previous one.
const MAX_DRAWS: usize = 1_000;

/// Lift name to its pair for every week, index 0 being week 1.
pub type WeeklyRolls = BTreeMap<String, Vec<RollPair>>;

/// One lift's two-die outcome for one week. Both dice are within 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct RollPair {
    first: u8,
    second: u8,
}

impl RollPair {
    /// Returns None if either die is outside 1..=6.
    pub fn new(first: u8, second: u8) -> Option<Self> {
        if (1..=6).contains(&first) && (1..=6).contains(&second) {
            Some(Self { first, second })
        } else {
            None
        }
    }

    pub fn first(&self) -> u8 {
        self.first
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

impl TryFrom<[u8; 2]> for RollPair {
    type Error = String;

    fn try_from(value: [u8; 2]) -> Result<Self, Self::Error> {
        RollPair::new(value[0], value[1])
            .ok_or_else(|| format!("dice must be between 1 and 6, got {value:?}"))
    }
}

impl From<RollPair> for [u8; 2] {
    fn from(pair: RollPair) -> Self {
        [pair.first, pair.second]
    }
}

impl std::fmt::Display for RollPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Source of single die throws.
pub trait DieSource {
    /// Returns one of `faces`, chosen uniformly.
    fn roll(&mut self, faces: &[u8]) -> u8;
}

/// [`DieSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl RngDice<StdRng> {
    /// Seeded from the operating system; used for real requests.
    pub fn from_os() -> Self {
        RngDice(StdRng::from_os_rng())
    }

    /// Deterministic source for reproducible programs.
    pub fn seeded(seed: u64) -> Self {
        RngDice(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DieSource for RngDice<R> {
    fn roll(&mut self, faces: &[u8]) -> u8 {
        faces[self.0.random_range(0..faces.len())]
    }
}

/// Draws a pair of dice from `faces` until it differs from `previous`.
///
/// The pair is redrawn as a unit. With no previous pair the first draw is
/// accepted.
pub fn draw_pair<D: DieSource + ?Sized>(
    dice: &mut D,
    faces: &[u8],
    previous: Option<RollPair>,
) -> Result<RollPair, ProgramError> {
    for _ in 0..MAX_DRAWS {
        let first = dice.roll(faces);
        let second = dice.roll(faces);
        let pair = RollPair::new(first, second).ok_or_else(|| {
            ProgramError::GenerationInvariantViolation(format!(
                "die source produced ({first}, {second}) outside 1..=6"
            ))
        })?;

        if previous != Some(pair) {
            return Ok(pair);
        }
    }

    Err(ProgramError::GenerationInvariantViolation(format!(
        "no pair differing from {previous:?} after {MAX_DRAWS} draws"
    )))
}

/// Draws eight weeks of pairs for one lift with no pair repeated in consecutive weeks.
pub fn lift_rolls<D: DieSource + ?Sized>(dice: &mut D) -> Result<Vec<RollPair>, ProgramError> {
    let mut rolls: Vec<RollPair> = Vec::with_capacity(WEEKS as usize);
    for _ in 0..WEEKS {
        let pair = draw_pair(dice, STANDARD_FACES, rolls.last().copied())?;
        rolls.push(pair);
    }
    Ok(rolls)
}

/// Draws weekly rolls for every lift, independently per lift.
pub fn weekly_rolls<D: DieSource + ?Sized>(
    lifts: &[&str],
    dice: &mut D,
) -> Result<WeeklyRolls, ProgramError> {
    let mut rolls = WeeklyRolls::new();
    for lift in lifts {
        rolls.insert(lift.to_string(), lift_rolls(dice)?);
    }
    Ok(rolls)
}

/// Draws a replacement pair with the reroll faces, differing from `current`.
pub fn reroll_pair<D: DieSource + ?Sized>(
    dice: &mut D,
    current: Option<RollPair>,
) -> Result<RollPair, ProgramError> {
    draw_pair(dice, REROLL_FACES, current)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of faces.
    pub(crate) struct ScriptedDice(pub VecDeque<u8>);

    impl ScriptedDice {
        pub(crate) fn new(faces: &[u8]) -> Self {
            Self(faces.iter().copied().collect())
        }
    }

    impl DieSource for ScriptedDice {
        fn roll(&mut self, _faces: &[u8]) -> u8 {
            self.0.pop_front().expect("script exhausted")
        }
    }

    /// Always returns the same face.
    struct StuckDice(u8);

    impl DieSource for StuckDice {
        fn roll(&mut self, _faces: &[u8]) -> u8 {
            self.0
        }
    }

    #[test]
    fn test_roll_pair_range() {
        assert!(RollPair::new(1, 6).is_some());
        assert!(RollPair::new(0, 3).is_none());
        assert!(RollPair::new(3, 7).is_none());
    }

    #[test]
    fn test_roll_pair_serializes_as_array() {
        let pair = RollPair::new(2, 5).unwrap();
        assert_eq!(serde_json::to_string(&pair).unwrap(), "[2,5]");
        assert_eq!(serde_json::from_str::<RollPair>("[2,5]").unwrap(), pair);
        assert!(serde_json::from_str::<RollPair>("[0,5]").is_err());
    }

    #[test]
    fn test_draw_pair_resamples_whole_pair() {
        // First draw repeats the previous pair, second draw is accepted as a unit.
        let mut dice = ScriptedDice::new(&[3, 4, 3, 5]);
        let previous = RollPair::new(3, 4);
        let pair = draw_pair(&mut dice, STANDARD_FACES, previous).unwrap();
        assert_eq!(pair, RollPair::new(3, 5).unwrap());
        assert!(dice.0.is_empty());
    }

    #[test]
    fn test_draw_pair_accepts_first_draw_without_previous() {
        let mut dice = ScriptedDice::new(&[6, 6]);
        let pair = draw_pair(&mut dice, STANDARD_FACES, None).unwrap();
        assert_eq!(pair, RollPair::new(6, 6).unwrap());
    }

    #[test]
    fn test_draw_pair_gives_up_on_stuck_source() {
        let mut dice = StuckDice(2);
        let result = draw_pair(&mut dice, REROLL_FACES, RollPair::new(2, 2));
        assert!(matches!(
            result,
            Err(ProgramError::GenerationInvariantViolation(_))
        ));
    }

    #[test]
    fn test_draw_pair_rejects_out_of_range_face() {
        let mut dice = StuckDice(9);
        assert!(matches!(
            draw_pair(&mut dice, STANDARD_FACES, None),
            Err(ProgramError::GenerationInvariantViolation(_))
        ));
    }

    #[test]
    fn test_lift_rolls_never_repeat_consecutively() {
        for seed in 0..200 {
            let mut dice = RngDice::seeded(seed);
            let rolls = lift_rolls(&mut dice).unwrap();
            assert_eq!(rolls.len(), WEEKS as usize);
            for pair in rolls.windows(2) {
                assert_ne!(pair[0], pair[1], "seed {seed}");
            }
        }
    }

    #[test]
    fn test_weekly_rolls_covers_every_lift() {
        let mut dice = RngDice::seeded(7);
        let rolls = weekly_rolls(&["squat", "hinge"], &mut dice).unwrap();
        assert_eq!(rolls.len(), 2);
        assert!(rolls.values().all(|r| r.len() == WEEKS as usize));
    }

    #[test]
    fn test_seeded_dice_are_reproducible() {
        let a = weekly_rolls(&["squat"], &mut RngDice::seeded(42)).unwrap();
        let b = weekly_rolls(&["squat"], &mut RngDice::seeded(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reroll_pair_uses_restricted_faces() {
        let mut dice = RngDice::seeded(3);
        let current = RollPair::new(4, 4);
        for _ in 0..500 {
            let pair = reroll_pair(&mut dice, current).unwrap();
            assert_ne!(Some(pair), current);
            assert!(REROLL_FACES.contains(&pair.first()));
            assert!(REROLL_FACES.contains(&pair.second()));
        }
    }
}
