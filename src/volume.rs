//! Volume lookup: (roll pair, intensity day) to the number of lifts (NL).
//!
//! Each die is bucketed into {1}, {2,3}, {4,5}, {6}. The two dice index
//! different axes, so (1, 6) and (6, 1) are distinct entries.

use crate::dice::RollPair;
use crate::domain::{Intensity, IntensityVolumes};

/// Indexed by first-die bucket, second-die bucket, then [H, M, L].
const VOLUME_TABLE: [[[u32; 3]; 4]; 4] = [
    // first die 1
    [[6, 21, 33], [9, 18, 33], [11, 16, 33], [14, 13, 33]],
    // first die 2-3
    [[6, 34, 48], [9, 31, 48], [11, 29, 48], [14, 26, 38]],
    // first die 4-5
    [[6, 44, 62], [9, 41, 62], [11, 39, 62], [14, 36, 62]],
    // first die 6
    [[6, 57, 77], [9, 54, 77], [11, 52, 77], [14, 49, 77]],
];

/// Table row/column for a die already validated to 1..=6.
fn bucket(die: u8) -> usize {
    match die {
        1 => 0,
        2 | 3 => 1,
        4 | 5 => 2,
        _ => 3,
    }
}

/// Looks up the volume for one roll pair on one intensity day.
pub fn volume(roll: RollPair, intensity: Intensity) -> u32 {
    VOLUME_TABLE[bucket(roll.first())][bucket(roll.second())][intensity.index()]
}

/// Volumes for all three intensity days of one roll pair.
pub fn volumes_for(roll: RollPair) -> IntensityVolumes {
    Intensity::all()
        .iter()
        .map(|&intensity| (intensity, volume(roll, intensity)))
        .collect()
}
