//! Rep ladders and the greedy breakdown of a volume target into sets.

/// RM used when a lift has no recorded rep-max.
pub const DEFAULT_RM: u32 = 10;

/// Ladder for RMs outside 4..=15.
const DEFAULT_LADDER: [u32; 3] = [3, 5, 7];

/// Returns the ascending three-rung rep ladder for a rep-max.
pub fn ladder(rm: u32) -> [u32; 3] {
    match rm {
        4 => [1, 2, 3],
        5 => [2, 3, 3],
        6 => [2, 3, 4],
        7 => [2, 4, 5],
        8 => [3, 4, 5],
        9 => [3, 5, 6],
        10 => [3, 5, 7],
        11 => [4, 6, 7],
        12 => [4, 6, 8],
        13 => [4, 7, 9],
        14 => [5, 7, 9],
        15 => [5, 8, 10],
        _ => DEFAULT_LADDER,
    }
}

/// Splits `volume` total reps into sets by climbing the ladder.
///
/// Climbs restart from the bottom rung while the bottom rung still fits.
/// A climb stops at the first rung that does not fit, so it may end part
/// way up. Whatever is left below the bottom rung becomes one final set.
pub fn decompose(rm: u32, volume: u32) -> Vec<u32> {
    let rungs = ladder(rm);
    let mut remaining = volume;
    let mut sets = Vec::new();

    while remaining >= rungs[0] {
        for &reps in &rungs {
            if remaining < reps {
                break;
            }
            sets.push(reps);
            remaining -= reps;
        }
    }

    if remaining > 0 {
        sets.push(remaining);
    }

    sets
}

/// Formats sets as `"3 sets: 5, 5, 3"`.
pub fn format_scheme(sets: &[u32]) -> String {
    if sets.is_empty() {
        return String::new();
    }
    let reps: Vec<String> = sets.iter().map(|r| r.to_string()).collect();
    let noun = if sets.len() == 1 { "set" } else { "sets" };
    format!("{} {}: {}", sets.len(), noun, reps.join(", "))
}
