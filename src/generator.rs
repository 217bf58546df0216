//! Program generation.
//!
//! Resolves lifts and template, draws eight weeks of rolls per lift, looks up
//! every (week, lift, intensity) volume and turns each session entry into a
//! concrete set/rep prescription. Also rerolls a single stored week.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{Template, lifts_for, resolve_template};
use crate::dice::{DieSource, RollPair, WeeklyRolls, reroll_pair, weekly_rolls};
use crate::domain::{Intensity, ProgramConfig, ProgramWeek, RepMaxMap, WEEKS, WeekRolls, WeekVolumes};
use crate::error::ProgramError;
use crate::ladder::{DEFAULT_RM, decompose, ladder};
use crate::volume::volumes_for;

/// Per-week volumes, index 0 being week 1.
pub type VolumePlan = Vec<WeekVolumes>;

/// Week number (1-based) to session name to lift to prescription.
pub type DailyBreakdown = BTreeMap<u32, BTreeMap<String, BTreeMap<String, LiftPrescription>>>;

/// What a lift calls for in one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiftPrescription {
    pub intensity: Intensity,
    pub total_reps: u32,
    pub rm: u32,
    pub rep_ladder: [u32; 3],
    pub suggested_sets: Vec<u32>,
    pub num_sets: usize,
}

impl LiftPrescription {
    pub fn new(intensity: Intensity, total_reps: u32, rm: u32) -> Self {
        let suggested_sets = decompose(rm, total_reps);
        Self {
            intensity,
            total_reps,
            rm,
            rep_ladder: ladder(rm),
            num_sets: suggested_sets.len(),
            suggested_sets,
        }
    }
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedProgram {
    pub lifts: Vec<String>,
    pub lift_rms: RepMaxMap,
    pub template: Template,
    pub rolls: WeeklyRolls,
    pub weeks: VolumePlan,
    pub daily_breakdown: DailyBreakdown,
}

impl GeneratedProgram {
    /// Splits the plan into the eight week records that get stored.
    pub fn program_weeks(&self) -> Vec<ProgramWeek> {
        self.weeks
            .iter()
            .enumerate()
            .map(|(index, volumes)| {
                let dice_rolls: WeekRolls = self
                    .rolls
                    .iter()
                    .filter_map(|(lift, rolls)| rolls.get(index).map(|r| (lift.clone(), *r)))
                    .collect();

                let mut week = ProgramWeek {
                    week_number: index as u32 + 1,
                    dice_roll_1: None,
                    dice_roll_2: None,
                    dice_rolls,
                    weekly_data: volumes.clone(),
                };
                if let Some(first) = self.lifts.first() {
                    week.sync_legacy_rolls(first);
                }
                week
            })
            .collect()
    }
}

/// Generates a complete eight-week program.
///
/// Validation happens before any dice are rolled: the lift count must be
/// supported and `lift_rms` must hold an RM for every resolved lift.
pub fn generate_program<D: DieSource + ?Sized>(
    num_lifts: u32,
    lift_rms: &RepMaxMap,
    sessions_per_week: Option<u32>,
    dice: &mut D,
) -> Result<GeneratedProgram, ProgramError> {
    let lifts = lifts_for(num_lifts)?;

    if let Some(missing) = lifts.iter().find(|lift| !lift_rms.contains_key(**lift)) {
        return Err(ProgramError::InvalidConfiguration(format!(
            "missing RM value for lift: {missing}"
        )));
    }

    let template = resolve_template(num_lifts, sessions_per_week)?;
    let rolls = weekly_rolls(lifts, dice)?;
    let weeks = volume_plan(&rolls);

    let daily_breakdown = daily_breakdown(
        weeks.iter().enumerate().map(|(i, v)| (i as u32 + 1, v)),
        &template,
        lift_rms,
    );

    Ok(GeneratedProgram {
        lifts: lifts.iter().map(|l| l.to_string()).collect(),
        lift_rms: lift_rms.clone(),
        template,
        rolls,
        weeks,
        daily_breakdown,
    })
}

/// Looks up the volume of every (week, lift, intensity) triple.
pub fn volume_plan(rolls: &WeeklyRolls) -> VolumePlan {
    (0..WEEKS as usize)
        .map(|week| {
            rolls
                .iter()
                .filter_map(|(lift, pairs)| {
                    pairs.get(week).map(|pair| (lift.clone(), volumes_for(*pair)))
                })
                .collect()
        })
        .collect()
}

/// Builds the session-by-session breakdown for the given weeks.
///
/// A lift missing from a week's volumes gets 0 reps; a lift missing from
/// `lift_rms` uses the default RM.
pub fn daily_breakdown<'a>(
    weeks: impl IntoIterator<Item = (u32, &'a WeekVolumes)>,
    template: &Template,
    lift_rms: &RepMaxMap,
) -> DailyBreakdown {
    weeks
        .into_iter()
        .map(|(week_number, volumes)| {
            let sessions = template
                .sessions
                .iter()
                .map(|(session, entries)| {
                    let lifts = entries
                        .iter()
                        .map(|(lift, &intensity)| {
                            let total_reps = volumes
                                .get(lift)
                                .and_then(|v| v.get(&intensity))
                                .copied()
                                .unwrap_or(0);
                            let rm = lift_rms.get(lift).copied().unwrap_or(DEFAULT_RM);
                            (lift.clone(), LiftPrescription::new(intensity, total_reps, rm))
                        })
                        .collect();
                    (session.clone(), lifts)
                })
                .collect();
            (week_number, sessions)
        })
        .collect()
}

/// Rebuilds the breakdown of a stored program from its current weeks.
pub fn breakdown_for(config: &ProgramConfig, weeks: &[ProgramWeek]) -> DailyBreakdown {
    daily_breakdown(
        weeks.iter().map(|w| (w.week_number, &w.weekly_data)),
        &config.weekly_template,
        &config.lift_rms,
    )
}

/// Rerolls one lift, or every configured lift, within a single week.
///
/// New pairs come from the reroll faces and always differ from the pair they
/// replace. The three intensity volumes of each rerolled lift are recomputed;
/// untargeted lifts are left as they were. Returns the rerolled lift names.
pub fn reroll_week<D: DieSource + ?Sized>(
    config: &ProgramConfig,
    week: &mut ProgramWeek,
    lift: Option<&str>,
    dice: &mut D,
) -> Result<Vec<String>, ProgramError> {
    let targets: Vec<&String> = match lift {
        Some(name) => {
            let lift = config
                .lifts()
                .iter()
                .find(|l| l.as_str() == name)
                .ok_or_else(|| {
                    ProgramError::NotFound(format!("lift {name} is not part of this program"))
                })?;
            vec![lift]
        }
        None => config.lifts().iter().collect(),
    };

    // Draw everything first so a failed draw leaves the week untouched.
    let mut draws: Vec<(&String, RollPair)> = Vec::with_capacity(targets.len());
    for lift in targets {
        let current = week.dice_rolls.get(lift).copied();
        let pair = reroll_pair(dice, current)?;
        log::debug!(
            "week {}: rerolled {lift} from {current:?} to {pair}",
            week.week_number
        );
        draws.push((lift, pair));
    }

    let mut rerolled = Vec::with_capacity(draws.len());
    for (lift, pair) in draws {
        week.dice_rolls.insert(lift.clone(), pair);
        week.weekly_data.insert(lift.clone(), volumes_for(pair));
        rerolled.push(lift.clone());
    }

    if let Some(first) = config.lifts().first() {
        week.sync_legacy_rolls(first);
    }

    Ok(rerolled)
}
