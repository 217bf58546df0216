//! Domain types for programs, their configuration snapshot and weeks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::catalog::Template;
use crate::dice::RollPair;
use crate::error::ProgramError;

/// Number of weeks in a Battleship program.
pub const WEEKS: u32 = 8;

/// Lift name to rep-max.
pub type RepMaxMap = BTreeMap<String, u32>;

/// One week's roll pair per lift.
pub type WeekRolls = BTreeMap<String, RollPair>;

/// Volume per intensity day for a single lift.
pub type IntensityVolumes = BTreeMap<Intensity, u32>;

/// One week's volumes, per lift and intensity day.
pub type WeekVolumes = BTreeMap<String, IntensityVolumes>;

/// Effort designation of a training day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intensity {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Low,
}

impl Intensity {
    /// Returns all intensities, heaviest first.
    pub fn all() -> &'static [Intensity] {
        &[Intensity::High, Intensity::Medium, Intensity::Low]
    }

    /// Single-letter code used in stored data.
    pub fn code(&self) -> &'static str {
        match self {
            Intensity::High => "H",
            Intensity::Medium => "M",
            Intensity::Low => "L",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Intensity::High => "Heavy",
            Intensity::Medium => "Medium",
            Intensity::Low => "Light",
        }
    }

    /// Column of this intensity in the volume table.
    pub(crate) fn index(&self) -> usize {
        match self {
            Intensity::High => 0,
            Intensity::Medium => 1,
            Intensity::Low => 2,
        }
    }
}

impl FromStr for Intensity {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H" | "HIGH" | "HEAVY" => Ok(Intensity::High),
            "M" | "MEDIUM" => Ok(Intensity::Medium),
            "L" | "LOW" | "LIGHT" => Ok(Intensity::Low),
            _ => Err(ProgramError::InvalidConfiguration(format!(
                "unknown intensity: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Program family. Only Battleship programs are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    #[default]
    Battleship,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Battleship => "battleship",
        }
    }
}

impl FromStr for ProgramType {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "battleship" => Ok(ProgramType::Battleship),
            _ => Err(ProgramError::InvalidConfiguration(format!(
                "unknown program type: {s}"
            ))),
        }
    }
}

/// Lifecycle status; transitions are driven by clients, not by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

impl ProgramStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramStatus::Draft => "draft",
            ProgramStatus::Active => "active",
            ProgramStatus::Completed => "completed",
            ProgramStatus::Archived => "archived",
        }
    }
}

impl FromStr for ProgramStatus {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(ProgramStatus::Draft),
            "active" => Ok(ProgramStatus::Active),
            "completed" => Ok(ProgramStatus::Completed),
            "archived" => Ok(ProgramStatus::Archived),
            _ => Err(ProgramError::InvalidConfiguration(format!(
                "unknown program status: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Load prescribed for a lift on an intensity day: a weight or a named variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiftLoad {
    Weight(f64),
    Variation(String),
}

impl std::fmt::Display for LiftLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiftLoad::Weight(w) if w.fract() == 0.0 => write!(f, "{w:.0}"),
            LiftLoad::Weight(w) => write!(f, "{w}"),
            LiftLoad::Variation(name) => write!(f, "{name}"),
        }
    }
}

/// Per-program snapshot of everything generation depended on.
///
/// The template is copied in at creation time so later catalog edits never
/// change an existing program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub num_lifts: u32,
    pub lift_rms: RepMaxMap,
    pub lift_weights: Option<BTreeMap<String, BTreeMap<Intensity, LiftLoad>>>,
    pub lift_intensity_rms: Option<BTreeMap<String, BTreeMap<Intensity, u32>>>,
    pub lift_names: Option<BTreeMap<String, String>>,
    pub weekly_template: Template,
}

impl ProgramConfig {
    /// Lifts this program trains, in catalog order.
    pub fn lifts(&self) -> &[String] {
        &self.weekly_template.lifts
    }

    /// RM for a lift on a given day: the intensity override, else the lift RM, else 10.
    pub fn effective_rm(&self, lift: &str, intensity: Intensity) -> u32 {
        self.lift_intensity_rms
            .as_ref()
            .and_then(|m| m.get(lift))
            .and_then(|m| m.get(&intensity))
            .copied()
            .filter(|rm| *rm > 0)
            .or_else(|| self.lift_rms.get(lift).copied())
            .unwrap_or(crate::ladder::DEFAULT_RM)
    }

    /// Prescribed load for a lift on a given day, if one was configured.
    pub fn load_for(&self, lift: &str, intensity: Intensity) -> Option<&LiftLoad> {
        self.lift_weights
            .as_ref()
            .and_then(|m| m.get(lift))
            .and_then(|m| m.get(&intensity))
    }
}

/// One stored week: rolls and volumes per lift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramWeek {
    /// 1-based.
    pub week_number: u32,
    pub dice_roll_1: Option<u8>,
    pub dice_roll_2: Option<u8>,
    pub dice_rolls: WeekRolls,
    pub weekly_data: WeekVolumes,
}

impl ProgramWeek {
    /// Refreshes the single-pair mirror from the given lift's pair.
    pub fn sync_legacy_rolls(&mut self, first_lift: &str) {
        if let Some(pair) = self.dice_rolls.get(first_lift) {
            self.dice_roll_1 = Some(pair.first());
            self.dice_roll_2 = Some(pair.second());
        }
    }
}

/// A stored program with its config and weeks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: Option<String>,
    pub athlete_id: Uuid,
    pub created_by: Uuid,
    pub program_type: ProgramType,
    pub status: ProgramStatus,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub config: ProgramConfig,
    pub weeks: Vec<ProgramWeek>,
}

impl Program {
    pub fn week(&self, week_number: u32) -> Option<&ProgramWeek> {
        self.weeks.iter().find(|w| w.week_number == week_number)
    }
}

/// Request payload for creating a program.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProgram {
    pub name: Option<String>,
    pub athlete_id: Uuid,
    pub created_by: Uuid,
    pub num_lifts: u32,
    pub lift_rms: RepMaxMap,
    pub lift_weights: Option<BTreeMap<String, BTreeMap<Intensity, LiftLoad>>>,
    pub lift_intensity_rms: Option<BTreeMap<String, BTreeMap<Intensity, u32>>>,
    pub lift_names: Option<BTreeMap<String, String>>,
    pub sessions_per_week: Option<u32>,
    pub start_date: Option<NaiveDate>,
}

/// Partial update of a program's editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramUpdate {
    pub name: Option<String>,
    pub status: Option<String>,
}
