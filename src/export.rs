//! Markdown renderings of a stored program for coaches and athletes.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::catalog::lift_label;
use crate::domain::{Intensity, Program, ProgramConfig, ProgramWeek, WEEKS};
use crate::error::ProgramError;
use crate::ladder::{decompose, format_scheme};

const DEFAULT_TITLE: &str = "The Battleship Program";
const MISSING_LOAD: &str = "N/A";
const FOOTER: &str = "*Generated by Strength Programs - Battleship Program Generator*\n";

const ATHLETE_NOTES: &[&str] = &[
    "Complete the total reps listed for each exercise",
    "Use the suggested rep scheme or adjust as needed",
    "Rest 3-5 minutes between sets for heavy lifts",
    "Rest as needed (1-2 minutes) between sets for medium/light lifts",
    "Track your completed sets and reps for each session",
];

const COACH_NOTES: &[&str] = &[
    "This is the coach's view with complete program details",
    "Dice rolls determine the total reps (NL) for each lift at each intensity",
    "Rep schemes are calculated based on the athlete's RM at each weight",
    "Athletes can adjust set/rep schemes as long as total reps are completed",
];

/// Which rendering to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportView {
    /// Everything, including rolls and RMs.
    #[default]
    Coach,
    /// Loads, reps and rep schemes only.
    Athlete,
    /// One printable table per week.
    Table,
}

impl ExportView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportView::Coach => "coach",
            ExportView::Athlete => "athlete",
            ExportView::Table => "table",
        }
    }

    /// Download name such as `winter_block_coach_view.md`.
    pub fn file_name(&self, program: &Program) -> String {
        let base = program
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("battleship_program");
        let slug = base
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        format!("{slug}_{}_view.md", self.as_str())
    }
}

impl FromStr for ExportView {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coach" => Ok(ExportView::Coach),
            "athlete" => Ok(ExportView::Athlete),
            "table" => Ok(ExportView::Table),
            _ => Err(ProgramError::InvalidConfiguration(format!(
                "unknown export view: {s}"
            ))),
        }
    }
}

/// Renders `program` as markdown in the requested view.
pub fn render(program: &Program, view: ExportView) -> String {
    match view {
        ExportView::Coach => program_markdown(program, true),
        ExportView::Athlete => program_markdown(program, false),
        ExportView::Table => table_markdown(program),
    }
}

/// Display name for a lift: custom name, then catalog label, then the key in title case.
pub fn lift_display_name(config: &ProgramConfig, lift: &str) -> String {
    if let Some(names) = &config.lift_names
        && let Some(name) = names.get(lift)
        && !name.trim().is_empty()
    {
        return name.clone();
    }

    match lift_label(lift) {
        Some(label) => label.to_string(),
        None => lift
            .split('_')
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn load_text(config: &ProgramConfig, lift: &str, intensity: Intensity) -> String {
    config
        .load_for(lift, intensity)
        .map(|load| load.to_string())
        .unwrap_or_else(|| MISSING_LOAD.to_string())
}

fn title(program: &Program) -> &str {
    program
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE)
}

/// One lift of one session, resolved against a week's volumes.
struct SessionEntry<'a> {
    lift: &'a str,
    intensity: Intensity,
    total_reps: u32,
    load: String,
    rm: u32,
    scheme: String,
}

/// Session lifts sorted heavy to light.
fn session_entries<'a>(
    config: &ProgramConfig,
    week: &ProgramWeek,
    lifts: &'a BTreeMap<String, Intensity>,
) -> Vec<SessionEntry<'a>> {
    let mut entries: Vec<SessionEntry<'a>> = lifts
        .iter()
        .map(|(lift, &intensity)| {
            let total_reps = week
                .weekly_data
                .get(lift)
                .and_then(|volumes| volumes.get(&intensity))
                .copied()
                .unwrap_or(0);
            let rm = config.effective_rm(lift, intensity);
            SessionEntry {
                lift,
                intensity,
                total_reps,
                load: load_text(config, lift, intensity),
                rm,
                scheme: format_scheme(&decompose(rm, total_reps)),
            }
        })
        .collect();

    entries.sort_by_key(|e| e.intensity);
    entries
}

fn intensity_heading(intensity: Intensity) -> &'static str {
    match intensity {
        Intensity::High => "Heavy (85% 1RM)",
        Intensity::Medium => "Medium (75% 1RM)",
        Intensity::Low => "Light (65% 1RM)",
    }
}

fn push_notes(out: &mut String, notes: &[&str]) {
    for note in notes {
        out.push_str(&format!("- {note}\n"));
    }
}

fn program_markdown(program: &Program, coach: bool) -> String {
    let config = &program.config;
    let template = &config.weekly_template;
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", title(program)));
    out.push_str("**Program Type:** Battleship\n");
    out.push_str(&format!("**Duration:** {WEEKS} Weeks\n"));
    out.push_str(&format!("**Lifts:** {}\n", config.num_lifts));
    out.push_str(&format!(
        "**Sessions per Week:** {}\n",
        template.sessions_per_week
    ));
    out.push_str(&format!(
        "**Status:** {}\n",
        program.status.as_str().to_uppercase()
    ));

    if coach {
        out.push_str("\n---\n## Coach's Notes\n\n");
        out.push_str("This view includes all program details including dice rolls and rep maxes.\n");
    }
    out.push_str("\n---\n\n");

    if coach && config.lift_weights.is_some() && config.lift_intensity_rms.is_some() {
        out.push_str("## Lift Configuration\n\n");
        for lift in config.lifts() {
            out.push_str(&format!("### {}\n\n", lift_display_name(config, lift)));
            out.push_str("| Intensity | Weight | RM |\n");
            out.push_str("|-----------|--------|----|\n");
            for &intensity in Intensity::all() {
                out.push_str(&format!(
                    "| {} | {} | {} reps |\n",
                    intensity_heading(intensity),
                    load_text(config, lift, intensity),
                    config.effective_rm(lift, intensity)
                ));
            }
            out.push('\n');
        }
        out.push_str("---\n\n");
    }

    for week_number in 1..=WEEKS {
        let Some(week) = program.week(week_number) else {
            continue;
        };

        out.push_str(&format!("## Week {week_number}\n\n"));

        if coach && !week.dice_rolls.is_empty() {
            out.push_str("**Dice Rolls:**\n\n");
            for lift in config.lifts() {
                if let Some(pair) = week.dice_rolls.get(lift) {
                    out.push_str(&format!(
                        "- {}: {}, {}\n",
                        lift_display_name(config, lift),
                        pair.first(),
                        pair.second()
                    ));
                }
            }
            out.push('\n');
        }

        for (session, lifts) in &template.sessions {
            out.push_str(&format!("### Session {session}\n\n"));

            for entry in session_entries(config, week, lifts) {
                out.push_str(&format!(
                    "#### {} - {}\n\n",
                    lift_display_name(config, entry.lift),
                    entry.intensity.display_name()
                ));

                if coach {
                    out.push_str(&format!("- **Weight/Variation:** {}\n", entry.load));
                    out.push_str(&format!("- **Total Reps:** {}\n", entry.total_reps));
                    out.push_str(&format!("- **RM at this weight:** {} reps\n", entry.rm));
                    out.push_str(&format!("- **Suggested Rep Scheme:** {}\n", entry.scheme));
                } else {
                    out.push_str(&format!("{} × {} reps\n\n", entry.load, entry.total_reps));
                    out.push_str(&format!("{}\n", entry.scheme));
                }
                out.push('\n');
            }
        }

        out.push_str("---\n\n");
    }

    out.push_str("## Notes\n\n");
    push_notes(&mut out, if coach { COACH_NOTES } else { ATHLETE_NOTES });
    out.push_str("\n---\n\n");
    out.push_str(FOOTER);

    out
}

fn table_markdown(program: &Program) -> String {
    let config = &program.config;
    let template = &config.weekly_template;
    let mut out = String::new();

    out.push_str(&format!("# {}\n", title(program)));
    out.push_str("**Table View** - Optimized for Printing\n\n");
    out.push_str(&format!("**Duration:** {WEEKS} Weeks\n"));
    out.push_str(&format!("**Lifts:** {}\n", config.num_lifts));
    out.push_str(&format!(
        "**Sessions per Week:** {}\n\n",
        template.sessions_per_week
    ));
    out.push_str("---\n\n");

    for week_number in 1..=WEEKS {
        let Some(week) = program.week(week_number) else {
            continue;
        };

        out.push_str(&format!("## Week {week_number}\n\n"));
        out.push_str("| Session | Exercise | Load/Variation | Total Reps | Suggested Rep Scheme |\n");
        out.push_str("|---------|----------|----------------|------------|---------------------|\n");

        for (session, lifts) in &template.sessions {
            for (i, entry) in session_entries(config, week, lifts).iter().enumerate() {
                // Session name only on its first row.
                let label = if i == 0 { session.as_str() } else { "" };
                out.push_str(&format!(
                    "| {label} | {} | {} | {} | {} |\n",
                    lift_display_name(config, entry.lift),
                    entry.load,
                    entry.total_reps,
                    entry.scheme
                ));
            }
        }
        out.push('\n');

        if week_number < WEEKS {
            out.push_str("<div style=\"page-break-after: always;\"></div>\n\n");
        }
        out.push_str("---\n\n");
    }

    out.push_str("## Instructions\n\n");
    push_notes(&mut out, ATHLETE_NOTES);
    out.push_str("\n---\n\n");
    out.push_str(FOOTER);

    out
}
