//! Static lift and session-template catalogs.
//!
//! Lift lists are keyed by lift count (3, 4 or 6). Templates are keyed by
//! (lift count, sessions per week) and assign every lift in a session an
//! intensity day.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Intensity;
use crate::domain::Intensity::{High as H, Low as L, Medium as M};
use crate::error::ProgramError;

const LIFTS3: &[&str] = &["upper_body_press", "upper_body_pull", "squat"];

const LIFTS4: &[&str] = &["upper_body_press", "upper_body_pull", "hip_hinge", "squat"];

const LIFTS6: &[&str] = &[
    "vert_pull",
    "horz_pull",
    "vert_press",
    "horz_press",
    "squat",
    "hinge",
];

/// Returns the canonical, ordered lift names for a lift count.
pub fn lifts_for(num_lifts: u32) -> Result<&'static [&'static str], ProgramError> {
    match num_lifts {
        3 => Ok(LIFTS3),
        4 => Ok(LIFTS4),
        6 => Ok(LIFTS6),
        _ => Err(ProgramError::InvalidConfiguration(format!(
            "invalid number of lifts: {num_lifts}, must be 3, 4 or 6"
        ))),
    }
}

/// Human-readable label for a catalog lift key.
pub fn lift_label(lift: &str) -> Option<&'static str> {
    match lift {
        "upper_body_press" => Some("Upper Body Press"),
        "upper_body_pull" => Some("Upper Body Pull"),
        "squat" => Some("Squat"),
        "hip_hinge" | "hinge" => Some("Hip Hinge"),
        "horz_press" => Some("Horizontal Press"),
        "horz_pull" => Some("Horizontal Pull"),
        "vert_press" => Some("Vertical Press"),
        "vert_pull" => Some("Vertical Pull"),
        _ => None,
    }
}

type SessionSpec = (&'static str, &'static [(&'static str, Intensity)]);

/// Compile-time template definition.
pub struct TemplateSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub num_lifts: u32,
    pub sessions_per_week: u32,
    sessions: &'static [SessionSpec],
}

const TEMPLATE_3_LIFTS_3_DAYS: TemplateSpec = TemplateSpec {
    key: "3_lifts_3_days",
    name: "3 Lifts - 3 Days/Week",
    num_lifts: 3,
    sessions_per_week: 3,
    sessions: &[
        ("A", &[("upper_body_press", H), ("squat", M), ("upper_body_pull", L)]),
        ("B", &[("squat", H), ("upper_body_pull", M), ("upper_body_press", L)]),
        ("C", &[("upper_body_pull", H), ("upper_body_press", M), ("squat", L)]),
    ],
};

const TEMPLATE_4_LIFTS_3_DAYS: TemplateSpec = TemplateSpec {
    key: "4_lifts_3_days",
    name: "4 Lifts - 3 Days/Week",
    num_lifts: 4,
    sessions_per_week: 3,
    sessions: &[
        (
            "A",
            &[
                ("upper_body_press", H),
                ("hip_hinge", H),
                ("upper_body_pull", M),
                ("squat", M),
            ],
        ),
        (
            "B",
            &[
                ("upper_body_pull", H),
                ("squat", H),
                ("upper_body_press", L),
                ("hip_hinge", L),
            ],
        ),
        (
            "C",
            &[
                ("upper_body_press", M),
                ("hip_hinge", M),
                ("upper_body_pull", L),
                ("squat", L),
            ],
        ),
    ],
};

const TEMPLATE_4_LIFTS_4_DAYS: TemplateSpec = TemplateSpec {
    key: "4_lifts_4_days",
    name: "4 Lifts - 4 Days/Week",
    num_lifts: 4,
    sessions_per_week: 4,
    sessions: &[
        ("A", &[("upper_body_press", H), ("upper_body_pull", M), ("hip_hinge", L)]),
        ("B", &[("squat", H), ("hip_hinge", M), ("upper_body_press", L)]),
        ("C", &[("upper_body_pull", H), ("upper_body_press", M), ("squat", L)]),
        ("D", &[("hip_hinge", H), ("squat", M), ("upper_body_pull", L)]),
    ],
};

const TEMPLATE_6_LIFTS_4_DAYS: TemplateSpec = TemplateSpec {
    key: "6_lifts_4_days",
    name: "6 Lifts - 4 Days/Week",
    num_lifts: 6,
    sessions_per_week: 4,
    sessions: &[
        (
            "A",
            &[
                ("horz_press", H),
                ("horz_pull", H),
                ("vert_press", M),
                ("vert_pull", M),
                ("hinge", L),
            ],
        ),
        (
            "B",
            &[("squat", H), ("hinge", M), ("horz_press", L), ("horz_pull", L)],
        ),
        (
            "C",
            &[
                ("vert_press", H),
                ("vert_pull", H),
                ("horz_press", M),
                ("horz_pull", M),
                ("squat", L),
            ],
        ),
        (
            "D",
            &[("hinge", H), ("squat", M), ("vert_press", L), ("vert_pull", L)],
        ),
    ],
};

/// All templates, in listing order.
pub const TEMPLATES: &[&TemplateSpec] = &[
    &TEMPLATE_3_LIFTS_3_DAYS,
    &TEMPLATE_4_LIFTS_3_DAYS,
    &TEMPLATE_4_LIFTS_4_DAYS,
    &TEMPLATE_6_LIFTS_4_DAYS,
];

/// Weekly session structure, snapshotted into each program's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub key: String,
    pub name: String,
    pub num_lifts: u32,
    pub sessions_per_week: u32,
    pub lifts: Vec<String>,
    /// Session name to lift to intensity day.
    pub sessions: BTreeMap<String, BTreeMap<String, Intensity>>,
}

/// Catalog entry exposed for UI population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub key: &'static str,
    pub name: &'static str,
    pub num_lifts: u32,
    pub sessions_per_week: u32,
}

impl TemplateSpec {
    /// Builds an owned template with the lift list resolved from the lift catalog.
    pub fn to_template(&self) -> Result<Template, ProgramError> {
        let lifts = lifts_for(self.num_lifts)?;

        let sessions = self
            .sessions
            .iter()
            .map(|(name, entries)| {
                let lifts = entries
                    .iter()
                    .map(|(lift, intensity)| (lift.to_string(), *intensity))
                    .collect();
                (name.to_string(), lifts)
            })
            .collect();

        Ok(Template {
            key: self.key.to_string(),
            name: self.name.to_string(),
            num_lifts: self.num_lifts,
            sessions_per_week: self.sessions_per_week,
            lifts: lifts.iter().map(|l| l.to_string()).collect(),
            sessions,
        })
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            key: self.key,
            name: self.name,
            num_lifts: self.num_lifts,
            sessions_per_week: self.sessions_per_week,
        }
    }
}

/// Selects the template for a lift count.
///
/// Only the 4-lift count honors `sessions_per_week`, and only the value 4
/// switches away from the 3-session template. Other counts ignore it.
pub fn resolve_template(
    num_lifts: u32,
    sessions_per_week: Option<u32>,
) -> Result<Template, ProgramError> {
    let spec = match (num_lifts, sessions_per_week) {
        (3, _) => &TEMPLATE_3_LIFTS_3_DAYS,
        (4, Some(4)) => &TEMPLATE_4_LIFTS_4_DAYS,
        (4, _) => &TEMPLATE_4_LIFTS_3_DAYS,
        (6, _) => &TEMPLATE_6_LIFTS_4_DAYS,
        _ => {
            return Err(ProgramError::InvalidConfiguration(format!(
                "invalid number of lifts: {num_lifts}"
            )));
        }
    };
    spec.to_template()
}

/// Lists every template with its metadata.
pub fn available_templates() -> Vec<TemplateSummary> {
    TEMPLATES.iter().map(|t| t.summary()).collect()
}
