//! Program operations that combine generation with storage.

use chrono::Utc;
use uuid::Uuid;

use crate::dice::DieSource;
use crate::domain::{
    NewProgram, Program, ProgramConfig, ProgramStatus, ProgramType, ProgramUpdate, WEEKS,
};
use crate::error::ProgramError;
use crate::generator::{DailyBreakdown, breakdown_for, generate_program, reroll_week};
use crate::store::ProgramStore;

/// Entry point for everything the HTTP layer does with programs.
#[derive(Debug, Clone)]
pub struct ProgramService {
    store: ProgramStore,
}

impl ProgramService {
    pub fn new(store: ProgramStore) -> Self {
        Self { store }
    }

    /// Generates and stores a new draft program.
    ///
    /// Nothing is stored if validation or generation fails.
    pub async fn create_program<D: DieSource + ?Sized>(
        &self,
        request: NewProgram,
        dice: &mut D,
    ) -> Result<Program, ProgramError> {
        let generated = generate_program(
            request.num_lifts,
            &request.lift_rms,
            request.sessions_per_week,
            dice,
        )?;

        let program = Program {
            id: Uuid::new_v4(),
            name: request.name,
            athlete_id: request.athlete_id,
            created_by: request.created_by,
            program_type: ProgramType::Battleship,
            status: ProgramStatus::Draft,
            start_date: request.start_date,
            created_at: Utc::now(),
            updated_at: None,
            weeks: generated.program_weeks(),
            config: ProgramConfig {
                num_lifts: request.num_lifts,
                lift_rms: request.lift_rms,
                lift_weights: request.lift_weights,
                lift_intensity_rms: request.lift_intensity_rms,
                lift_names: request.lift_names,
                weekly_template: generated.template,
            },
        };

        self.store.create_program(&program).await?;
        log::info!(
            "Created program {} ({}, athlete {})",
            program.id,
            program.config.weekly_template.name,
            program.athlete_id
        );

        Ok(program)
    }

    pub async fn get_program(&self, id: Uuid) -> Result<Program, ProgramError> {
        self.store
            .get_program(id)
            .await?
            .ok_or_else(|| program_not_found(id))
    }

    pub async fn list_programs(&self, skip: u32, limit: u32) -> Result<Vec<Program>, ProgramError> {
        Ok(self.store.list_programs(skip, limit).await?)
    }

    pub async fn delete_program(&self, id: Uuid) -> Result<(), ProgramError> {
        if !self.store.delete_program(id).await? {
            return Err(program_not_found(id));
        }
        log::info!("Deleted program {id}");
        Ok(())
    }

    /// Applies a name and/or status change.
    pub async fn update_program(
        &self,
        id: Uuid,
        update: ProgramUpdate,
    ) -> Result<Program, ProgramError> {
        let status = update
            .status
            .as_deref()
            .map(str::parse::<ProgramStatus>)
            .transpose()?;

        self.store
            .update_program_fields(id, update.name.as_deref(), status)
            .await?
            .ok_or_else(|| program_not_found(id))
    }

    /// Rerolls one lift, or all lifts, of a stored week and persists the result.
    ///
    /// The stored breakdown is not touched; use [`ProgramService::breakdown`]
    /// to get one that reflects the new volumes.
    pub async fn reroll_week<D: DieSource + ?Sized>(
        &self,
        id: Uuid,
        week_number: u32,
        lift: Option<&str>,
        dice: &mut D,
    ) -> Result<Program, ProgramError> {
        if !(1..=WEEKS).contains(&week_number) {
            return Err(ProgramError::NotFound(format!(
                "week {week_number} (weeks run 1 to {WEEKS})"
            )));
        }

        let updated = self
            .store
            .modify_week(id, week_number, |program, week| {
                let rerolled = reroll_week(&program.config, week, lift, dice)?;
                log::info!(
                    "Rerolled week {week_number} of program {id}: {}",
                    rerolled.join(", ")
                );
                Ok::<(), ProgramError>(())
            })
            .await?;

        updated.ok_or_else(|| program_not_found(id))
    }

    /// Session-by-session breakdown computed from the program's current weeks.
    pub async fn breakdown(&self, id: Uuid) -> Result<DailyBreakdown, ProgramError> {
        let program = self.get_program(id).await?;
        Ok(breakdown_for(&program.config, &program.weeks))
    }
}

fn program_not_found(id: Uuid) -> ProgramError {
    ProgramError::NotFound(format!("program {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::RngDice;
    use crate::domain::{Intensity, RepMaxMap};
    use crate::store::tests::setup_test_store;

    fn request(num_lifts: u32, lift_rms: RepMaxMap) -> NewProgram {
        NewProgram {
            name: Some("Winter block".into()),
            athlete_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            num_lifts,
            lift_rms,
            lift_weights: None,
            lift_intensity_rms: None,
            lift_names: None,
            sessions_per_week: None,
            start_date: None,
        }
    }

    fn three_lift_rms() -> RepMaxMap {
        [("upper_body_press", 10), ("upper_body_pull", 10), ("squat", 10)]
            .into_iter()
            .map(|(l, rm)| (l.to_string(), rm))
            .collect()
    }

    async fn service() -> ProgramService {
        ProgramService::new(setup_test_store().await)
    }

    #[tokio::test]
    async fn test_create_program_persists_eight_weeks() {
        let service = service().await;
        let created = service
            .create_program(request(3, three_lift_rms()), &mut RngDice::seeded(1))
            .await
            .unwrap();

        assert_eq!(created.status, ProgramStatus::Draft);
        assert_eq!(created.program_type, ProgramType::Battleship);
        assert_eq!(created.weeks.len(), 8);
        assert_eq!(created.config.weekly_template.key, "3_lifts_3_days");

        let loaded = service.get_program(created.id).await.unwrap();
        assert_eq!(loaded.weeks, created.weeks);
    }

    #[tokio::test]
    async fn test_create_program_invalid_input_stores_nothing() {
        let service = service().await;

        let result = service
            .create_program(request(5, three_lift_rms()), &mut RngDice::seeded(1))
            .await;
        assert!(matches!(result, Err(ProgramError::InvalidConfiguration(_))));

        let mut incomplete = three_lift_rms();
        incomplete.remove("squat");
        let result = service
            .create_program(request(3, incomplete), &mut RngDice::seeded(1))
            .await;
        assert!(matches!(result, Err(ProgramError::InvalidConfiguration(_))));

        assert!(service.list_programs(0, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reroll_changes_only_target() {
        let service = service().await;
        let created = service
            .create_program(request(3, three_lift_rms()), &mut RngDice::seeded(2))
            .await
            .unwrap();

        let updated = service
            .reroll_week(created.id, 3, Some("squat"), &mut RngDice::seeded(3))
            .await
            .unwrap();

        for (before, after) in created.weeks.iter().zip(&updated.weeks) {
            for lift in created.config.lifts() {
                if before.week_number == 3 && lift == "squat" {
                    assert_ne!(before.dice_rolls[lift], after.dice_rolls[lift]);
                } else {
                    assert_eq!(before.dice_rolls[lift], after.dice_rolls[lift]);
                    assert_eq!(before.weekly_data[lift], after.weekly_data[lift]);
                }
            }
        }

        let stored = service.get_program(created.id).await.unwrap();
        assert_eq!(stored.weeks, updated.weeks);
    }

    #[tokio::test]
    async fn test_reroll_errors() {
        let service = service().await;
        let created = service
            .create_program(request(3, three_lift_rms()), &mut RngDice::seeded(4))
            .await
            .unwrap();
        let mut dice = RngDice::seeded(5);

        for week in [0, 9] {
            let result = service.reroll_week(created.id, week, None, &mut dice).await;
            assert!(matches!(result, Err(ProgramError::NotFound(_))));
        }

        let result = service
            .reroll_week(Uuid::new_v4(), 1, None, &mut dice)
            .await;
        assert!(matches!(result, Err(ProgramError::NotFound(_))));

        let result = service
            .reroll_week(created.id, 1, Some("hinge"), &mut dice)
            .await;
        assert!(matches!(result, Err(ProgramError::NotFound(_))));

        let stored = service.get_program(created.id).await.unwrap();
        assert_eq!(stored.weeks, created.weeks);
    }

    #[tokio::test]
    async fn test_breakdown_follows_reroll() {
        let service = service().await;
        let created = service
            .create_program(request(3, three_lift_rms()), &mut RngDice::seeded(6))
            .await
            .unwrap();

        let updated = service
            .reroll_week(created.id, 2, None, &mut RngDice::seeded(7))
            .await
            .unwrap();
        let breakdown = service.breakdown(created.id).await.unwrap();

        let press = &breakdown[&2]["A"]["upper_body_press"];
        assert_eq!(press.intensity, Intensity::High);
        assert_eq!(
            press.total_reps,
            updated.weeks[1].weekly_data["upper_body_press"][&Intensity::High]
        );
    }

    #[tokio::test]
    async fn test_update_program() {
        let service = service().await;
        let created = service
            .create_program(request(4, {
                let mut rms = three_lift_rms();
                rms.insert("hip_hinge".into(), 8);
                rms
            }), &mut RngDice::seeded(8))
            .await
            .unwrap();

        let updated = service
            .update_program(
                created.id,
                ProgramUpdate {
                    name: None,
                    status: Some("completed".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ProgramStatus::Completed);

        let result = service
            .update_program(
                created.id,
                ProgramUpdate {
                    name: None,
                    status: Some("paused".into()),
                },
            )
            .await;
        assert!(matches!(result, Err(ProgramError::InvalidConfiguration(_))));

        let result = service
            .update_program(Uuid::new_v4(), ProgramUpdate::default())
            .await;
        assert!(matches!(result, Err(ProgramError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_program() {
        let service = service().await;
        let created = service
            .create_program(request(3, three_lift_rms()), &mut RngDice::seeded(9))
            .await
            .unwrap();

        service.delete_program(created.id).await.unwrap();
        assert!(matches!(
            service.delete_program(created.id).await,
            Err(ProgramError::NotFound(_))
        ));
        assert!(matches!(
            service.get_program(created.id).await,
            Err(ProgramError::NotFound(_))
        ));
    }
}
