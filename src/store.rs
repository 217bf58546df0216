//! SQLite persistence for programs.
//!
//! A program is stored as one `programs` row, one `program_configs` row and
//! eight `program_weeks` rows. Nested structures live in JSON text columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::{Program, ProgramConfig, ProgramStatus, ProgramWeek};
use crate::error::StoreError;

/// Handle to the program database.
#[derive(Debug, Clone)]
pub struct ProgramStore {
    pool: SqlitePool,
}

impl ProgramStore {
    /// Connects to `database_url` and runs pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Inserts a program together with its config and weeks.
    pub async fn create_program(&self, program: &Program) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = program.id.to_string();

        sqlx::query(
            r#"
            INSERT INTO programs
                (id, name, athlete_id, created_by, program_type, status, start_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&program.name)
        .bind(program.athlete_id.to_string())
        .bind(program.created_by.to_string())
        .bind(program.program_type.as_str())
        .bind(program.status.as_str())
        .bind(program.start_date.map(|d| d.to_string()))
        .bind(program.created_at.to_rfc3339())
        .bind(program.updated_at.map(|d| d.to_rfc3339()))
        .execute(&mut *tx)
        .await?;

        let config = &program.config;
        sqlx::query(
            r#"
            INSERT INTO program_configs
                (program_id, num_lifts, lift_rms_json, lift_weights_json,
                 lift_intensity_rms_json, lift_names_json, weekly_template_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(config.num_lifts)
        .bind(serde_json::to_string(&config.lift_rms)?)
        .bind(to_json_opt(&config.lift_weights)?)
        .bind(to_json_opt(&config.lift_intensity_rms)?)
        .bind(to_json_opt(&config.lift_names)?)
        .bind(serde_json::to_string(&config.weekly_template)?)
        .bind(program.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for week in &program.weeks {
            sqlx::query(
                r#"
                INSERT INTO program_weeks
                    (program_id, week_number, dice_roll_1, dice_roll_2,
                     dice_rolls_json, weekly_data_json, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(week.week_number)
            .bind(week.dice_roll_1)
            .bind(week.dice_roll_2)
            .bind(serde_json::to_string(&week.dice_rolls)?)
            .bind(serde_json::to_string(&week.weekly_data)?)
            .bind(program.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(program.id)
    }

    /// Loads a program by id.
    pub async fn get_program(&self, id: Uuid) -> Result<Option<Program>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        load_program(&mut conn, id).await
    }

    /// Lists programs oldest first.
    pub async fn list_programs(&self, skip: u32, limit: u32) -> Result<Vec<Program>, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM programs ORDER BY created_at, id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *conn)
        .await?;

        let mut programs = Vec::with_capacity(ids.len());
        for id in ids {
            let id = parse_uuid("programs.id", &id)?;
            if let Some(program) = load_program(&mut conn, id).await? {
                programs.push(program);
            }
        }
        Ok(programs)
    }

    /// Deletes a program and everything it owns. Returns false if it did not exist.
    pub async fn delete_program(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = id.to_string();

        sqlx::query("DELETE FROM program_weeks WHERE program_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM program_configs WHERE program_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM programs WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Updates the name and/or status of a program. `None` leaves a field as is.
    pub async fn update_program_fields(
        &self,
        id: Uuid,
        name: Option<&str>,
        status: Option<ProgramStatus>,
    ) -> Result<Option<Program>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE programs
            SET name = COALESCE(?, name),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(status.map(|s| s.as_str()))
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let program = load_program(&mut tx, id).await?;
        tx.commit().await?;
        Ok(program)
    }

    /// Read-modify-write of a single week inside one transaction.
    ///
    /// The program row is touched before anything is read, so the transaction
    /// holds the write lock for its whole duration and concurrent calls on the
    /// same database serialize. Nothing is written if `apply` fails. Returns
    /// the updated program, or None if the program or week does not exist.
    pub async fn modify_week<F, E>(
        &self,
        id: Uuid,
        week_number: u32,
        apply: F,
    ) -> Result<Option<Program>, E>
    where
        F: FnOnce(&Program, &mut ProgramWeek) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let touched = sqlx::query("UPDATE programs SET updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let Some(program) = load_program(&mut tx, id).await? else {
            return Ok(None);
        };
        let Some(mut week) = program.week(week_number).cloned() else {
            return Ok(None);
        };

        apply(&program, &mut week)?;

        if !write_week(&mut tx, id, &week).await? {
            return Ok(None);
        }
        let updated = load_program(&mut tx, id).await?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(updated)
    }

    #[cfg(test)]
    pub(crate) async fn close(self) {
        self.pool.close().await;
    }
}

/// Overwrites one week's rolls and volumes. Returns false if no such week row exists.
async fn write_week(
    conn: &mut SqliteConnection,
    id: Uuid,
    week: &ProgramWeek,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE program_weeks
        SET dice_roll_1 = ?,
            dice_roll_2 = ?,
            dice_rolls_json = ?,
            weekly_data_json = ?
        WHERE program_id = ? AND week_number = ?
        "#,
    )
    .bind(week.dice_roll_1)
    .bind(week.dice_roll_2)
    .bind(serde_json::to_string(&week.dice_rolls)?)
    .bind(serde_json::to_string(&week.weekly_data)?)
    .bind(id.to_string())
    .bind(week.week_number)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn load_program(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Program>, StoreError> {
    let key = id.to_string();

    let Some(row) = sqlx::query(
        r#"
        SELECT id, name, athlete_id, created_by, program_type, status,
               start_date, created_at, updated_at
        FROM programs
        WHERE id = ?
        "#,
    )
    .bind(&key)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let config_row = sqlx::query(
        r#"
        SELECT num_lifts, lift_rms_json, lift_weights_json, lift_intensity_rms_json,
               lift_names_json, weekly_template_json
        FROM program_configs
        WHERE program_id = ?
        "#,
    )
    .bind(&key)
    .fetch_one(&mut *conn)
    .await?;

    let week_rows = sqlx::query(
        r#"
        SELECT week_number, dice_roll_1, dice_roll_2, dice_rolls_json, weekly_data_json
        FROM program_weeks
        WHERE program_id = ?
        ORDER BY week_number
        "#,
    )
    .bind(&key)
    .fetch_all(&mut *conn)
    .await?;

    let weeks = week_rows
        .iter()
        .map(week_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let program_type: String = row.try_get("program_type")?;
    let status: String = row.try_get("status")?;
    let start_date: Option<String> = row.try_get("start_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: Option<String> = row.try_get("updated_at")?;

    Ok(Some(Program {
        id,
        name: row.try_get("name")?,
        athlete_id: parse_uuid("programs.athlete_id", &row.try_get::<String, _>("athlete_id")?)?,
        created_by: parse_uuid("programs.created_by", &row.try_get::<String, _>("created_by")?)?,
        program_type: program_type.parse().map_err(|_| StoreError::Corrupt {
            column: "programs.program_type",
            value: program_type.clone(),
        })?,
        status: status.parse().map_err(|_| StoreError::Corrupt {
            column: "programs.status",
            value: status.clone(),
        })?,
        start_date: start_date
            .map(|s| {
                s.parse::<NaiveDate>().map_err(|_| StoreError::Corrupt {
                    column: "programs.start_date",
                    value: s.clone(),
                })
            })
            .transpose()?,
        created_at: parse_time("programs.created_at", &created_at)?,
        updated_at: updated_at
            .map(|s| parse_time("programs.updated_at", &s))
            .transpose()?,
        config: config_from_row(&config_row)?,
        weeks,
    }))
}

fn config_from_row(row: &SqliteRow) -> Result<ProgramConfig, StoreError> {
    let num_lifts: i64 = row.try_get("num_lifts")?;
    Ok(ProgramConfig {
        num_lifts: u32::try_from(num_lifts).map_err(|_| StoreError::Corrupt {
            column: "program_configs.num_lifts",
            value: num_lifts.to_string(),
        })?,
        lift_rms: from_json(row, "lift_rms_json")?,
        lift_weights: from_json_opt(row, "lift_weights_json")?,
        lift_intensity_rms: from_json_opt(row, "lift_intensity_rms_json")?,
        lift_names: from_json_opt(row, "lift_names_json")?,
        weekly_template: from_json(row, "weekly_template_json")?,
    })
}

fn week_from_row(row: &SqliteRow) -> Result<ProgramWeek, StoreError> {
    let week_number: i64 = row.try_get("week_number")?;
    Ok(ProgramWeek {
        week_number: u32::try_from(week_number).map_err(|_| StoreError::Corrupt {
            column: "program_weeks.week_number",
            value: week_number.to_string(),
        })?,
        dice_roll_1: row.try_get("dice_roll_1")?,
        dice_roll_2: row.try_get("dice_roll_2")?,
        dice_rolls: from_json(row, "dice_rolls_json")?,
        weekly_data: from_json(row, "weekly_data_json")?,
    })
}

fn from_json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, StoreError> {
    let raw: String = row.try_get(column)?;
    Ok(serde_json::from_str(&raw)?)
}

fn from_json_opt<T: DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<T>, StoreError> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(StoreError::from)
}

fn to_json_opt<T: Serialize>(value: &Option<T>) -> Result<Option<String>, StoreError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(StoreError::from)
}

fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|_| StoreError::Corrupt {
        column,
        value: value.to_string(),
    })
}

fn parse_time(column: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt {
            column,
            value: value.to_string(),
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dice::RngDice;
    use crate::domain::{Intensity, ProgramType};
    use crate::generator::generate_program;
    use crate::volume::volumes_for;

    /// In-memory database with migrations applied.
    ///
    /// A single connection keeps every query on the same in-memory database.
    pub(crate) async fn setup_test_store() -> ProgramStore {
        ProgramStore::connect("sqlite::memory:", 1)
            .await
            .expect("Failed to create in-memory database")
    }

    pub(crate) fn sample_program(seed: u64) -> Program {
        let lift_rms = [("upper_body_press", 10), ("upper_body_pull", 8), ("squat", 12)]
            .into_iter()
            .map(|(l, rm)| (l.to_string(), rm))
            .collect();
        let generated = generate_program(3, &lift_rms, None, &mut RngDice::seeded(seed))
            .expect("generation should succeed");

        Program {
            id: Uuid::new_v4(),
            name: Some(format!("Block {seed}")),
            athlete_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            program_type: ProgramType::Battleship,
            status: ProgramStatus::Draft,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3),
            created_at: Utc::now(),
            updated_at: None,
            weeks: generated.program_weeks(),
            config: ProgramConfig {
                num_lifts: 3,
                lift_rms: generated.lift_rms,
                lift_weights: None,
                lift_intensity_rms: None,
                lift_names: None,
                weekly_template: generated.template,
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let store = setup_test_store().await;
        let program = sample_program(1);

        let id = store.create_program(&program).await.expect("Should insert");
        assert_eq!(id, program.id);

        let loaded = store
            .get_program(id)
            .await
            .expect("Should query")
            .expect("Should exist");

        assert_eq!(loaded.name, program.name);
        assert_eq!(loaded.athlete_id, program.athlete_id);
        assert_eq!(loaded.status, ProgramStatus::Draft);
        assert_eq!(loaded.start_date, program.start_date);
        assert_eq!(loaded.config, program.config);
        assert_eq!(loaded.weeks, program.weeks);

        store.close().await;
    }

    #[tokio::test]
    async fn test_get_missing_program() {
        let store = setup_test_store().await;
        assert!(store.get_program(Uuid::new_v4()).await.unwrap().is_none());
        store.close().await;
    }

    #[tokio::test]
    async fn test_list_programs_paginates() {
        let store = setup_test_store().await;
        for seed in 0..3 {
            store.create_program(&sample_program(seed)).await.unwrap();
        }

        assert_eq!(store.list_programs(0, 100).await.unwrap().len(), 3);
        assert_eq!(store.list_programs(1, 1).await.unwrap().len(), 1);
        assert!(store.list_programs(5, 10).await.unwrap().is_empty());

        store.close().await;
    }

    #[tokio::test]
    async fn test_delete_program() {
        let store = setup_test_store().await;
        let program = sample_program(2);
        store.create_program(&program).await.unwrap();

        assert!(store.delete_program(program.id).await.unwrap());
        assert!(store.get_program(program.id).await.unwrap().is_none());
        assert!(!store.delete_program(program.id).await.unwrap());

        store.close().await;
    }

    #[tokio::test]
    async fn test_update_program_fields() {
        let store = setup_test_store().await;
        let program = sample_program(3);
        store.create_program(&program).await.unwrap();

        let updated = store
            .update_program_fields(program.id, None, Some(ProgramStatus::Active))
            .await
            .unwrap()
            .expect("Should exist");
        assert_eq!(updated.status, ProgramStatus::Active);
        assert_eq!(updated.name, program.name);
        assert!(updated.updated_at.is_some());

        let renamed = store
            .update_program_fields(program.id, Some("Spring"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Spring"));
        assert_eq!(renamed.status, ProgramStatus::Active);

        assert!(
            store
                .update_program_fields(Uuid::new_v4(), Some("x"), None)
                .await
                .unwrap()
                .is_none()
        );

        store.close().await;
    }

    #[tokio::test]
    async fn test_modify_week_overwrites_only_that_week() {
        let store = setup_test_store().await;
        let program = sample_program(4);
        store.create_program(&program).await.unwrap();

        let pair = crate::dice::RollPair::new(6, 1).unwrap();
        let loaded = store
            .modify_week(program.id, 3, |_, week| {
                week.dice_rolls.insert("squat".into(), pair);
                week.weekly_data.insert("squat".into(), volumes_for(pair));
                Ok::<(), StoreError>(())
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.weeks[2].dice_rolls["squat"], pair);
        assert_eq!(loaded.weeks[2].weekly_data["squat"][&Intensity::Low], 77);
        assert_eq!(loaded.weeks[1], program.weeks[1]);
        assert!(loaded.updated_at.is_some());

        let reloaded = store.get_program(program.id).await.unwrap().unwrap();
        assert_eq!(reloaded.weeks, loaded.weeks);

        store.close().await;
    }

    #[tokio::test]
    async fn test_write_week_reports_whether_a_row_changed() {
        let store = setup_test_store().await;
        let program = sample_program(6);
        store.create_program(&program).await.unwrap();

        let mut week = program.weeks[0].clone();
        let pair = crate::dice::RollPair::new(2, 4).unwrap();
        week.dice_rolls.insert("squat".into(), pair);

        let mut conn = store.pool.acquire().await.unwrap();
        assert!(write_week(&mut conn, program.id, &week).await.unwrap());

        let mut missing = week.clone();
        missing.week_number = 9;
        assert!(!write_week(&mut conn, program.id, &missing).await.unwrap());
        assert!(!write_week(&mut conn, Uuid::new_v4(), &week).await.unwrap());
        drop(conn);

        let loaded = store.get_program(program.id).await.unwrap().unwrap();
        assert_eq!(loaded.weeks[0].dice_rolls["squat"], pair);
        assert_eq!(loaded.weeks.len(), 8);

        store.close().await;
    }

    #[tokio::test]
    async fn test_modify_week_rolls_back_on_error() {
        let store = setup_test_store().await;
        let program = sample_program(5);
        store.create_program(&program).await.unwrap();

        let result: Result<Option<Program>, crate::error::ProgramError> = store
            .modify_week(program.id, 1, |_, week| {
                week.dice_rolls.clear();
                Err(crate::error::ProgramError::NotFound("lift".into()))
            })
            .await;
        assert!(result.is_err());

        let loaded = store.get_program(program.id).await.unwrap().unwrap();
        assert_eq!(loaded.weeks, program.weeks);
        assert_eq!(loaded.updated_at, None);

        store.close().await;
    }

    #[tokio::test]
    async fn test_modify_week_missing_targets() {
        let store = setup_test_store().await;
        let program = sample_program(6);
        store.create_program(&program).await.unwrap();

        let missing_program: Result<_, StoreError> =
            store.modify_week(Uuid::new_v4(), 1, |_, _| Ok(())).await;
        assert!(missing_program.unwrap().is_none());

        let missing_week: Result<_, StoreError> =
            store.modify_week(program.id, 9, |_, _| Ok(())).await;
        assert!(missing_week.unwrap().is_none());

        store.close().await;
    }
}
