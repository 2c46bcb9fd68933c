use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{Assignment, Scenario, Section, Worker, WorkerMetrics};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::store::Store;
use crate::error::EngineError;

/// `sqlx`-backed `Store`, in the idiom of the teacher's
/// `PgJobRepository`: `sqlx::query_as!` for typed reads, a single
/// `UNNEST`-based bulk insert for `append_assignments`, and
/// `#[tracing::instrument(skip(self))]` on every method.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self))]
    async fn list_active_workers(&self) -> Result<Vec<Worker>, EngineError> {
        let workers = sqlx::query_as!(
            Worker,
            r#"
            SELECT
                id, name, initials, birth_year, category,
                state AS "state: _",
                areas AS "areas: _",
                days_assigned AS "days_assigned: _",
                avoid_days AS "avoid_days: _",
                ooo_days AS "ooo_days: _",
                available_work_hours, available_guard_hours, fte_pct,
                regular_workdays AS "regular_workdays: _",
                created_at, updated_at
            FROM workers
            WHERE state = 'ACTIVE'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(workers)
    }

    #[tracing::instrument(skip(self))]
    async fn list_sections(&self) -> Result<Vec<Section>, EngineError> {
        let sections = sqlx::query_as!(
            Section,
            r#"
            SELECT
                id, name, hours,
                days AS "days: _",
                personal, libra,
                fechas AS "fechas: _",
                is_night
            FROM sections
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sections)
    }

    #[tracing::instrument(skip(self))]
    async fn list_holidays(&self, year: i32) -> Result<HashSet<NaiveDate>, EngineError> {
        let rows = sqlx::query!(
            r#"SELECT holiday_date FROM holidays WHERE EXTRACT(YEAR FROM holiday_date) = $1"#,
            year as f64,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.holiday_date).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_yearly_assignments(&self, year: i32) -> Result<Vec<Assignment>, EngineError> {
        let rows = sqlx::query!(
            r#"
            SELECT
                a.id, a.scenario_id, a.date, a.day_of_week,
                a.section_name, a.worker_id, a.worker_name,
                a.hours, a.libra, a.is_holiday, a.is_weekend, a.period_tag, a.copy_ix
            FROM assignments a
            WHERE EXTRACT(YEAR FROM a.date) = $1
            ORDER BY a.date
            "#,
            year as f64,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Assignment {
                id: r.id,
                scenario_id: r.scenario_id,
                date: r.date,
                day_of_week: shared::types::weekday_from_code(&r.day_of_week),
                section_name: r.section_name,
                worker_id: r.worker_id,
                worker_name: r.worker_name,
                hours: r.hours,
                libra: r.libra,
                is_holiday: r.is_holiday,
                is_weekend: r.is_weekend,
                period_tag: r.period_tag,
                copy_ix: r.copy_ix,
            })
            .collect())
    }

    #[tracing::instrument(skip(self, settings))]
    async fn create_scenario(
        &self,
        name: &str,
        created_by: &str,
        year: i32,
        description: &str,
        settings: serde_json::Value,
    ) -> Result<Uuid, EngineError> {
        let row = sqlx::query!(
            r#"
            INSERT INTO scenarios (name, created_by, year, status, description, settings_blob)
            VALUES ($1, $2, $3, 'DRAFT', $4, $5)
            RETURNING id
            "#,
            name,
            created_by,
            year,
            description,
            settings,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.id)
    }

    #[tracing::instrument(skip(self, assignments))]
    async fn append_assignments(&self, scenario_id: Uuid, assignments: &[Assignment]) -> Result<(), EngineError> {
        if assignments.is_empty() {
            return Ok(());
        }

        let scenario_ids: Vec<Uuid> = vec![scenario_id; assignments.len()];
        let dates: Vec<NaiveDate> = assignments.iter().map(|a| a.date).collect();
        let days_of_week: Vec<String> = assignments
            .iter()
            .map(|a| shared::types::weekday_code(a.day_of_week).to_string())
            .collect();
        let section_names: Vec<String> = assignments.iter().map(|a| a.section_name.clone()).collect();
        let worker_ids: Vec<Uuid> = assignments.iter().map(|a| a.worker_id).collect();
        let worker_names: Vec<String> = assignments.iter().map(|a| a.worker_name.clone()).collect();
        let hours: Vec<f64> = assignments.iter().map(|a| a.hours).collect();
        let libras: Vec<bool> = assignments.iter().map(|a| a.libra).collect();
        let holidays: Vec<bool> = assignments.iter().map(|a| a.is_holiday).collect();
        let weekends: Vec<bool> = assignments.iter().map(|a| a.is_weekend).collect();
        let period_tags: Vec<String> = assignments.iter().map(|a| a.period_tag.clone()).collect();
        let copy_ixs: Vec<i32> = assignments.iter().map(|a| a.copy_ix).collect();

        sqlx::query(
            r#"
            INSERT INTO assignments
                (scenario_id, date, day_of_week, section_name, worker_id, worker_name, hours, libra, is_holiday, is_weekend, period_tag, copy_ix)
            SELECT * FROM UNNEST(
                $1::uuid[], $2::date[], $3::text[], $4::text[], $5::uuid[], $6::text[],
                $7::float8[], $8::bool[], $9::bool[], $10::bool[], $11::text[], $12::int4[]
            )
            ON CONFLICT (scenario_id, date, section_name, copy_ix) DO NOTHING
            "#,
        )
        .bind(&scenario_ids)
        .bind(&dates)
        .bind(&days_of_week)
        .bind(&section_names)
        .bind(&worker_ids)
        .bind(&worker_names)
        .bind(&hours)
        .bind(&libras)
        .bind(&holidays)
        .bind(&weekends)
        .bind(&period_tags)
        .bind(&copy_ixs)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, metrics))]
    async fn write_metrics(&self, scenario_id: Uuid, metrics: &[WorkerMetrics]) -> Result<(), EngineError> {
        for m in metrics {
            sqlx::query!(
                r#"
                INSERT INTO scenario_metrics
                    (scenario_id, worker_id,
                     period_total_shifts, period_total_hours, period_night_shifts, period_weekend_shifts, period_holiday_shifts,
                     yearly_total_shifts, yearly_total_hours, yearly_night_shifts, yearly_weekend_shifts, yearly_holiday_shifts)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
                scenario_id,
                m.worker_id,
                m.period.total_shifts as i32,
                m.period.total_hours,
                m.period.night_shifts as i32,
                m.period.weekend_shifts as i32,
                m.period.holiday_shifts as i32,
                m.yearly.total_shifts as i32,
                m.yearly.total_hours,
                m.yearly.night_shifts as i32,
                m.yearly.weekend_shifts as i32,
                m.yearly.holiday_shifts as i32,
            )
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_incomplete(&self, scenario_id: Uuid) -> Result<(), EngineError> {
        sqlx::query!(
            r#"UPDATE scenarios SET description = description || ' [incomplete]' WHERE id = $1"#,
            scenario_id,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn publish(&self, scenario_id: Uuid) -> Result<(), EngineError> {
        sqlx::query!(
            r#"UPDATE scenarios SET status = 'PUBLISHED' WHERE id = $1 AND status = 'DRAFT'"#,
            scenario_id,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn archive(&self, scenario_id: Uuid) -> Result<(), EngineError> {
        sqlx::query!(
            r#"UPDATE scenarios SET status = 'ARCHIVED' WHERE id = $1 AND status = 'PUBLISHED'"#,
            scenario_id,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn clone_scenario(&self, scenario_id: Uuid, new_name: &str) -> Result<Uuid, EngineError> {
        let row = sqlx::query!(
            r#"
            INSERT INTO scenarios (name, created_by, year, status, description, settings_blob)
            SELECT $2, created_by, year, 'DRAFT', description, settings_blob
            FROM scenarios WHERE id = $1
            RETURNING id
            "#,
            scenario_id,
            new_name,
        )
        .fetch_one(&self.pool)
        .await?;

        let assignments = self.get_assignments(scenario_id).await?;
        self.append_assignments(row.id, &assignments).await?;

        Ok(row.id)
    }

    #[tracing::instrument(skip(self))]
    async fn get_scenario(&self, scenario_id: Uuid) -> Result<Option<Scenario>, EngineError> {
        let scenario = sqlx::query_as!(
            Scenario,
            r#"
            SELECT id, name, created_by, created_at, year,
                status AS "status: _",
                description,
                settings_blob AS "settings_blob: _"
            FROM scenarios WHERE id = $1
            "#,
            scenario_id,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(scenario)
    }

    #[tracing::instrument(skip(self))]
    async fn get_assignments(&self, scenario_id: Uuid) -> Result<Vec<Assignment>, EngineError> {
        let rows = sqlx::query!(
            r#"
            SELECT
                id, scenario_id, date, day_of_week,
                section_name, worker_id, worker_name,
                hours, libra, is_holiday, is_weekend, period_tag, copy_ix
            FROM assignments
            WHERE scenario_id = $1
            ORDER BY date, section_name, copy_ix
            "#,
            scenario_id,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Assignment {
                id: r.id,
                scenario_id: r.scenario_id,
                date: r.date,
                day_of_week: shared::types::weekday_from_code(&r.day_of_week),
                section_name: r.section_name,
                worker_id: r.worker_id,
                worker_name: r.worker_name,
                hours: r.hours,
                libra: r.libra,
                is_holiday: r.is_holiday,
                is_weekend: r.is_weekend,
                period_tag: r.period_tag,
                copy_ix: r.copy_ix,
            })
            .collect())
    }
}
