// ============================================================
// PROVISIONER USE CASE
// ============================================================
// Run a plan strictly in order; the first failure aborts the run

use std::time::Instant;

use tracing::{debug, error, info};

use super::provision_plan::{ProvisionPlan, StepAction};
use crate::domain::error::Result;
use crate::infrastructure::db::SqlSession;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps_run: usize,
    pub rows_loaded: u64,
    pub elapsed_ms: u64,
}

pub struct Provisioner<S: SqlSession> {
    session: S,
}

impl<S: SqlSession> Provisioner<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub async fn run(&mut self, plan: &ProvisionPlan) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::default();
        let total = plan.steps.len();

        for (index, step) in plan.steps.iter().enumerate() {
            info!(step = index + 1, total, db = %step.target, "{}", step.label);
            debug!(sql = %step.display_sql(), "Executing");

            let outcome = match &step.action {
                StepAction::Statement { sql, .. } => self.session.execute(step.target, sql).await,
                StepAction::BulkLoad { statement, path } => {
                    let loaded = self.session.copy_in(step.target, statement, path).await;
                    if let Ok(rows) = loaded {
                        info!(rows, path = %path.display(), "Bulk load finished");
                        summary.rows_loaded += rows;
                    }
                    loaded
                }
                StepAction::Disconnect => {
                    self.session.disconnect(step.target).await;
                    Ok(0)
                }
            };

            if let Err(err) = outcome {
                error!(
                    step = index + 1,
                    label = %step.label,
                    error = %err,
                    "Provisioning step failed"
                );
                return Err(err);
            }
            summary.steps_run += 1;
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            steps = summary.steps_run,
            rows_loaded = summary.rows_loaded,
            elapsed_ms = summary.elapsed_ms,
            "Plan finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::provisioning::DatabaseLayout;
    use crate::infrastructure::db::Target;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct RecordingSession {
        calls: Vec<String>,
        fail_on: Option<String>,
        copy_rows: u64,
    }

    impl RecordingSession {
        fn check(&self, text: &str) -> Result<()> {
            match &self.fail_on {
                Some(pattern) if text.contains(pattern.as_str()) => Err(AppError::DatabaseError(
                    format!("Statement failed: {} already exists", pattern),
                )),
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl SqlSession for RecordingSession {
        async fn execute(&mut self, target: Target, sql: &str) -> Result<u64> {
            self.calls.push(format!("{}: {}", target, sql));
            self.check(sql)?;
            Ok(0)
        }

        async fn copy_in(&mut self, target: Target, statement: &str, path: &Path) -> Result<u64> {
            self.calls
                .push(format!("{}: {} <- {}", target, statement, path.display()));
            self.check(statement)?;
            Ok(self.copy_rows)
        }

        async fn disconnect(&mut self, target: Target) {
            self.calls.push(format!("disconnect {}", target));
        }
    }

    fn plan() -> ProvisionPlan {
        let passwords = HashMap::from([
            ("report_reader".to_string(), "r".to_string()),
            ("report_writer".to_string(), "w".to_string()),
        ]);
        ProvisionPlan::provision(
            &DatabaseLayout::default(),
            PathBuf::from("incidents.csv"),
            b',',
            &passwords,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_runs_every_step_in_order() {
        let plan = plan();
        let mut provisioner = Provisioner::new(RecordingSession {
            copy_rows: 42,
            ..Default::default()
        });

        let summary = provisioner.run(&plan).await.unwrap();
        assert_eq!(summary.steps_run, plan.steps.len());
        assert_eq!(summary.rows_loaded, 42);

        let calls = &provisioner.session_mut().calls;
        assert_eq!(calls.len(), plan.steps.len());
        assert_eq!(calls[0], "maintenance: CREATE DATABASE \"city_records\"");
        assert!(calls[4].starts_with("database: COPY \"incidents\".\"incident_reports\""));
        assert!(calls[4].ends_with("<- incidents.csv"));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let plan = plan();
        let mut provisioner = Provisioner::new(RecordingSession {
            fail_on: Some("CREATE SCHEMA".to_string()),
            ..Default::default()
        });

        let result = provisioner.run(&plan).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));

        let calls = &provisioner.session_mut().calls;
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| !c.contains("CREATE TABLE")));
    }

    #[tokio::test]
    async fn test_teardown_disconnects_before_dropping() {
        let plan = ProvisionPlan::teardown(&DatabaseLayout::default());
        let mut provisioner = Provisioner::new(RecordingSession::default());

        provisioner.run(&plan).await.unwrap();
        let calls = &provisioner.session_mut().calls;
        assert_eq!(calls[0], "disconnect database");
        assert_eq!(calls[1], "maintenance: DROP DATABASE IF EXISTS \"city_records\"");
        assert_eq!(calls.last().unwrap(), "maintenance: DROP ROLE IF EXISTS \"readwrite_group\"");
    }
}
