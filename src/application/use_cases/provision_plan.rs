// ============================================================
// PROVISIONING PLAN
// ============================================================
// Ordered steps for provisioning and teardown, built from the layout.
// Pure: building a plan never touches the server.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::error::{AppError, Result};
use crate::domain::provisioning::DatabaseLayout;
use crate::infrastructure::db::statements;
use crate::infrastructure::db::Target;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Statement {
        sql: String,
        /// Carries a credential; the SQL text must not be logged
        sensitive: bool,
    },
    BulkLoad {
        statement: String,
        path: PathBuf,
    },
    /// Close the session's connection to a database
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub target: Target,
    pub action: StepAction,
}

impl Step {
    fn statement(label: impl Into<String>, target: Target, sql: String) -> Self {
        Self {
            label: label.into(),
            target,
            action: StepAction::Statement {
                sql,
                sensitive: false,
            },
        }
    }

    fn sensitive(label: impl Into<String>, target: Target, sql: String) -> Self {
        Self {
            label: label.into(),
            target,
            action: StepAction::Statement {
                sql,
                sensitive: true,
            },
        }
    }

    /// SQL text safe to print, with credentials masked
    pub fn display_sql(&self) -> String {
        match &self.action {
            StepAction::Statement { sensitive: true, .. } => "<redacted>".to_string(),
            StepAction::Statement { sql, .. } => sql.clone(),
            StepAction::BulkLoad { statement, path } => {
                format!("{} <- {}", statement, path.display())
            }
            StepAction::Disconnect => format!("-- disconnect {}", self.target),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub steps: Vec<Step>,
}

impl ProvisionPlan {
    /// Drop the database, then users, then groups
    pub fn teardown(layout: &DatabaseLayout) -> Self {
        let mut steps = vec![Step {
            label: format!("disconnect from {}", layout.database),
            target: Target::Database,
            action: StepAction::Disconnect,
        }];

        steps.push(Step::statement(
            format!("drop database {}", layout.database),
            Target::Maintenance,
            statements::drop_database_if_exists(&layout.database),
        ));
        for user in &layout.users {
            steps.push(Step::statement(
                format!("drop user {}", user.name),
                Target::Maintenance,
                statements::drop_role_if_exists(&user.name),
            ));
        }
        for group in &layout.groups {
            steps.push(Step::statement(
                format!("drop group {}", group.name),
                Target::Maintenance,
                statements::drop_role_if_exists(&group.name),
            ));
        }

        Self { steps }
    }

    /// Full provisioning sequence.
    ///
    /// `passwords` maps each user name to its resolved password.
    pub fn provision(
        layout: &DatabaseLayout,
        csv_path: PathBuf,
        delimiter: u8,
        passwords: &HashMap<String, String>,
    ) -> Result<Self> {
        let db = &layout.database;
        let schema = &layout.schema;
        let mut steps = Vec::new();

        steps.push(Step::statement(
            format!("create database {}", db),
            Target::Maintenance,
            statements::create_database(db),
        ));
        steps.push(Step::statement(
            format!("create schema {}", schema),
            Target::Database,
            statements::create_schema(schema),
        ));
        steps.push(Step::statement(
            format!("create enum type {}", layout.enum_type.name),
            Target::Database,
            statements::create_enum_type(schema, &layout.enum_type),
        ));
        steps.push(Step::statement(
            format!("create table {}", layout.table.name),
            Target::Database,
            statements::create_table(schema, &layout.table),
        ));
        steps.push(Step {
            label: format!("load {} into {}", csv_path.display(), layout.table.name),
            target: Target::Database,
            action: StepAction::BulkLoad {
                statement: statements::copy_from_stdin(schema, &layout.table, delimiter),
                path: csv_path,
            },
        });

        steps.push(Step::statement(
            format!("revoke public access on database {}", db),
            Target::Database,
            statements::revoke_database_from_public(db),
        ));
        steps.push(Step::statement(
            "revoke public access on schema public",
            Target::Database,
            statements::revoke_schema_from_public("public"),
        ));
        steps.push(Step::statement(
            format!("revoke public access on schema {}", schema),
            Target::Database,
            statements::revoke_schema_from_public(schema),
        ));

        for group in &layout.groups {
            steps.push(Step::statement(
                format!("create {} group {}", group.access, group.name),
                Target::Database,
                statements::create_group(&group.name),
            ));
            steps.push(Step::statement(
                format!("grant connect to {}", group.name),
                Target::Database,
                statements::grant_connect(db, &group.name),
            ));
            steps.push(Step::statement(
                format!("grant schema usage to {}", group.name),
                Target::Database,
                statements::grant_schema_usage(schema, &group.name),
            ));
            steps.push(Step::statement(
                format!("grant table privileges to {}", group.name),
                Target::Database,
                statements::grant_table_privileges(schema, &group.name, group.access),
            ));
            steps.push(Step::statement(
                format!("set default privileges for {}", group.name),
                Target::Database,
                statements::alter_default_privileges(schema, &group.name, group.access),
            ));
        }

        for user in &layout.users {
            let password = passwords.get(&user.name).ok_or_else(|| {
                AppError::SecurityError(format!("No password resolved for user '{}'", user.name))
            })?;
            steps.push(Step::sensitive(
                format!("create user {} in {}", user.name, user.group),
                Target::Database,
                statements::create_user(&user.name, password, &user.group),
            ));
        }

        Ok(Self { steps })
    }

    /// Append another plan's steps after this one's
    pub fn then(mut self, other: ProvisionPlan) -> Self {
        self.steps.extend(other.steps);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passwords() -> HashMap<String, String> {
        HashMap::from([
            ("report_reader".to_string(), "r-secret".to_string()),
            ("report_writer".to_string(), "w-secret".to_string()),
        ])
    }

    fn provision(layout: &DatabaseLayout) -> ProvisionPlan {
        ProvisionPlan::provision(layout, PathBuf::from("data.csv"), b',', &passwords()).unwrap()
    }

    fn position(plan: &ProvisionPlan, prefix: &str) -> usize {
        plan.steps
            .iter()
            .position(|s| s.label.starts_with(prefix))
            .unwrap_or_else(|| panic!("no step starting with '{}'", prefix))
    }

    #[test]
    fn test_provision_order() {
        let layout = DatabaseLayout::default();
        let plan = provision(&layout);

        let order = [
            "create database",
            "create schema",
            "create enum type",
            "create table",
            "load data.csv",
            "revoke public access on database",
            "create read-only group",
            "create read-write group",
            "create user report_reader",
            "create user report_writer",
        ];
        let positions: Vec<usize> = order.iter().map(|p| position(&plan, p)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);

        assert_eq!(plan.steps[0].target, Target::Maintenance);
        assert!(plan.steps[1..].iter().all(|s| s.target == Target::Database));
    }

    #[test]
    fn test_every_group_gets_grants_before_users() {
        let layout = DatabaseLayout::default();
        let plan = provision(&layout);

        let first_user = position(&plan, "create user");
        for group in &layout.groups {
            let grant = position(&plan, &format!("grant table privileges to {}", group.name));
            assert!(grant < first_user);
        }

        let rw_grant = plan
            .steps
            .iter()
            .find(|s| s.label == "grant table privileges to readwrite_group")
            .unwrap();
        assert!(rw_grant.display_sql().contains("SELECT, INSERT, UPDATE, DELETE"));
    }

    #[test]
    fn test_user_steps_are_redacted() {
        let layout = DatabaseLayout::default();
        let plan = provision(&layout);

        let user_step = &plan.steps[position(&plan, "create user report_reader")];
        assert_eq!(user_step.display_sql(), "<redacted>");
        match &user_step.action {
            StepAction::Statement { sql, sensitive } => {
                assert!(*sensitive);
                assert!(sql.contains("'r-secret'"));
            }
            other => panic!("unexpected action {:?}", other),
        }
        assert!(plan.steps.iter().all(|s| !s.display_sql().contains("secret")));
    }

    #[test]
    fn test_missing_password_fails() {
        let layout = DatabaseLayout::default();
        let mut pw = passwords();
        pw.remove("report_writer");
        let result = ProvisionPlan::provision(&layout, PathBuf::from("data.csv"), b',', &pw);
        assert!(matches!(result, Err(AppError::SecurityError(_))));
    }

    #[test]
    fn test_teardown_drops_users_before_groups() {
        let layout = DatabaseLayout::default();
        let plan = ProvisionPlan::teardown(&layout);

        assert_eq!(plan.steps[0].action, StepAction::Disconnect);
        assert_eq!(plan.steps[1].display_sql(), "DROP DATABASE IF EXISTS \"city_records\"");
        let last_user = position(&plan, "drop user report_writer");
        let first_group = position(&plan, "drop group");
        assert!(last_user < first_group);
        assert!(plan.steps[1..].iter().all(|s| s.target == Target::Maintenance));
    }

    #[test]
    fn test_recreate_runs_teardown_first() {
        let layout = DatabaseLayout::default();
        let plan = ProvisionPlan::teardown(&layout).then(provision(&layout));
        assert!(position(&plan, "drop group") < position(&plan, "create database"));
    }
}
