use std::collections::HashMap;
use std::io::BufRead;

use serde::Serialize;
use tracing::{info, warn};

use super::args::{ConfigArgs, ProfileArgs, ProvisionArgs, StorePasswordArgs, VerifyArgs};
use crate::application::{ProfileColumnsUseCase, ProvisionPlan, Provisioner};
use crate::domain::error::{AppError, Result};
use crate::domain::profile::SizingPolicy;
use crate::domain::provisioning::DatabaseLayout;
use crate::infrastructure::config::ProvisionConfig;
use crate::infrastructure::csv::ColumnProfiler;
use crate::infrastructure::db::catalog::{CatalogVerifier, VerificationReport};
use crate::infrastructure::db::session::PgSession;
use crate::infrastructure::db::Target;
use crate::infrastructure::security::credentials::{resolve_password, store_in_keychain};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::ParseError(format!("Failed to serialize report: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn load_config(args: &ConfigArgs) -> Result<ProvisionConfig> {
    ProvisionConfig::load(args.config.as_deref())
}

pub fn profile(args: ProfileArgs) -> Result<()> {
    if !args.delimiter.is_ascii() {
        return Err(AppError::ValidationError(format!(
            "Delimiter '{}' is not a single-byte ASCII character",
            args.delimiter
        )));
    }

    let policy = SizingPolicy {
        enum_cardinality_threshold: args.enum_threshold,
        text_headroom_factor: args.headroom,
    };
    let profiler = ColumnProfiler::new().with_delimiter(args.delimiter as u8);
    let report = ProfileColumnsUseCase::new(profiler, policy).execute(&args.file, &args.columns)?;

    if args.json {
        return print_json(&report);
    }

    println!("{}", report.summary());
    Ok(())
}

/// Resolve every user's password before anything is created
fn resolve_user_passwords(layout: &DatabaseLayout) -> Result<HashMap<String, String>> {
    layout
        .users
        .iter()
        .map(|u| resolve_password(&u.password_ref).map(|pw| (u.name.clone(), pw)))
        .collect()
}

pub async fn provision(args: ProvisionArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let layout = &config.layout;

    if !config.source.csv_path.exists() {
        return Err(AppError::FileAccess(format!(
            "Source file {} does not exist",
            config.source.csv_path.display()
        )));
    }

    let passwords = resolve_user_passwords(layout)?;
    let mut plan = ProvisionPlan::provision(
        layout,
        config.source.csv_path.clone(),
        config.source.delimiter_byte()?,
        &passwords,
    )?;
    if args.recreate || config.provision.recreate {
        warn!(
            database = %layout.database,
            "Recreate requested, existing artifacts will be dropped"
        );
        plan = ProvisionPlan::teardown(layout).then(plan);
    }

    if args.dry_run {
        for (index, step) in plan.steps.iter().enumerate() {
            println!("-- {}. {} [{}]", index + 1, step.label, step.target);
            println!("{};", step.display_sql());
        }
        return Ok(());
    }

    let session = PgSession::new(config.connection.clone(), &layout.database)?;
    let mut provisioner = Provisioner::new(session);
    let outcome = provisioner.run(&plan).await;

    let report = match outcome {
        Ok(summary) => {
            info!(
                steps = summary.steps_run,
                rows_loaded = summary.rows_loaded,
                "Provisioning finished"
            );
            verify_with(provisioner.session_mut(), &config).await
        }
        Err(err) => Err(err),
    };

    provisioner.session_mut().close().await;
    print_report(&report?, layout, args.json)
}

pub async fn verify(args: VerifyArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let mut session = PgSession::new(config.connection.clone(), &config.layout.database)?;

    let report = verify_with(&mut session, &config).await;
    session.close().await;
    print_report(&report?, &config.layout, args.json)
}

async fn verify_with(
    session: &mut PgSession,
    config: &ProvisionConfig,
) -> Result<VerificationReport> {
    let pool = session.pool(Target::Database).await?;
    CatalogVerifier::new(pool)
        .verify(&config.layout, config.provision.sample_rows)
        .await
}

fn print_report(report: &VerificationReport, layout: &DatabaseLayout, json: bool) -> Result<()> {
    let missing = report.missing_roles(layout);
    if !missing.is_empty() {
        warn!(missing = ?missing, "Roles missing from pg_roles");
    }

    if json {
        print_json(report)
    } else {
        println!("{}", report.summary());
        Ok(())
    }
}

pub async fn teardown(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args)?;
    let plan = ProvisionPlan::teardown(&config.layout);

    let session = PgSession::new(config.connection.clone(), &config.layout.database)?;
    let mut provisioner = Provisioner::new(session);
    let outcome = provisioner.run(&plan).await;
    provisioner.session_mut().close().await;

    let summary = outcome?;
    println!(
        "Dropped database {} and {} roles ({} steps)",
        config.layout.database,
        config.layout.role_names().len(),
        summary.steps_run
    );
    Ok(())
}

pub fn store_password(args: StorePasswordArgs) -> Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AppError::ValidationError(
            "Empty password on stdin".to_string(),
        ));
    }

    store_in_keychain(&args.key, password)?;
    println!("Stored; reference it as keychain:{}", args.key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provisioning::UserSpec;

    #[test]
    fn test_resolve_user_passwords() {
        let mut layout = DatabaseLayout::default();
        layout.users = vec![UserSpec {
            name: "report_reader".to_string(),
            group: "readonly_group".to_string(),
            password_ref: "plain:pw".to_string(),
        }];

        let passwords = resolve_user_passwords(&layout).unwrap();
        assert_eq!(passwords.get("report_reader").map(String::as_str), Some("pw"));
    }

    #[test]
    fn test_resolve_user_passwords_fails_fast() {
        let mut layout = DatabaseLayout::default();
        layout.users[0].password_ref = "env:PGPROVISION_TEST_NEVER_SET_9913".to_string();
        assert!(matches!(
            resolve_user_passwords(&layout),
            Err(AppError::SecurityError(_))
        ));
    }
}
