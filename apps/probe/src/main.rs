//! accessgate probe: resolves the authorization view of one user in one tenant.

#![forbid(unsafe_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use accessgate_application::AuthorizationSession;
use accessgate_core::{AppError, AppResult, SessionContext, TenantId, UserId};
use accessgate_domain::{AccessDecision, AuthorizationView, Permission, PermissionDescriptor};
use accessgate_infrastructure::{PostgresAccessStore, TracingErrorReporter};

use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct ProbeConfig {
    database_url: String,
    user_id: Option<UserId>,
    tenant_id: Option<TenantId>,
    max_connections: u32,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    context: SessionContext,
    view: AuthorizationView,
    decisions: Vec<PermissionDecision>,
    catalog: Vec<PermissionDescriptor>,
}

#[derive(Debug, Serialize)]
struct PermissionDecision {
    permission: Permission,
    decision: AccessDecision,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ProbeConfig::load()?;
    let pool = connect_pool(config.database_url.as_str(), config.max_connections).await?;
    let session = AuthorizationSession::new(
        Arc::new(PostgresAccessStore::new(pool)),
        Arc::new(TracingErrorReporter::new()),
    );
    let context = SessionContext::new(config.user_id, config.tenant_id);

    info!(
        user_id = ?config.user_id,
        tenant_id = ?config.tenant_id,
        "accessgate-probe resolving authorization view"
    );

    session.switch_context(context).await;
    let view = session.settled_view().await;

    info!(
        is_admin = view.is_admin(),
        permission_count = view.permissions().len(),
        "authorization view settled"
    );

    let report = ProbeReport {
        context,
        decisions: Permission::all()
            .iter()
            .map(|permission| PermissionDecision {
                permission: *permission,
                decision: view.decide(*permission),
            })
            .collect(),
        view,
        catalog: Permission::catalog(),
    };

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| AppError::Internal(format!("failed to render probe report: {error}")))?;
    println!("{rendered}");

    Ok(())
}

async fn connect_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

impl ProbeConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let user_id = optional_env("PROBE_USER_ID")
            .map(|value| UserId::from_str(value.as_str()))
            .transpose()?;
        let tenant_id = optional_env("PROBE_TENANT_ID")
            .map(|value| TenantId::from_str(value.as_str()))
            .transpose()?;
        let max_connections = parse_env_u32("PROBE_DB_MAX_CONNECTIONS", 5)?;

        if max_connections == 0 {
            return Err(AppError::Validation(
                "PROBE_DB_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            user_id,
            tenant_id,
            max_connections,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match optional_env(name) {
        Some(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("{name} must be a valid u32: {error}"))
        }),
        None => Ok(default),
    }
}
