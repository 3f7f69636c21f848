use std::sync::Arc;

use anyhow::Context;

use storekeep_api::config::{AppConfig, DEFAULT_SEED_ADMIN_USERNAME, ServiceKind};
use storekeep_auth::{PasswordHasher, roles};
use storekeep_infra::{IdentityStore, InMemoryIdentityStore, PostgresIdentityStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments use the environment.
    let _ = dotenvy::dotenv();
    storekeep_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let store = identity_store(&config).await?;

    let app = storekeep_api::app::build_app(&config, store).context("failed to build app")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        services = ?config.services.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
/// The identity service seeds a super-admin so a fresh install can log in.
async fn identity_store(config: &AppConfig) -> anyhow::Result<Arc<dyn IdentityStore>> {
    let seeds = config.hosts(ServiceKind::Identity);

    if let Some(url) = &config.database_url {
        let store = PostgresIdentityStore::connect(url)
            .await
            .context("failed to connect to identity database")?;
        if seeds {
            store.ensure_schema().await?;
            let hash = hash_seed_password(config).await?;
            store
                .seed_user(
                    DEFAULT_SEED_ADMIN_USERNAME,
                    "Super Admin",
                    &hash,
                    &roles::SUPER_ADMIN,
                    &roles::default_role_permissions(roles::SUPER_ADMIN.as_str()),
                )
                .await?;
        }
        return Ok(Arc::new(store));
    }

    if !seeds {
        return Ok(Arc::new(InMemoryIdentityStore::new()));
    }

    tracing::warn!("DATABASE_URL not set; using in-memory identity store with a seeded super-admin");
    let hash = hash_seed_password(config).await?;
    let (store, _) = InMemoryIdentityStore::with_super_admin(DEFAULT_SEED_ADMIN_USERNAME, hash)?;
    Ok(Arc::new(store))
}

async fn hash_seed_password(config: &AppConfig) -> anyhow::Result<String> {
    let hasher = PasswordHasher::new(config.auth.bcrypt_cost)?;
    let password = config.seed_admin_password.clone();
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
    Ok(hash)
}
