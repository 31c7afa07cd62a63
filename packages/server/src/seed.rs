use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::entity::{company, user};
use crate::policy::Actor;
use crate::state::AppState;
use crate::store::{CompanyData, LogoInput};
use crate::utils::hash;

/// Seed the admin account and, on an empty directory, demo companies.
pub async fn run(state: &AppState) -> Result<()> {
    let admin = ensure_admin(&state.db, &state.config.seed).await?;
    seed_demo_companies(state, &admin).await
}

/// Create the configured admin user unless a user with that email exists.
pub async fn ensure_admin(db: &DatabaseConnection, seed: &SeedConfig) -> Result<user::Model> {
    if let Some(existing) = user::Entity::find()
        .filter(user::Column::Email.eq(seed.admin_email.as_str()))
        .one(db)
        .await?
    {
        if !existing.is_admin {
            tracing::warn!(
                email = %seed.admin_email,
                "Seed admin email belongs to a non-admin user"
            );
        }
        return Ok(existing);
    }

    let password = hash::hash_password(&seed.admin_password)
        .map_err(|e| anyhow!("Password hash error: {e}"))?;

    let admin = user::ActiveModel {
        name: Set(seed.admin_name.clone()),
        email: Set(seed.admin_email.clone()),
        password: Set(password),
        is_admin: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = admin.id, email = %admin.email, "Seeded admin user");
    Ok(admin)
}

async fn seed_demo_companies(state: &AppState, admin: &user::Model) -> Result<()> {
    let count = state.config.seed.demo_companies;
    if count == 0 || company::Entity::find().count(&state.db).await? > 0 {
        return Ok(());
    }

    let store = state.companies();
    let actor = Actor {
        id: admin.id,
        is_admin: admin.is_admin,
    };
    for i in 1..=count {
        store
            .create(
                &actor,
                CompanyData {
                    name: format!("Demo Company {i}"),
                    email: Some(format!("contact@demo-company-{i}.test")),
                    website: Some(format!("https://demo-company-{i}.test")),
                    logo: Some(LogoInput::Url(format!(
                        "https://picsum.photos/seed/{}/100/100",
                        Uuid::new_v4()
                    ))),
                },
            )
            .await?;
    }

    info!(count, "Seeded demo companies");
    Ok(())
}
