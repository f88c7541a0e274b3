pub mod commands;
pub mod handlers;

use crate::config::Config;
use crate::database;
use crate::database::models::{User, UserRole};
use crate::database::queries;
use crate::utils::attendance_manager::AttendanceManager;
use crate::utils::format::format_error_message;
use sqlx::SqlitePool;
use std::sync::Arc;
use anyhow::Result;
use poise::serenity_prelude as serenity;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Clone)]
pub struct Data {
    pub pool: SqlitePool,
    pub config: Config,
    pub attendance: Arc<AttendanceManager>,
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;

    // Explicit startup step instead of creating the schedule on first read
    let schedule = queries::load_or_create_schedule_config(&pool).await?;
    tracing::info!(work_days = %schedule.work_days_to_string(), entry = %schedule.entry_time, "Schedule configuration loaded");

    let data = Data {
        attendance: Arc::new(AttendanceManager::new(pool.clone(), config.utc_offset)),
        pool,
        config: config.clone(),
    };

    let intents = serenity::GatewayIntents::non_privileged();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::attendance::entrada(),
                commands::attendance::salida(),
                commands::status::estado(),
                commands::notes::nota(),
                commands::notes::justificar(),
                commands::reports::diario(),
                commands::sites::sitios(),
                commands::sites::sitio_agregar(),
                commands::sites::sitio_editar(),
                commands::sites::sitio_eliminar(),
                commands::schedule::horario(),
                commands::schedule::horario_editar(),
                commands::schedule::horario_sitio(),
                commands::profile::perfil(),
                commands::profile::rol(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}

/// Looks up (or creates) the stored user behind the invoking Discord account.
pub async fn current_user(ctx: Context<'_>) -> Result<User, Error> {
    let author = ctx.author();
    let user = queries::create_or_get_user(&ctx.data().pool, &author.id.to_string(), &author.name).await?;
    Ok(user)
}

pub async fn say_error(ctx: Context<'_>, message: &str) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(format_error_message(message))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Command check: Discord admin role or stored `admin` role.
pub async fn admin_check(ctx: Context<'_>) -> Result<bool, Error> {
    let admin_role = ctx
        .data()
        .config
        .admin_role_id
        .as_deref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(serenity::RoleId::new);

    if let Some(role_id) = admin_role {
        if let Some(member) = ctx.author_member().await {
            if member.roles.contains(&role_id) {
                return Ok(true);
            }
        }
    }

    let user = current_user(ctx).await?;
    if user.role == UserRole::Admin {
        return Ok(true);
    }

    tracing::info!(user_id = user.id, command = %ctx.command().name, "Admin command refused");
    say_error(ctx, "Esta acción requiere permisos de administrador.").await?;
    Ok(false)
}
