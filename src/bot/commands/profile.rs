use crate::bot::{Context, Error, admin_check, current_user, say_error};
use crate::database::models::UserRole;
use crate::database::queries;
use crate::utils::format::format_success_message;
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RoleChoice {
    #[name = "empleado"]
    Employee,
    #[name = "administrador"]
    Admin,
}

impl From<RoleChoice> for UserRole {
    fn from(choice: RoleChoice) -> Self {
        match choice {
            RoleChoice::Employee => UserRole::Employee,
            RoleChoice::Admin => UserRole::Admin,
        }
    }
}

/// Actualiza tu nombre y correo
#[poise::command(slash_command)]
pub async fn perfil(
    ctx: Context<'_>,
    #[description = "Nombre"] nombre: String,
    #[description = "Apellido"] apellido: String,
    #[description = "Correo electrónico"] email: Option<String>,
) -> Result<(), Error> {
    let (nombre, apellido) = (nombre.trim(), apellido.trim());
    if nombre.is_empty() || apellido.is_empty() {
        return say_error(ctx, "El nombre y el apellido son obligatorios.").await;
    }

    let user = current_user(ctx).await?;
    let email = email.as_deref().map(str::trim).filter(|e| !e.is_empty());

    queries::update_user_profile(&ctx.data().pool, user.id, nombre, apellido, email).await?;
    ctx.say(format_success_message(&format!("Perfil actualizado: {} {}", nombre, apellido)))
        .await?;
    Ok(())
}

/// Cambia el rol de un usuario (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn rol(
    ctx: Context<'_>,
    #[description = "Usuario"] usuario: serenity::User,
    #[description = "Rol a asignar"] tipo: RoleChoice,
) -> Result<(), Error> {
    let pool = &ctx.data().pool;
    let target = queries::create_or_get_user(pool, &usuario.id.to_string(), &usuario.name).await?;
    let role = UserRole::from(tipo);

    queries::set_user_role(pool, target.id, role).await?;
    tracing::info!(user_id = target.id, role = role.as_str(), "User role changed");

    ctx.say(format_success_message(&format!(
        "{} ahora tiene el rol {}",
        target.display_name(),
        role.as_str()
    )))
    .await?;
    Ok(())
}
