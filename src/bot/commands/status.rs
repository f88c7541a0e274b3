use crate::bot::{Context, Error, current_user, say_error};
use crate::utils::format::create_status_embed;
use crate::utils::time::{current_date, parse_date_string};

/// Muestra tus registros de asistencia del día
#[poise::command(slash_command)]
pub async fn estado(
    ctx: Context<'_>,
    #[description = "Fecha (AAAA-MM-DD), por defecto hoy"] fecha: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let offset = data.attendance.offset();

    let date = match fecha.as_deref().map(parse_date_string).transpose() {
        Ok(date) => date.unwrap_or_else(|| current_date(offset)),
        Err(e) => return say_error(ctx, &e.to_string()).await,
    };

    let user = match current_user(ctx).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to load user: {:?}", e);
            return say_error(ctx, "No se pudo obtener la información del usuario.").await;
        }
    };

    let shifts = match data.attendance.shifts_for_user(user.id, date).await {
        Ok(shifts) => shifts,
        Err(e) => return say_error(ctx, &e.user_message()).await,
    };

    let context = match data.attendance.load_schedule_context().await {
        Ok(context) => context,
        Err(e) => return say_error(ctx, &e.user_message()).await,
    };

    let embed = create_status_embed(&user.display_name(), date, &shifts, &context, offset);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
