use crate::bot::{Context, Error, admin_check, say_error};
use crate::database::queries;
use crate::utils::format::create_day_report_embeds;
use crate::utils::time::{current_date, parse_date_string};

/// Asistencia de todos los empleados en un día (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn diario(
    ctx: Context<'_>,
    #[description = "Fecha (AAAA-MM-DD), por defecto hoy"] fecha: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let offset = data.attendance.offset();

    let date = match fecha.as_deref().map(parse_date_string).transpose() {
        Ok(date) => date.unwrap_or_else(|| current_date(offset)),
        Err(e) => return say_error(ctx, &e.to_string()).await,
    };

    let groups = match data.attendance.shifts_for_day(date).await {
        Ok(groups) => groups,
        Err(e) => return say_error(ctx, &e.user_message()).await,
    };

    let context = match data.attendance.load_schedule_context().await {
        Ok(context) => context,
        Err(e) => return say_error(ctx, &e.user_message()).await,
    };

    let mut employees = Vec::with_capacity(groups.len());
    for group in groups {
        let name = match queries::get_user_by_id(&data.pool, group.user_id).await {
            Ok(user) => user.display_name(),
            Err(e) => {
                tracing::warn!(user_id = group.user_id, "Could not load user for report: {:?}", e);
                format!("Usuario {}", group.user_id)
            }
        };
        employees.push((name, group.shifts));
    }

    // One page per message: the size cap covers all embeds of a message
    for embed in create_day_report_embeds(date, &employees, &context, offset) {
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
    }

    Ok(())
}
