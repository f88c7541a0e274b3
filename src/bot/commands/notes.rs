use crate::bot::{Context, Error, admin_check, current_user, say_error};
use crate::utils::format::format_success_message;

/// Añade o borra la nota de uno de tus registros
#[poise::command(slash_command)]
pub async fn nota(
    ctx: Context<'_>,
    #[description = "Número de registro"] registro: i64,
    #[description = "Texto de la nota (vacío para borrarla)"] texto: Option<String>,
) -> Result<(), Error> {
    let user = current_user(ctx).await?;

    match ctx
        .data()
        .attendance
        .update_note(registro, user.id, texto.as_deref())
        .await
    {
        Ok(record) => {
            let msg = match record.note {
                Some(_) => format!("Nota guardada en el registro #{}", record.id),
                None => format!("Nota eliminada del registro #{}", record.id),
            };
            ctx.say(format_success_message(&msg)).await?;
        }
        Err(e) => say_error(ctx, &e.user_message()).await?,
    }

    Ok(())
}

/// Justifica un registro de asistencia (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn justificar(
    ctx: Context<'_>,
    #[description = "Número de registro"] registro: i64,
    #[description = "Justificación (vacío para quitarla)"] texto: Option<String>,
) -> Result<(), Error> {
    match ctx
        .data()
        .attendance
        .update_justification(registro, texto.as_deref())
        .await
    {
        Ok(record) => {
            let msg = match record.justification {
                Some(_) => format!("Registro #{} justificado", record.id),
                None => format!("Justificación eliminada del registro #{}", record.id),
            };
            ctx.say(format_success_message(&msg)).await?;
        }
        Err(e) => say_error(ctx, &e.user_message()).await?,
    }

    Ok(())
}
