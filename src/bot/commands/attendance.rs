use crate::bot::{Context, Error, current_user, say_error};
use crate::database::models::RecordType;
use crate::error::AttendanceError;
use crate::utils::format::{format_punch_receipt, format_success_message};
use crate::utils::geolocation::{acquire_position, position_from_arguments};
use chrono::Utc;

/// Registra tu entrada
#[poise::command(slash_command)]
pub async fn entrada(
    ctx: Context<'_>,
    #[description = "Latitud de tu ubicación actual"] latitud: Option<f64>,
    #[description = "Longitud de tu ubicación actual"] longitud: Option<f64>,
    #[description = "Precisión GPS en metros"] precision: Option<f64>,
    #[description = "Nota opcional"] nota: Option<String>,
) -> Result<(), Error> {
    punch(ctx, RecordType::Entrada, latitud, longitud, precision, nota).await
}

/// Registra tu salida
#[poise::command(slash_command)]
pub async fn salida(
    ctx: Context<'_>,
    #[description = "Latitud de tu ubicación actual"] latitud: Option<f64>,
    #[description = "Longitud de tu ubicación actual"] longitud: Option<f64>,
    #[description = "Precisión GPS en metros"] precision: Option<f64>,
    #[description = "Nota opcional"] nota: Option<String>,
) -> Result<(), Error> {
    punch(ctx, RecordType::Salida, latitud, longitud, precision, nota).await
}

async fn punch(
    ctx: Context<'_>,
    record_type: RecordType,
    latitud: Option<f64>,
    longitud: Option<f64>,
    precision: Option<f64>,
    nota: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();

    let user = match current_user(ctx).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to load user: {:?}", e);
            return say_error(ctx, "No se pudo obtener la información del usuario.").await;
        }
    };

    let position = match acquire_position(
        position_from_arguments(latitud, longitud, precision),
        data.config.geolocation_timeout,
    )
    .await
    {
        Ok(position) => position,
        Err(failure) => {
            let err = AttendanceError::from(failure);
            return say_error(ctx, &format!("Error al obtener ubicación: {}", err.user_message())).await;
        }
    };

    match data
        .attendance
        .register_attendance(user.id, record_type, position, nota.as_deref(), Utc::now())
        .await
    {
        Ok(receipt) => {
            let msg = format_success_message(&format_punch_receipt(&receipt, data.attendance.offset()));
            ctx.say(msg).await?;
        }
        Err(e) => {
            if let AttendanceError::BackendUnavailable(source) = &e {
                tracing::error!(user_id = user.id, "Backend failure on punch: {:?}", source);
            }
            say_error(ctx, &e.user_message()).await?;
        }
    }

    Ok(())
}
