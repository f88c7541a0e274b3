use crate::bot::{Context, Error, admin_check, say_error};
use crate::database::models::ScheduleConfig;
use crate::database::queries;
use crate::utils::format::{create_info_embed, format_schedule, format_success_message};
use crate::utils::status::site_schedule;
use crate::utils::validation::parse_schedule;

/// Muestra el horario general o el de una ubicación
#[poise::command(slash_command)]
pub async fn horario(
    ctx: Context<'_>,
    #[description = "Número de ubicación (opcional)"] sitio: Option<i64>,
) -> Result<(), Error> {
    let pool = &ctx.data().pool;

    let global = queries::load_or_create_schedule_config(pool).await?;

    let (title, schedule) = match sitio {
        Some(site_id) => match queries::get_site_by_id(pool, site_id).await? {
            Some(site) => {
                let title = if site.schedule_config.is_some() {
                    format!("🕘 Horario de {}", site.name)
                } else {
                    format!("🕘 Horario de {} (general)", site.name)
                };
                (title, site_schedule(&site, &global).clone())
            }
            None => return say_error(ctx, &format!("No existe la ubicación #{}", site_id)).await,
        },
        None => ("🕘 Horario general".to_string(), global),
    };

    let embed = create_info_embed(&title, &format_schedule(&schedule));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn merge_schedule(
    base: &ScheduleConfig,
    dias: Option<String>,
    entrada: Option<String>,
    salida: Option<String>,
    tolerancia: Option<i64>,
) -> anyhow::Result<ScheduleConfig> {
    parse_schedule(
        &dias.unwrap_or_else(|| base.work_days_to_string()),
        &entrada.unwrap_or_else(|| base.entry_time.format("%H:%M").to_string()),
        &salida.unwrap_or_else(|| base.exit_time.format("%H:%M").to_string()),
        tolerancia.unwrap_or(i64::from(base.tolerance_minutes)),
    )
}

/// Modifica el horario general (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn horario_editar(
    ctx: Context<'_>,
    #[description = "Días laborables, 0=domingo .. 6=sábado (ej. 1,2,3,4,5)"] dias: Option<String>,
    #[description = "Hora de entrada (HH:MM)"] entrada: Option<String>,
    #[description = "Hora de salida (HH:MM)"] salida: Option<String>,
    #[description = "Tolerancia en minutos"] tolerancia: Option<i64>,
) -> Result<(), Error> {
    let pool = &ctx.data().pool;
    let current = queries::load_or_create_schedule_config(pool).await?;

    let updated = match merge_schedule(&current, dias, entrada, salida, tolerancia) {
        Ok(schedule) => schedule,
        Err(e) => return say_error(ctx, &e.to_string()).await,
    };

    queries::save_schedule_config(pool, &updated).await?;
    tracing::info!(work_days = %updated.work_days_to_string(), "Global schedule updated");

    ctx.say(format_success_message(&format!(
        "Configuración actualizada correctamente\n{}",
        format_schedule(&updated)
    )))
    .await?;
    Ok(())
}

/// Define o quita el horario propio de una ubicación (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn horario_sitio(
    ctx: Context<'_>,
    #[description = "Número de ubicación"] sitio: i64,
    #[description = "Días laborables, 0=domingo .. 6=sábado"] dias: Option<String>,
    #[description = "Hora de entrada (HH:MM)"] entrada: Option<String>,
    #[description = "Hora de salida (HH:MM)"] salida: Option<String>,
    #[description = "Tolerancia en minutos"] tolerancia: Option<i64>,
    #[description = "Quitar el horario propio y usar el general"] quitar: Option<bool>,
) -> Result<(), Error> {
    let pool = &ctx.data().pool;

    let site = match queries::get_site_by_id(pool, sitio).await? {
        Some(site) => site,
        None => return say_error(ctx, &format!("No existe la ubicación #{}", sitio)).await,
    };

    if quitar.unwrap_or(false) {
        queries::update_site_schedule(pool, sitio, None).await?;
        tracing::info!(site_id = sitio, "Site schedule override removed");
        ctx.say(format_success_message(&format!(
            "{} vuelve a usar el horario general",
            site.name
        )))
        .await?;
        return Ok(());
    }

    let global = queries::load_or_create_schedule_config(pool).await?;
    let base = site_schedule(&site, &global);
    let updated = match merge_schedule(base, dias, entrada, salida, tolerancia) {
        Ok(schedule) => schedule,
        Err(e) => return say_error(ctx, &e.to_string()).await,
    };

    queries::update_site_schedule(pool, sitio, Some(&updated)).await?;
    tracing::info!(site_id = sitio, "Site schedule override saved");

    ctx.say(format_success_message(&format!(
        "Horario de {} actualizado\n{}",
        site.name,
        format_schedule(&updated)
    )))
    .await?;
    Ok(())
}
