use crate::bot::{Context, Error, admin_check, say_error};
use crate::database::models::NewSite;
use crate::database::queries;
use crate::utils::format::{create_info_embed, format_sites, format_success_message};
use crate::utils::validation::validate_site;

/// Lista las ubicaciones registradas (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn sitios(ctx: Context<'_>) -> Result<(), Error> {
    match queries::list_sites(&ctx.data().pool).await {
        Ok(sites) => {
            let embed = create_info_embed("📍 Ubicaciones", &format_sites(&sites));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            tracing::error!("Failed to list sites: {:?}", e);
            say_error(ctx, "No se pudieron cargar las ubicaciones.").await?;
        }
    }
    Ok(())
}

/// Añade una ubicación (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn sitio_agregar(
    ctx: Context<'_>,
    #[description = "Nombre"] nombre: String,
    #[description = "Latitud"] latitud: f64,
    #[description = "Longitud"] longitud: f64,
    #[description = "Radio permitido en metros (por defecto 100)"] radio: Option<f64>,
) -> Result<(), Error> {
    let site = NewSite {
        name: nombre.trim().to_string(),
        latitude: latitud,
        longitude: longitud,
        radius_meters: radio.unwrap_or(100.0),
    };

    if let Err(e) = validate_site(&site) {
        return say_error(ctx, &e.to_string()).await;
    }

    match queries::create_site(&ctx.data().pool, &site).await {
        Ok(created) => {
            tracing::info!(site_id = created.id, name = %created.name, "Site created");
            ctx.say(format_success_message(&format!(
                "Ubicación #{} «{}» creada (radio {:.0}m)",
                created.id, created.name, created.radius_meters
            )))
            .await?;
        }
        Err(e) => {
            tracing::error!("Failed to create site: {:?}", e);
            say_error(ctx, "No se pudo crear la ubicación.").await?;
        }
    }
    Ok(())
}

/// Modifica una ubicación (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn sitio_editar(
    ctx: Context<'_>,
    #[description = "Número de ubicación"] sitio: i64,
    #[description = "Nuevo nombre"] nombre: Option<String>,
    #[description = "Nueva latitud"] latitud: Option<f64>,
    #[description = "Nueva longitud"] longitud: Option<f64>,
    #[description = "Nuevo radio en metros"] radio: Option<f64>,
) -> Result<(), Error> {
    let pool = &ctx.data().pool;

    let existing = match queries::get_site_by_id(pool, sitio).await? {
        Some(site) => site,
        None => return say_error(ctx, &format!("No existe la ubicación #{}", sitio)).await,
    };

    let site = NewSite {
        name: nombre.map(|n| n.trim().to_string()).unwrap_or(existing.name),
        latitude: latitud.unwrap_or(existing.latitude),
        longitude: longitud.unwrap_or(existing.longitude),
        radius_meters: radio.unwrap_or(existing.radius_meters),
    };

    if let Err(e) = validate_site(&site) {
        return say_error(ctx, &e.to_string()).await;
    }

    if queries::update_site(pool, sitio, &site).await? {
        tracing::info!(site_id = sitio, "Site updated");
        ctx.say(format_success_message(&format!("Ubicación #{} actualizada", sitio)))
            .await?;
    } else {
        say_error(ctx, &format!("No existe la ubicación #{}", sitio)).await?;
    }
    Ok(())
}

/// Elimina una ubicación (administradores)
#[poise::command(slash_command, check = "admin_check")]
pub async fn sitio_eliminar(
    ctx: Context<'_>,
    #[description = "Número de ubicación"] sitio: i64,
) -> Result<(), Error> {
    if queries::delete_site(&ctx.data().pool, sitio).await? {
        tracing::info!(site_id = sitio, "Site deleted");
        ctx.say(format_success_message(&format!("Ubicación #{} eliminada", sitio)))
            .await?;
    } else {
        say_error(ctx, &format!("No existe la ubicación #{}", sitio)).await?;
    }
    Ok(())
}
