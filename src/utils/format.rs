use crate::database::models::{AttendanceRecord, ScheduleConfig, Site};
use crate::utils::attendance_manager::{PunchReceipt, ScheduleContext};
use crate::utils::shift_pairing::Shift;
use crate::utils::status::classify_record;
use crate::utils::time::{format_datetime, format_hours, format_time};
use chrono::{FixedOffset, NaiveDate};
use poise::serenity_prelude as serenity;

const WEEKDAY_NAMES: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

pub fn format_punch_receipt(receipt: &PunchReceipt, offset: FixedOffset) -> String {
    let record = &receipt.record;
    let mut msg = format!(
        "Se ha registrado tu {} correctamente ({}).\n• Ubicación: {}\n• Distancia: {}m",
        record.record_type.as_str(),
        format_datetime(record.timestamp, offset),
        receipt.site_name,
        receipt.accepted_distance
    );
    if let Some(accuracy) = record.location.accuracy {
        msg.push_str(&format!("\n• Precisión GPS: ±{:.0}m", accuracy));
    }
    msg
}

fn format_record_line(label: &str, record: &AttendanceRecord, offset: FixedOffset) -> String {
    let mut line = format!(
        "{} {} (#{}, {} {}m)",
        label,
        format_time(record.timestamp, offset),
        record.id,
        record.location.nearest_site_name,
        record.location.distance_to_site_meters
    );
    if let Some(note) = &record.note {
        line.push_str(&format!("\n      📝 Nota: {}", note));
    }
    line
}

/// Shift-by-shift summary of one user's day.
pub fn format_shifts(shifts: &[Shift], context: &ScheduleContext, offset: FixedOffset) -> String {
    if shifts.is_empty() {
        return "No hay registros para este día".to_string();
    }

    let mut text = String::new();
    let mut total_hours = 0.0;

    for (i, shift) in shifts.iter().enumerate() {
        let (_, shown) = classify_record(&shift.entrada, &context.sites, &context.schedule, offset);

        text.push_str(&format!(
            "**#{}** {} {}\n",
            i + 1,
            shown.emoji(),
            shown.label()
        ));
        text.push_str(&format!(
            "   {}\n",
            format_record_line("🟢 **Entrada**:", &shift.entrada, offset)
        ));

        match &shift.salida {
            Some(salida) => {
                text.push_str(&format!(
                    "   {}\n",
                    format_record_line("🔴 **Salida**:", salida, offset)
                ));
                if let Some(hours) = shift.duration_hours() {
                    total_hours += hours;
                    text.push_str(&format!("   ⏱️ Horas: {}\n", format_hours(hours)));
                }
            }
            None => text.push_str("   ⚠️ **En curso**\n"),
        }

        if let Some(justification) = &shift.entrada.justification {
            text.push_str(&format!("   📎 Justificación: {}\n", justification));
        }
        text.push('\n');
    }

    if total_hours > 0.0 {
        text.push_str(&format!("📊 **Total trabajado**: {}", format_hours(total_hours)));
    }

    text
}

pub fn format_sites(sites: &[Site]) -> String {
    if sites.is_empty() {
        return "No hay ubicaciones registradas".to_string();
    }

    sites
        .iter()
        .map(|site| {
            let schedule = if site.schedule_config.is_some() {
                " · horario propio"
            } else {
                ""
            };
            format!(
                "**#{} {}** ({:.6}, {:.6}) · radio {:.0}m{}",
                site.id, site.name, site.latitude, site.longitude, site.radius_meters, schedule
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_schedule(schedule: &ScheduleConfig) -> String {
    let days = schedule
        .work_days
        .iter()
        .filter_map(|d| WEEKDAY_NAMES.get(*d as usize).copied())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "• Días laborables: {}\n• Entrada: {}\n• Salida: {}\n• Tolerancia: {} minutos",
        if days.is_empty() { "ninguno".to_string() } else { days },
        schedule.entry_time.format("%H:%M"),
        schedule.exit_time.format("%H:%M"),
        schedule.tolerance_minutes
    )
}

pub fn format_error_message(error: &str) -> String {
    format!("❌ **Error**: {}", error)
}

pub fn format_success_message(message: &str) -> String {
    format!("✅ {}", message)
}

// Embed utility functions
pub fn create_info_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    let mut description = description.to_string();
    truncate_chars(&mut description, DESCRIPTION_LIMIT);
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0x3498db) // Blue
        .timestamp(chrono::Utc::now())
}

pub fn create_status_embed(
    username: &str,
    date: NaiveDate,
    shifts: &[Shift],
    context: &ScheduleContext,
    offset: FixedOffset,
) -> serenity::CreateEmbed {
    let mut status_text = format_shifts(shifts, context, offset);
    truncate_chars(&mut status_text, DESCRIPTION_LIMIT);
    serenity::CreateEmbed::new()
        .title("📊 Registro de asistencia")
        .description(status_text)
        .color(0x3498db) // Blue
        .author(serenity::CreateEmbedAuthor::new(format!("Asistencia de {}", username)))
        .footer(serenity::CreateEmbedFooter::new(date.format("%d/%m/%Y").to_string()))
        .timestamp(chrono::Utc::now())
}

// Discord embed limits, counted in characters
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_NAME_LIMIT: usize = 256;
const FIELD_VALUE_LIMIT: usize = 1024;
const MAX_FIELDS: usize = 25;
const EMBED_TOTAL_LIMIT: usize = 6000;
/// Room kept for the report title and footer.
const REPORT_HEADER_BUDGET: usize = 200;

fn truncate_chars(text: &mut String, limit: usize) {
    if text.chars().count() <= limit {
        return;
    }
    let cut = text
        .char_indices()
        .nth(limit - 2)
        .map_or(text.len(), |(i, _)| i);
    text.truncate(cut);
    text.push_str("\n…");
}

/// Splits the day report into pages of (name, value) fields, each page
/// small enough for a single embed.
pub fn paginate_day_report(
    employees: &[(String, Vec<Shift>)],
    context: &ScheduleContext,
    offset: FixedOffset,
) -> Vec<Vec<(String, String)>> {
    let budget = EMBED_TOTAL_LIMIT - REPORT_HEADER_BUDGET;
    let mut pages = Vec::new();
    let mut page: Vec<(String, String)> = Vec::new();
    let mut used = 0;

    for (name, shifts) in employees {
        let mut name = name.clone();
        truncate_chars(&mut name, FIELD_NAME_LIMIT);
        let mut value = format_shifts(shifts, context, offset);
        truncate_chars(&mut value, FIELD_VALUE_LIMIT);

        let size = name.chars().count() + value.chars().count();
        if !page.is_empty() && (page.len() == MAX_FIELDS || used + size > budget) {
            pages.push(std::mem::take(&mut page));
            used = 0;
        }
        used += size;
        page.push((name, value));
    }

    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

/// One embed per report page; each is sent as its own message.
pub fn create_day_report_embeds(
    date: NaiveDate,
    employees: &[(String, Vec<Shift>)],
    context: &ScheduleContext,
    offset: FixedOffset,
) -> Vec<serenity::CreateEmbed> {
    let base = || {
        serenity::CreateEmbed::new()
            .color(0x9b59b6) // Purple
            .footer(serenity::CreateEmbedFooter::new(date.format("%d/%m/%Y").to_string()))
            .timestamp(chrono::Utc::now())
    };

    let pages = paginate_day_report(employees, context, offset);
    if pages.is_empty() {
        return vec![
            base()
                .title("📅 Panel de Administración")
                .description("No hay registros para este día"),
        ];
    }

    let total = pages.len();
    pages
        .into_iter()
        .enumerate()
        .map(|(i, fields)| {
            let title = if total > 1 {
                format!("📅 Panel de Administración ({}/{})", i + 1, total)
            } else {
                "📅 Panel de Administración".to_string()
            };
            fields
                .into_iter()
                .fold(base().title(title), |embed, (name, value)| {
                    embed.field(name, value, false)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::RecordType;
    use crate::utils::record_validator::tests::record;
    use crate::utils::shift_pairing::pair_shifts;
    use chrono::{TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn context() -> ScheduleContext {
        ScheduleContext {
            sites: Vec::new(),
            schedule: ScheduleConfig::default(),
        }
    }

    #[test]
    fn open_shift_is_reported_in_progress() {
        let entrada = record(1, RecordType::Entrada, Utc.with_ymd_and_hms(2024, 3, 4, 9, 20, 0).unwrap());
        let text = format_shifts(&pair_shifts(&[entrada]), &context(), utc());
        assert!(text.contains("En curso"));
        assert!(text.contains("Tarde"));
        assert!(!text.contains("Total trabajado"));
    }

    #[test]
    fn closed_shift_shows_hours_and_justification() {
        let mut entrada = record(1, RecordType::Entrada, Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap());
        entrada.justification = Some("Médico".to_string());
        let salida = record(2, RecordType::Salida, Utc.with_ymd_and_hms(2024, 3, 4, 15, 30, 0).unwrap());

        let text = format_shifts(&pair_shifts(&[entrada, salida]), &context(), utc());
        assert!(text.contains("Justificado"));
        assert!(text.contains("Médico"));
        assert!(text.contains("4.50 h"));
    }

    #[test]
    fn schedule_lists_day_names() {
        let text = format_schedule(&ScheduleConfig::default());
        assert!(text.contains("Lunes, Martes, Miércoles, Jueves, Viernes"));
        assert!(text.contains("09:00"));
        assert!(text.contains("15 minutos"));
    }

    fn busy_day(n: usize) -> Vec<(String, Vec<Shift>)> {
        (0..n)
            .map(|i| {
                let mut records = Vec::new();
                for (k, (from, to)) in [(9, 13), (14, 18)].into_iter().enumerate() {
                    let mut entrada = record(
                        (i * 4 + k * 2) as i64,
                        RecordType::Entrada,
                        Utc.with_ymd_and_hms(2024, 3, 4, from, 20, 0).unwrap(),
                    );
                    entrada.note = Some("Reunión con el cliente en la sede central".to_string());
                    let mut salida = record(
                        (i * 4 + k * 2 + 1) as i64,
                        RecordType::Salida,
                        Utc.with_ymd_and_hms(2024, 3, 4, to, 0, 0).unwrap(),
                    );
                    salida.note = Some("Salida registrada desde el almacén".to_string());
                    records.push(entrada);
                    records.push(salida);
                }
                (format!("Empleado Número {}", i + 1), pair_shifts(&records))
            })
            .collect()
    }

    #[test]
    fn busy_day_report_is_split_within_embed_limits() {
        let employees = busy_day(30);
        let pages = paginate_day_report(&employees, &context(), utc());

        assert!(pages.len() > 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 30);
        for page in &pages {
            assert!(page.len() <= MAX_FIELDS);
            let size: usize = page
                .iter()
                .map(|(name, value)| name.chars().count() + value.chars().count())
                .sum();
            assert!(size + REPORT_HEADER_BUDGET <= EMBED_TOTAL_LIMIT);
            for (name, value) in page {
                assert!(name.chars().count() <= FIELD_NAME_LIMIT);
                assert!(value.chars().count() <= FIELD_VALUE_LIMIT);
            }
        }

        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let embeds = create_day_report_embeds(date, &employees, &context(), utc());
        assert_eq!(embeds.len(), pages.len());
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let mut text = "ñ".repeat(5000);
        truncate_chars(&mut text, DESCRIPTION_LIMIT);
        assert_eq!(text.chars().count(), DESCRIPTION_LIMIT);
        assert!(text.ends_with('…'));

        let mut short = "corto".to_string();
        truncate_chars(&mut short, FIELD_VALUE_LIMIT);
        assert_eq!(short, "corto");
    }
}
