use crate::bot::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                offset = %data.config.utc_offset,
                "Bot logged in as {}",
                data_about_bot.user.name
            );
        }
        _ => {}
    }
    Ok(())
}
