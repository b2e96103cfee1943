use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tunecore::config;

use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "explain what I can do")]
    Help,
}

/// Creates the bot from `BOT_TOKEN`, honouring a custom `BOT_API_URL`
///
/// # Returns
/// * `Ok(Bot)` - Configured bot
/// * `Err` - Token missing, HTTP client or API URL invalid
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }

    let client = ClientBuilder::new()
        .timeout(config::network::bot_api_timeout())
        .build()?;
    let bot = Bot::with_client(token, client);

    let bot = match config::BOT_API_URL.as_deref() {
        Some(raw) => {
            log::info!("Using custom Bot API URL: {}", raw);
            let url = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
