//! Dispatcher schema: commands, playlist documents, direct links

use lazy_regex::regex_find;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{FileId, Message, ParseMode};
use tunecore::relay::notice::START_BANNER;
use tunecore::{ConversationId, MessageRef, PlaylistUpload, RequestRunner, TrackRequest};
use url::Url;

use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub runner: RequestRunner,
}

impl HandlerDeps {
    pub fn new(runner: RequestRunner) -> Self {
        Self { runner }
    }
}

/// Sentence punctuation that ends a link in chat text rather than belonging to it
const TRAILING_PUNCTUATION: [char; 5] = ['.', ',', ';', ')', ']'];

/// First `http(s)://` link in a message text, if it parses as a URL.
///
/// # Example
///
/// ```
/// use tunebot::telegram::extract_first_url;
///
/// let url = extract_first_url("listen: https://a.example/x.mp3 and http://b.example/y.mp3").unwrap();
/// assert_eq!(url.as_str(), "https://a.example/x.mp3");
/// assert!(extract_first_url("no links here").is_none());
/// ```
pub fn extract_first_url(text: &str) -> Option<Url> {
    regex_find!(r"https?://[^\s]+", text)
        .map(|raw| raw.trim_end_matches(TRAILING_PUNCTUATION))
        .and_then(|raw| Url::parse(raw).ok())
}

/// Creates the dispatcher schema for the bot.
///
/// Commands come first so `/start <link>` is answered with the banner.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_documents = deps.clone();
    let deps_links = deps;

    dptree::entry()
        .branch(command_handler())
        .branch(document_handler(deps_documents))
        .branch(link_handler(deps_links))
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        |bot: Bot, msg: Message, cmd: Command| async move {
            log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

            match cmd {
                Command::Start | Command::Help => {
                    bot.send_message(msg.chat.id, START_BANNER)
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
            }
            Ok(())
        },
    ))
}

/// Any document is treated as a playlist file.
fn document_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.document().map(|doc| doc.file.id.clone()))
        .endpoint(move |msg: Message, file_id: FileId| {
            let deps = deps.clone();
            async move {
                log::info!("📁 Playlist document from chat {}", msg.chat.id);
                deps.runner.spawn_playlist(PlaylistUpload {
                    conversation: ConversationId(msg.chat.id.0),
                    file_id: file_id.0,
                    message: Some(MessageRef(msg.id.0)),
                });
                Ok(())
            }
        })
}

/// Text messages carrying a link start a track request for the first link.
fn link_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().and_then(extract_first_url))
        .endpoint(move |msg: Message, url: Url| {
            let deps = deps.clone();
            async move {
                log::info!("🔗 Link from chat {} ({})", msg.chat.id, url.host_str().unwrap_or("<no host>"));
                deps.runner.spawn_track(TrackRequest {
                    url,
                    conversation: ConversationId(msg.chat.id.0),
                    message: Some(MessageRef(msg.id.0)),
                });
                Ok(())
            }
        })
}
