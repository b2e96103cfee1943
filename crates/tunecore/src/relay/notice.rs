//! User-visible text catalog. All texts are HTML.

use crate::core::config;
use crate::core::utils::{escape_html, human_size};
use crate::download::error::RequestError;

/// Greeting shown for `/start` and `/help`.
pub const START_BANNER: &str = "Hello! I am tunerelay, a playlist decoder and media relay bot.

📁 Send a <b>playlist file</b> to me and I will send you a list of links preserved in the file.

🌐 You can even send me a <b>link to MP3</b> and I will upload it to you via Telegram!";

pub const DOWNLOAD_ERROR: &str = "⚠️ Unable to download this file";

pub const PARSE_FAILURE: &str =
    "⚠️ Sorry, I am unable to parse this file correctly. No links were found in it.";

pub const LENGTH_UNKNOWN: &str = "⚠️ Server didn't send the Content-Length header, so I can't determine the filesize and download this file";

pub const UPLOADING: &str = "☁️ Uploading to Telegram…";

/// Longest text sent in one message (Telegram allows 4096, with margin)
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Locators longer than this are shortened in the playlist listing
const MAX_LISTED_URL_CHARS: usize = 700;

const PLAYLIST_HEADER: &str = "Found URLs:\n\n";

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars).collect();
    shortened.push('…');
    shortened
}

/// Builders for texts that carry a value.
pub struct Notice;

impl Notice {
    /// Progress line. An empty `progress` gives the initial status text.
    pub fn downloading(progress: &str) -> String {
        format!("⬇️ Downloading… {}", progress)
    }

    pub fn bad_status(code: u16) -> String {
        format!(
            "❗️ Resource returned HTTP {} code. Maybe link in the playlist is broken or outdated?",
            code
        )
    }

    pub fn too_large(limit: u64) -> String {
        format!(
            "🍉 File is bigger than {}. Telegram <b>does not</b> allow me to upload huge files, sorry.",
            human_size(limit)
        )
    }

    /// The single message sent for a failed request.
    pub fn for_failure(err: &RequestError) -> String {
        match err {
            RequestError::BadStatus(code) => Self::bad_status(*code),
            RequestError::LengthUnknown => LENGTH_UNKNOWN.to_string(),
            RequestError::TooLarge { limit, .. } => Self::too_large(*limit),
            RequestError::ParseFailure => PARSE_FAILURE.to_string(),
            RequestError::Unreachable(_) | RequestError::Unreadable(_) | RequestError::DeliveryFailure(_) => {
                DOWNLOAD_ERROR.to_string()
            }
        }
    }

    /// Enumerated playlist reply: every locator followed by a blank line, then the count.
    ///
    /// Split into pages of at most `MAX_MESSAGE_LENGTH` characters at locator
    /// boundaries; only the last page carries the total. A single very long
    /// locator is shortened.
    ///
    /// # Example
    ///
    /// ```
    /// use tunecore::relay::Notice;
    ///
    /// let pages = Notice::playlist(&["http://a/1.mp3".to_string()]);
    /// assert_eq!(pages, vec!["Found URLs:\n\nhttp://a/1.mp3\n\nTotal: 1\n".to_string()]);
    /// ```
    pub fn playlist(urls: &[String]) -> Vec<String> {
        let footer = format!("Total: {}\n", urls.len());
        let mut pages = Vec::new();
        let mut page = String::from(PLAYLIST_HEADER);
        let mut page_chars = PLAYLIST_HEADER.chars().count();
        let mut page_has_entries = false;

        for url in urls {
            let entry = format!("{}\n\n", escape_html(&shorten(url, MAX_LISTED_URL_CHARS)));
            let entry_chars = entry.chars().count();
            if page_has_entries && page_chars + entry_chars > MAX_MESSAGE_LENGTH {
                pages.push(std::mem::take(&mut page));
                page_chars = 0;
            }
            page.push_str(&entry);
            page_chars += entry_chars;
            page_has_entries = true;
        }

        if page_chars + footer.chars().count() > MAX_MESSAGE_LENGTH {
            pages.push(std::mem::take(&mut page));
        }
        page.push_str(&footer);
        pages.push(page);
        pages
    }

    /// Too-large text for the configured ceiling.
    pub fn too_large_default() -> String {
        Self::too_large(config::limits::MAX_FILE_SIZE_BYTES)
    }
}
