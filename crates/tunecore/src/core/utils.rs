use rand::Rng;

/// Characters used for scratch file suffixes: uppercase ASCII letters and digits.
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random part of scratch file names.
pub const SUFFIX_LEN: usize = 12;

/// Unit scale for [`human_size`], largest first.
const SIZE_UNITS: &[(u64, &str)] = &[
    (1 << 50, " PB"),
    (1 << 40, " TB"),
    (1 << 30, " GB"),
    (1 << 20, " MB"),
    (1 << 10, " KB"),
];

/// Generates a random suffix of uppercase letters and digits.
///
/// Uniqueness is probabilistic (36^12 space); collisions are not detected.
///
/// # Example
///
/// ```
/// use tunecore::core::utils::random_suffix;
///
/// let suffix = random_suffix(12);
/// assert_eq!(suffix.len(), 12);
/// ```
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Renders a byte count on a binary scale with integer division.
///
/// Below 1 KB the value is spelled out in bytes (`1 byte`, `512 bytes`).
///
/// # Example
///
/// ```
/// use tunecore::core::utils::human_size;
///
/// assert_eq!(human_size(1_000_000), "976 KB");
/// assert_eq!(human_size(50 * 1024 * 1024), "50 MB");
/// ```
pub fn human_size(bytes: u64) -> String {
    for &(factor, suffix) in SIZE_UNITS {
        if bytes >= factor {
            return format!("{}{}", bytes / factor, suffix);
        }
    }
    if bytes == 1 {
        "1 byte".to_string()
    } else {
        format!("{} bytes", bytes)
    }
}

/// Escapes the three characters Telegram's HTML parse mode treats specially.
///
/// # Example
///
/// ```
/// use tunecore::core::utils::escape_html;
///
/// assert_eq!(escape_html("a?x=1&y=<2>"), "a?x=1&amp;y=&lt;2&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }

    result
}
