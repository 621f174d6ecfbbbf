//! Notification email content

/// Subject line of every notification
pub const SUBJECT: &str = "Your karaoke recording is ready";

/// Rendered email body in both formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the notification for a playback URL
pub fn render(url: &str) -> RenderedMessage {
    let text = format!(
        "Your recording has been processed.\n\nWatch it here: {}\n",
        url
    );
    let escaped = escape_html(url);
    let html = format!(
        "<p>Your recording has been processed.</p>\n<p><a href=\"{0}\">Watch it here: {0}</a></p>\n",
        escaped
    );

    RenderedMessage {
        subject: SUBJECT.to_string(),
        text,
        html,
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
