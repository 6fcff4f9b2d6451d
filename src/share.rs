use std::io;

use webbrowser::Browser;

pub const SHARE_TITLE: &str = "Can you type faster than me?";
pub const PROJECT_URL: &str = "https://hatulapro.github.io/typur/";

/// Somewhere a finished result can be posted to.
pub trait ShareSink {
    /// Hosts without the capability simply do not offer sharing.
    fn is_available(&self) -> bool;
    fn share(&self, cpm: f64) -> io::Result<()>;
}

pub fn share_text(cpm: f64) -> String {
    format!(
        "I got {} characters per minute. You?",
        cpm.round() as i64
    )
}

/// Opens a tweet intent in the default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserShare;

impl BrowserShare {
    pub fn intent_url(cpm: f64) -> String {
        format!(
            "https://twitter.com/intent/tweet?text={}&url={}",
            urlencoding::encode(&format!("{SHARE_TITLE} {}", share_text(cpm))),
            urlencoding::encode(PROJECT_URL)
        )
    }
}

impl ShareSink for BrowserShare {
    fn is_available(&self) -> bool {
        Browser::is_available()
    }

    fn share(&self, cpm: f64) -> io::Result<()> {
        let url = Self::intent_url(cpm);
        tracing::info!(%url, "sharing result");
        webbrowser::open(&url)
    }
}
