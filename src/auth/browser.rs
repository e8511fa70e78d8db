//! Opening the Launchpad consent page

use url::Url;

/// Something that can show the user a URL.
pub trait Browser {
    fn open(&self, url: &Url) -> std::io::Result<()>;
}

/// The desktop's default web browser.
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &Url) -> std::io::Result<()> {
        tracing::debug!("Opening browser at {}", url);
        webbrowser::open(url.as_str())
    }
}
