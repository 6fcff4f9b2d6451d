use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::TypurEvent;

pub const DEFAULT_API_URL: &str = "https://api.quotable.io/random";
pub const DEFAULT_MAX_LENGTH: usize = 180;

static QUOTES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources");

/// Text to type and who said it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub content: String,
    pub author: String,
}

impl Quote {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
        }
    }

    /// Replace typographic punctuation with what a plain keyboard can type.
    pub fn typeable(self) -> Self {
        let mut content = String::with_capacity(self.content.len());
        for c in self.content.chars() {
            match c {
                '\u{2018}' | '\u{2019}' | '\u{2032}' => content.push('\''),
                '\u{201C}' | '\u{201D}' | '\u{2033}' => content.push('"'),
                '\u{2013}' | '\u{2014}' => content.push('-'),
                '\u{2026}' => content.push_str("..."),
                '\u{00A0}' => content.push(' '),
                c => content.push(c),
            }
        }
        Self {
            content,
            author: self.author,
        }
    }
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[cfg(feature = "network")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("quote service answered with status {0}")]
    Status(u16),
    #[error("could not decode quote: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no quotes available")]
    Empty,
    #[error("built without network support")]
    NetworkDisabled,
}

/// Anything that can hand out a complete quote.
pub trait QuoteSource: Send + Sync + 'static {
    fn fetch(&self) -> Result<Quote, QuoteError>;
}

/// Subset of the quotable.io `/random` payload we care about.
#[derive(Debug, Deserialize)]
struct RandomQuoteResponse {
    content: String,
    author: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "network"), allow(dead_code))]
pub struct QuotableClient {
    url: String,
    max_length: usize,
    #[cfg(feature = "network")]
    client: reqwest::blocking::Client,
}

impl QuotableClient {
    #[cfg(feature = "network")]
    pub fn new(url: impl Into<String>, max_length: usize) -> Result<Self, QuoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            url: url.into(),
            max_length,
            client,
        })
    }

    #[cfg(not(feature = "network"))]
    pub fn new(url: impl Into<String>, max_length: usize) -> Result<Self, QuoteError> {
        Ok(Self {
            url: url.into(),
            max_length,
        })
    }
}

impl QuoteSource for QuotableClient {
    #[cfg(feature = "network")]
    fn fetch(&self) -> Result<Quote, QuoteError> {
        tracing::debug!(url = %self.url, max_length = self.max_length, "fetching quote");
        let response = self
            .client
            .get(&self.url)
            .query(&[("maxLength", self.max_length)])
            .send()?;
        if !response.status().is_success() {
            return Err(QuoteError::Status(response.status().as_u16()));
        }
        let body: RandomQuoteResponse = response.json()?;
        parse_quote(body)
    }

    #[cfg(not(feature = "network"))]
    fn fetch(&self) -> Result<Quote, QuoteError> {
        Err(QuoteError::NetworkDisabled)
    }
}

fn parse_quote(body: RandomQuoteResponse) -> Result<Quote, QuoteError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(QuoteError::Empty);
    }
    Ok(Quote::new(content, body.author.trim()).typeable())
}

/// Quotes bundled into the binary, for playing without a network.
#[derive(Debug, Clone)]
pub struct OfflineQuotes {
    quotes: Vec<Quote>,
}

impl OfflineQuotes {
    pub fn load() -> Result<Self, QuoteError> {
        let file = QUOTES_DIR.get_file("quotes.json").ok_or(QuoteError::Empty)?;
        let raw = file.contents_utf8().ok_or(QuoteError::Empty)?;
        let quotes: Vec<Quote> = serde_json::from_str(raw)?;
        if quotes.is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(Self { quotes })
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl QuoteSource for OfflineQuotes {
    fn fetch(&self) -> Result<Quote, QuoteError> {
        self.quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(QuoteError::Empty)
    }
}

/// Always the same quote; used for `--prompt`.
#[derive(Debug, Clone)]
pub struct FixedQuote(pub Quote);

impl QuoteSource for FixedQuote {
    fn fetch(&self) -> Result<Quote, QuoteError> {
        Ok(self.0.clone())
    }
}

/// Result of one background fetch, tagged with the request that produced it.
#[derive(Debug)]
pub struct QuoteDelivery {
    pub generation: u64,
    pub result: Result<Quote, QuoteError>,
}

/// Runs fetches off the event loop thread.
///
/// Every request bumps the generation; deliveries from older requests are
/// dropped so a slow response can never replace a newer quote.
pub struct QuoteFetcher {
    source: Arc<dyn QuoteSource>,
    generation: Arc<AtomicU64>,
    tx: Sender<TypurEvent>,
}

impl QuoteFetcher {
    pub fn new(source: Arc<dyn QuoteSource>, tx: Sender<TypurEvent>) -> Self {
        Self {
            source,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    pub fn request(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let source = Arc::clone(&self.source);
        let latest = Arc::clone(&self.generation);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let result = source.fetch();
            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "dropping superseded quote");
                return;
            }
            if let Err(e) = &result {
                tracing::warn!(generation, error = %e, "quote fetch failed");
            }
            let _ = tx.send(TypurEvent::QuoteLoaded(QuoteDelivery { generation, result }));
        });

        generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
