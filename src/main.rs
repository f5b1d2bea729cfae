use dotenvy::dotenv;
use mezmur_bot::config::Settings;
use mezmur_bot::runner;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Masks Telegram bot tokens in formatted log lines
struct TokenRedactor {
    rules: Vec<(Regex, &'static str)>,
}

impl TokenRedactor {
    /// Compiles the token patterns
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        let rules = [
            // Request URLs: https://api.telegram.org/bot<token>/method
            (
                r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)",
                "$1[TELEGRAM_TOKEN]$3",
            ),
            (r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+", "$1[TELEGRAM_TOKEN]"),
            // Bare tokens
            (r"([0-9]{8,10}:[A-Za-z0-9_-]{35})", "[TELEGRAM_TOKEN]"),
        ];
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Regex::new(pattern).map(|re| (re, replacement)))
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    fn redact(&self, line: &str) -> String {
        self.rules
            .iter()
            .fold(line.to_string(), |acc, (re, replacement)| {
                re.replace_all(&acc, *replacement).into_owned()
            })
    }
}

/// Log sink that passes every write through a [`TokenRedactor`]
struct RedactedSink<W: Write> {
    inner: W,
    redactor: Arc<TokenRedactor>,
}

impl<W: Write> Write for RedactedSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = self.redactor.redact(&String::from_utf8_lossy(buf));
        self.inner.write_all(line.as_bytes())?;
        // Callers expect the length they passed in
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `MakeWriter` producing [`RedactedSink`]s around stderr
#[derive(Clone)]
struct RedactedStderr {
    redactor: Arc<TokenRedactor>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RedactedStderr {
    type Writer = RedactedSink<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactedSink {
            inner: io::stderr(),
            redactor: Arc::clone(&self.redactor),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    let redactor = TokenRedactor::new().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?;
    init_logging(Arc::new(redactor));

    info!("Starting Mezmur Bot...");

    let settings = init_settings();

    if let Err(e) = runner::run_bot(settings).await {
        error!("Failed to start bot: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(redactor: Arc<TokenRedactor>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(RedactedStderr { redactor }))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded (API: {}).", s.api_base_url);
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_in_url_is_redacted() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        let line = "POST https://api.telegram.org/bot123456789:AAFakeTokenValue_with-chars/sendMessage failed";
        let redacted = redactor.redact(line);
        assert!(!redacted.contains("AAFakeTokenValue"));
        assert!(redacted.contains("/bot[TELEGRAM_TOKEN]/sendMessage"));
        Ok(())
    }

    #[test]
    fn test_plain_lines_pass_through() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        let line = "Inline query query=\"samuel\" offset=5";
        assert_eq!(redactor.redact(line), line);
        Ok(())
    }
}
