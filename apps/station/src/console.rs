//! # Terminal Console
//!
//! Line-oriented prompts over any async reader and writer, plus the barcode
//! feed that routes typed codes through the manual-entry barcode source.
//!
//! ```text
//! stdin line ──► BarcodeFeed ──► ManualEntry::submit ──► ScanSession::next ──► code
//!                     │
//!                     └── blank line: prompt again, EOF: feed ends
//! ```
//!
//! Prompts for quantity, item details and confirmation read the same stream,
//! so the feed only pulls a line when a barcode is actually wanted.

use scanstock_client::{BarcodeScanner, ManualEntry, ScanSession, ScanStatus};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::watch;

use crate::error::{StationError, StationResult};

/// Prompts and output for one terminal.
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    /// Writes one line.
    pub async fn say(&mut self, text: impl AsRef<str>) -> StationResult<()> {
        self.out.write_all(text.as_ref().as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }

    /// Shows a prompt and reads the answer, trimmed. `None` on EOF.
    pub async fn ask(&mut self, prompt: &str) -> StationResult<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.write_all(b" ").await?;
        self.out.flush().await?;

        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    /// Like [`Console::ask`], but EOF is an error.
    pub async fn ask_required(&mut self, prompt: &str) -> StationResult<String> {
        self.ask(prompt).await?.ok_or_else(StationError::input_closed)
    }

    /// Asks a yes/no question. Blank takes the default.
    pub async fn ask_yes_no(&mut self, prompt: &str, default: bool) -> StationResult<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let answer = self.ask_required(&format!("{} {}", prompt, hint)).await?;

        Ok(match answer.to_ascii_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

// =============================================================================
// Barcode Feed
// =============================================================================

/// Typed barcodes delivered through a manual-entry scan session.
pub struct BarcodeFeed {
    entry: ManualEntry,
    session: Option<ScanSession>,
    scanner: BarcodeScanner,
}

impl BarcodeFeed {
    /// Opens a manual-entry scanner and starts its session.
    pub async fn open() -> StationResult<Self> {
        let (scanner, entry) = BarcodeScanner::manual();
        let session = scanner.open().await?;

        Ok(Self {
            entry,
            session: Some(session),
            scanner,
        })
    }

    /// Status of the underlying scanner.
    pub fn status(&self) -> watch::Receiver<ScanStatus> {
        self.scanner.status()
    }

    /// Prompts until a code arrives. `None` once the operator is done.
    ///
    /// A blank line re-prompts; EOF, `q` or `quit` ends the feed and releases
    /// the scan session.
    pub async fn next_code<R, W>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> StationResult<Option<String>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let Some(session) = self.session.as_mut() else {
                return Ok(None);
            };

            let line = match console.ask("Barcode (q to quit):").await? {
                Some(line) if !matches!(line.as_str(), "q" | "quit") => line,
                _ => {
                    self.close();
                    return Ok(None);
                }
            };
            if line.is_empty() {
                continue;
            }

            self.entry.submit(&line).await?;
            return Ok(session.next().await);
        }
    }

    /// Ends the session early.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}
