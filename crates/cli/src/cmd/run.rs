//! Debounce stdin lines to stdout
//!
//! Every input line is an observation. A line is printed once no newer line
//! (for the same key, in keyed mode) arrived within the delay.
//!
//! Keyed mode keeps one debouncer slot and one forwarder task per distinct
//! key until end of input, so memory grows with the number of keys seen.
//! Feed it inputs with a bounded key set.

use crate::system_config::CliConfig;
use anyhow::{Context, Result};
use debounce::{DebounceConfig, Debouncer, KeyedDebouncer};
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Resolved options for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub delay: Duration,
    pub keyed: bool,
    pub separator: String,
    pub flush_on_eof: bool,
}

impl RunOptions {
    /// Merge command-line flags over the config file
    pub fn resolve(
        config: &CliConfig,
        delay_ms: Option<u64>,
        keyed: bool,
        separator: Option<String>,
        no_flush: bool,
    ) -> Result<Self> {
        let debounce = match delay_ms {
            Some(ms) => DebounceConfig::with_delay_ms(ms),
            None => config.debounce.clone(),
        };
        debounce.validate().context("Invalid --delay-ms")?;

        let separator = separator.unwrap_or_else(|| config.output.separator.clone());
        if separator.is_empty() {
            anyhow::bail!("Separator must not be empty");
        }

        Ok(Self {
            delay: debounce.delay(),
            keyed,
            separator,
            flush_on_eof: config.output.flush_on_eof && !no_flush,
        })
    }
}

pub async fn run(options: RunOptions) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    let (_, written) = if options.keyed {
        debounce_keyed(reader, writer, &options).await?
    } else {
        debounce_lines(reader, writer, &options).await?
    };

    info!("Emitted {} debounced lines", written);
    Ok(())
}

/// Debounce a single stream of lines
///
/// Returns the writer and the number of lines written.
pub async fn debounce_lines<R, W>(reader: R, writer: W, options: &RunOptions) -> Result<(W, usize)>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let output = spawn_writer(writer, rx);

    let debouncer = Debouncer::new(String::new(), options.delay)?;
    let forwarder = spawn_forwarder(debouncer.subscribe(), tx, Some);

    let mut lines = reader.lines();
    let mut observed = 0usize;
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        debouncer.push(line);
        observed += 1;
    }
    debug!("Input closed after {} lines", observed);

    if options.flush_on_eof {
        debouncer.flush();
    } else {
        wait_until_settled(options.delay, || debouncer.is_pending()).await;
    }

    // Dropping the debouncer closes the subscription and ends the forwarder
    drop(debouncer);
    forwarder.await.context("Forwarder task failed")?;
    output.await.context("Writer task failed")?
}

/// Debounce `key<separator>value` lines independently per key
pub async fn debounce_keyed<R, W>(reader: R, writer: W, options: &RunOptions) -> Result<(W, usize)>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let output = spawn_writer(writer, rx);

    let debouncer: KeyedDebouncer<String, String> = KeyedDebouncer::new(options.delay)?;
    let mut seen = HashSet::new();
    let mut forwarders = Vec::new();

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let Some((key, value)) = split_keyed(&line, &options.separator) else {
            warn!("Skipping line without separator: {:?}", line);
            continue;
        };

        if seen.insert(key.to_string()) {
            let prefix = format!("{}{}", key, options.separator);
            forwarders.push(spawn_forwarder(
                debouncer.subscribe(key.to_string()),
                tx.clone(),
                move |value: Option<String>| value.map(|value| format!("{}{}", prefix, value)),
            ));
        }
        debouncer.push(key.to_string(), value.to_string());
    }
    debug!("Input closed with {} keys", seen.len());

    if options.flush_on_eof {
        debouncer.flush_all();
    } else {
        wait_until_settled(options.delay, || debouncer.pending_count() > 0).await;
    }

    drop(debouncer);
    drop(tx);
    for forwarder in forwarders {
        forwarder.await.context("Forwarder task failed")?;
    }
    output.await.context("Writer task failed")?
}

/// Split a keyed line at the first separator
pub fn split_keyed<'a>(line: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    line.split_once(separator)
}

async fn wait_until_settled(delay: Duration, is_pending: impl Fn() -> bool) {
    let poll = delay.max(Duration::from_millis(1));
    while is_pending() {
        tokio::time::sleep(poll).await;
    }
}

/// Forward every commit seen on `receiver` as an output line
fn spawn_forwarder<T, F>(
    mut receiver: watch::Receiver<T>,
    lines: mpsc::UnboundedSender<String>,
    format: F,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> Option<String> + Send + 'static,
{
    tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let value = receiver.borrow_and_update().clone();
            if let Some(line) = format(value) {
                if lines.send(line).is_err() {
                    break;
                }
            }
        }
    })
}

fn spawn_writer<W>(
    mut writer: W,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<Result<(W, usize)>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut written = 0;
        while let Some(line) = lines.recv().await {
            writer.write_all(line.as_bytes()).await.context("Failed to write output")?;
            writer.write_all(b"\n").await.context("Failed to write output")?;
            writer.flush().await.context("Failed to flush output")?;
            written += 1;
        }
        Ok((writer, written))
    })
}
