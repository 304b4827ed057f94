//! yt-dlp based extractor implementation.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::traits::{Extractor, ProgressSink};
use super::types::ExtractionRequest;

const PROGRESS_PREFIX: &str = "vidfetch-progress ";
const FILE_PREFIX: &str = "vidfetch-file:";

/// Extractor driving the `yt-dlp` command line tool.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Creates a new extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Builds the yt-dlp argument list for a request.
    pub fn build_args(&self, request: &ExtractionRequest) -> Vec<String> {
        let cfg = &request.config;
        let mut args = vec![
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{}%(progress.downloaded_bytes)s \
                 %(progress.total_bytes,progress.total_bytes_estimate)s %(progress.speed)s",
                PROGRESS_PREFIX
            ),
            "--no-simulate".to_string(),
            "--print".to_string(),
            format!("after_move:{}%(filepath)s", FILE_PREFIX),
            "-f".to_string(),
            cfg.format.clone(),
            "-o".to_string(),
            cfg.output_template.clone(),
        ];

        for (name, value) in &cfg.http_headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }

        for hint in &cfg.extractor_args {
            args.push("--extractor-args".to_string());
            args.push(hint.clone());
        }

        if cfg.force_generic {
            args.push("--force-generic-extractor".to_string());
        }

        if cfg.no_warnings {
            args.push("--no-warnings".to_string());
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push(request.url.clone());
        args
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, ExtractorError> {
        let args = self.build_args(request);
        debug!("Running {} for {}", self.config.ytdlp_path.display(), request.url);

        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::BinaryNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::failed("yt-dlp stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::failed("yt-dlp stderr was not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = LossyLines::new(BufReader::new(stderr));
            let mut captured = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                captured.push(line);
            }
            captured
        });

        let mut final_path: Option<PathBuf> = None;
        let mut destination: Option<PathBuf> = None;
        let mut lines = LossyLines::new(BufReader::new(stdout));
        while let Some(line) = lines.next_line().await? {
            if let Some((downloaded, total, speed)) = parse_progress_line(&line) {
                sink.on_progress(downloaded, total, speed);
            } else if let Some(path) = line.trim().strip_prefix(FILE_PREFIX) {
                if !path.is_empty() {
                    final_path = Some(PathBuf::from(path));
                }
            } else if let Some(path) = parse_destination_line(&line) {
                destination = Some(PathBuf::from(path));
            }
        }

        let status = child.wait().await?;
        let stderr_lines = stderr_task.await.unwrap_or_else(|e| {
            warn!("stderr reader for yt-dlp failed: {}", e);
            Vec::new()
        });

        if !status.success() {
            return Err(ExtractorError::failed(failure_message(&stderr_lines, status)));
        }

        let path = final_path
            .or(destination)
            .ok_or(ExtractorError::MissingOutput)?;
        sink.on_finished(&path);
        Ok(path)
    }
}

/// Line reader over process output. Invalid UTF-8 is replaced rather than
/// ending the stream, since titles and site messages can carry any bytes.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Parses a line emitted by our `--progress-template`.
///
/// Returns `(downloaded, total, speed)`; `NA` fields read as zero.
fn parse_progress_line(line: &str) -> Option<(u64, u64, f64)> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX.trim_end())?;
    let mut fields = rest.split_whitespace();
    let downloaded = parse_number(fields.next()?);
    let total = parse_number(fields.next()?);
    let speed = parse_number(fields.next().unwrap_or("NA"));
    Some((downloaded as u64, total as u64, speed))
}

fn parse_number(field: &str) -> f64 {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn parse_destination_line(line: &str) -> Option<String> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("[download] Destination:") {
        let path = rest.trim();
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        let path = rest.trim_end_matches('"');
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    None
}

/// The `ERROR:` lines of stderr, else its last non-empty line.
fn failure_message(stderr_lines: &[String], status: ExitStatus) -> String {
    let errors: Vec<&str> = stderr_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR:"))
        .collect();
    if !errors.is_empty() {
        return errors.join("\n");
    }

    stderr_lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("yt-dlp exited with code {:?}", status.code()))
}
