//! JSONL persistence for finished spans.
//!
//! The built-in local exporter. Spans arrive one at a time as records are
//! released, children before their parents, and each becomes one JSON line.
//! Lines are buffered; the buffer is flushed whenever a root span (no
//! parent) is written, since a root ending means its trace is complete.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use crate::sink::SpanSink;
use crate::span::SpanData;

/// Errors from span persistence.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("cannot open span file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot append span {span_id}: {source}")]
    Append {
        span_id: String,
        source: std::io::Error,
    },

    #[error("cannot encode span {span_id}: {source}")]
    Encode {
        span_id: String,
        source: serde_json::Error,
    },

    #[error("cannot flush span file {path}: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read span file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid span record at {path}:{line}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// Where span lines go.
#[derive(Debug, Clone)]
enum Target {
    /// Everything appends to one file.
    File(PathBuf),
    /// One dated file per UTC day inside a directory.
    Rotating(PathBuf),
    /// Lines are dropped.
    Disabled,
}

/// Writes finished spans to JSONL files.
///
/// Thread-safe via an internal mutex. As a [`SpanSink`] it never fails the
/// recording call path; write errors are logged and dropped.
pub struct SpanWriter {
    target: Target,
    state: Mutex<OutputState>,
}

#[derive(Default)]
struct OutputState {
    /// The file currently open, if any, and the path it points at.
    open: Option<(PathBuf, BufWriter<File>)>,
}

impl OutputState {
    /// Reuse the open file while the target path is unchanged; rotation
    /// closes the previous file after a best-effort flush.
    fn ensure_open(&mut self, path: &Path) -> Result<(), WriteError> {
        let reuse = matches!(&self.open, Some((current, _)) if current == path);
        if reuse {
            return Ok(());
        }
        if let Some((_, mut previous)) = self.open.take() {
            let _ = previous.flush();
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| WriteError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        self.open = Some((path.to_path_buf(), BufWriter::new(file)));
        Ok(())
    }
}

impl SpanWriter {
    /// Append every span to a single file, creating missing parent
    /// directories.
    pub fn to_file(path: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| WriteError::Open {
                path: path.clone(),
                source,
            })?;
        }
        Ok(Self {
            target: Target::File(path),
            state: Mutex::new(OutputState::default()),
        })
    }

    /// Append spans to one dated file per UTC day inside `dir`.
    pub fn rotating(dir: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| WriteError::Open {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            target: Target::Rotating(dir),
            state: Mutex::new(OutputState::default()),
        })
    }

    /// Drop every span.
    pub fn disabled() -> Self {
        Self {
            target: Target::Disabled,
            state: Mutex::new(OutputState::default()),
        }
    }

    /// The file the next span line would land in, if writing is enabled.
    pub fn current_file_path(&self) -> Option<PathBuf> {
        match &self.target {
            Target::File(path) => Some(path.clone()),
            Target::Rotating(dir) => {
                Some(dir.join(format!("{}.jsonl", Utc::now().format("%Y-%m-%d"))))
            }
            Target::Disabled => None,
        }
    }

    /// Append one span line.
    pub fn write(&self, span: &SpanData) -> Result<(), WriteError> {
        let Some(path) = self.current_file_path() else {
            return Ok(());
        };
        let line = serde_json::to_string(span).map_err(|source| WriteError::Encode {
            span_id: span.span_id.clone(),
            source,
        })?;

        let mut state = self.state.lock().unwrap();
        state.ensure_open(&path)?;
        if let Some((_, out)) = state.open.as_mut() {
            writeln!(out, "{}", line).map_err(|source| WriteError::Append {
                span_id: span.span_id.clone(),
                source,
            })?;
            if span.parent_span_id.is_none() {
                out.flush().map_err(|source| WriteError::Flush {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Force buffered lines to disk without waiting for a root span.
    pub fn flush(&self) -> Result<(), WriteError> {
        let mut state = self.state.lock().unwrap();
        if let Some((path, out)) = state.open.as_mut() {
            out.flush().map_err(|source| WriteError::Flush {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Read spans back from a file, in write order.
    pub fn read_spans(path: &Path) -> Result<Vec<SpanData>, WriteError> {
        let file = File::open(path).map_err(|source| WriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut spans = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| WriteError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let span = serde_json::from_str(&line).map_err(|source| WriteError::Decode {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
            spans.push(span);
        }
        Ok(spans)
    }
}

impl SpanSink for SpanWriter {
    fn export(&self, span: &SpanData) {
        if let Err(error) = self.write(span) {
            tracing::warn!(span = %span.name, "failed to persist span: {}", error);
        }
    }
}
