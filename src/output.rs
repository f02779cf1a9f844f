//! The host output channel.

use crate::error::{AdminError, Result};
use console::style;
use serde_json::Value;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON document per line
    #[default]
    Json,
    /// One YAML document per item
    Yaml,
    /// Human-readable key/value listing
    Text,
}

/// Receives emitted items one at a time.
///
/// Items passed to `write_object` are staged. They become visible only when
/// `commit` runs, and `discard` drops whatever is staged.
pub trait OutputSink {
    fn write_object(&mut self, item: Value) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn discard(&mut self);
}

/// Emits a command result. Arrays are flattened into their elements in order,
/// `null` emits nothing, anything else is a single item. Returns the number of
/// items written.
///
/// Either every item is committed or none is: a failure while staging any
/// item discards the ones staged before it.
pub fn emit(sink: &mut dyn OutputSink, result: Value) -> Result<usize> {
    let items = match result {
        Value::Null => return Ok(0),
        Value::Array(items) => items,
        item => vec![item],
    };
    let count = items.len();
    if count == 0 {
        return Ok(0);
    }
    for item in items {
        if let Err(e) = sink.write_object(item) {
            sink.discard();
            return Err(e);
        }
    }
    sink.commit()?;
    Ok(count)
}

/// Writes items to a stream in the selected format.
pub struct StreamOutput<W: Write> {
    writer: W,
    format: OutputFormat,
    pending: String,
}

impl StreamOutput<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write> StreamOutput<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            pending: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn render(&self, item: &Value) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string(item).map_err(|e| AdminError::Output(e.to_string()))
            }
            OutputFormat::Yaml => {
                let doc = serde_yaml::to_string(item).map_err(|e| AdminError::Output(e.to_string()))?;
                Ok(format!("---\n{}", doc.trim_end()))
            }
            OutputFormat::Text => Ok(render_text(item)),
        }
    }
}

impl<W: Write> OutputSink for StreamOutput<W> {
    fn write_object(&mut self, item: Value) -> Result<()> {
        let rendered = self.render(&item)?;
        self.pending.push_str(&rendered);
        self.pending.push('\n');
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        self.writer
            .write_all(pending.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| AdminError::Output(e.to_string()))
    }

    fn discard(&mut self) {
        self.pending.clear();
    }
}

fn render_text(item: &Value) -> String {
    match item {
        Value::Object(map) => {
            let width = map.keys().map(String::len).max().unwrap_or(0);
            let mut lines: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{} : {}",
                        style(format!("{:width$}", key, width = width)).cyan(),
                        scalar(value)
                    )
                })
                .collect();
            lines.push(String::new());
            lines.join("\n")
        }
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Keeps every committed item in memory.
#[derive(Debug, Default)]
pub struct CollectingOutput {
    pub items: Vec<Value>,
    staged: Vec<Value>,
}

impl OutputSink for CollectingOutput {
    fn write_object(&mut self, item: Value) -> Result<()> {
        self.staged.push(item);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.items.append(&mut self.staged);
        Ok(())
    }

    fn discard(&mut self) {
        self.staged.clear();
    }
}
