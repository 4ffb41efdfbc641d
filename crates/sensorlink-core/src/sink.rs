use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::{Metrics, SensorReading, TopicKind};

/// Publishes readings to the home-automation bus (or a stand-in for it).
pub trait ReadingSink {
    fn publish(&mut self, topic: &str, reading: &SensorReading) -> Result<(), SinkError>;
}

impl<K: ReadingSink + ?Sized> ReadingSink for &mut K {
    fn publish(&mut self, topic: &str, reading: &SensorReading) -> Result<(), SinkError> {
        (**self).publish(topic, reading)
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PublishedLine<'a> {
    topic: &'a str,
    device: &'a str,
    kind: TopicKind,
    metrics: &'a Metrics,
}

/// Writes one JSON object per reading, one per line, flushing after each.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReadingSink for JsonLinesSink<W> {
    fn publish(&mut self, topic: &str, reading: &SensorReading) -> Result<(), SinkError> {
        let line = PublishedLine {
            topic,
            device: &reading.device_name,
            kind: reading.topic_kind,
            metrics: &reading.metrics,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every published `(topic, reading)` pair in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    published: Vec<(String, SensorReading)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> &[(String, SensorReading)] {
        &self.published
    }

    pub fn readings(&self) -> impl Iterator<Item = &SensorReading> {
        self.published.iter().map(|(_, reading)| reading)
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }
}

impl ReadingSink for MemorySink {
    fn publish(&mut self, topic: &str, reading: &SensorReading) -> Result<(), SinkError> {
        self.published.push((topic.to_string(), reading.clone()));
        Ok(())
    }
}
