//! Values flowing between two calls.
//!
//! A pipeline can be consumed exactly once: `take_enumerator` hands out the
//! underlying source and leaves the pipeline empty.
use std::fmt;
use std::io::BufRead;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use rcaron_syntax::{ErrorCode, RCaronError, Result};

use crate::Value;

type BoxedIter = Box<dyn Iterator<Item = Result<Value>> + Send>;

enum Source {
    Single(Value),
    Enumerator(BoxedIter),
    Channel(Receiver<Value>),
    Stream(Box<dyn BufRead + Send>),
}

impl Source {
    fn kind(&self) -> &'static str {
        match self {
            Source::Single(_) => "single",
            Source::Enumerator(_) => "enumerator",
            Source::Channel(_) => "channel",
            Source::Stream(_) => "stream",
        }
    }
}

pub struct Pipeline {
    kind: &'static str,
    source: Mutex<Option<Source>>,
}

impl Pipeline {
    fn from_source(source: Source) -> Self {
        Self {
            kind: source.kind(),
            source: Mutex::new(Some(source)),
        }
    }

    /// Pipeline yielding exactly one value.
    pub fn single(value: Value) -> Self {
        Self::from_source(Source::Single(value))
    }

    pub fn from_enumerator(iter: impl Iterator<Item = Result<Value>> + Send + 'static) -> Self {
        Self::from_source(Source::Enumerator(Box::new(iter)))
    }

    /// Bounded channel pipeline. Writers block while `capacity` values are
    /// buffered; the pipeline ends once every writer is dropped.
    pub fn channel(capacity: usize) -> (Self, ChannelWriter) {
        let (tx, rx) = channel::bounded(capacity);
        (
            Self::from_source(Source::Channel(rx)),
            ChannelWriter { sender: tx },
        )
    }

    /// Line-oriented reader; each line becomes a string value.
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self::from_source(Source::Stream(Box::new(reader)))
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_consumed(&self) -> bool {
        self.source.lock().is_none()
    }

    /// Take the consuming iterator. A second call fails with `InvalidOperation`.
    pub fn take_enumerator(&self) -> Result<PipelineEnumerator> {
        match self.source.lock().take() {
            Some(source) => Ok(PipelineEnumerator {
                source: Some(source),
            }),
            None => Err(RCaronError::new(
                ErrorCode::InvalidOperation,
                format!("The {} pipeline was already consumed", self.kind),
            )),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("kind", &self.kind)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Consuming side of a [`Pipeline`].
pub struct PipelineEnumerator {
    source: Option<Source>,
}

impl Iterator for PipelineEnumerator {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.source, Some(Source::Single(_))) {
            return match self.source.take() {
                Some(Source::Single(v)) => Some(Ok(v)),
                _ => None,
            };
        }
        match self.source.as_mut()? {
            Source::Single(_) => None,
            Source::Enumerator(iter) => iter.next(),
            Source::Channel(rx) => rx.recv().ok().map(Ok),
            Source::Stream(reader) => {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => None,
                    Ok(_) => {
                        let trimmed = line.trim_end_matches(['\n', '\r']);
                        Some(Ok(Value::from(trimmed)))
                    }
                    Err(e) => Some(Err(RCaronError::new(ErrorCode::HostError, e.to_string()))),
                }
            }
        }
    }
}

/// Producer handle of a channel pipeline. Clone it for more producers.
#[derive(Clone)]
pub struct ChannelWriter {
    sender: Sender<Value>,
}

impl ChannelWriter {
    /// Blocks while the channel is full.
    pub fn write(&self, value: Value) -> Result<()> {
        self.sender.send(value).map_err(|_| {
            RCaronError::new(ErrorCode::InvalidOperation, "Pipeline reader was dropped")
        })
    }
}
