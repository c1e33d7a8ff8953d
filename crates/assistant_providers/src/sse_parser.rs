use crate::{AssistantError, RunStreamEvent};
use bytes::Bytes;
use futures_util::Stream;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

/// SSE (Server-Sent Events) stream parser for streamed runs
///
/// Buffers raw bytes across HTTP chunks so that events (and multi-byte
/// characters) split between chunks are reassembled, and queues every event
/// decoded from a chunk so none is lost when one chunk carries several.
pub struct SSEParser<S> {
    inner: S,
    buffer: Vec<u8>,
    event_name: Option<String>,
    data_lines: Vec<String>,
    pending: VecDeque<Result<RunStreamEvent, AssistantError>>,
    finished: bool,
}

impl<S, E> SSEParser<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            event_name: None,
            data_lines: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn process_buffer(&mut self) {
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);
            self.process_line(line);
        }
    }

    fn process_line(&mut self, line: &str) {
        // A blank line terminates the current event
        if line.is_empty() {
            self.dispatch_event();
            return;
        }

        // Comments (keep-alives)
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_name = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            _ => {}
        }
    }

    fn dispatch_event(&mut self) {
        if self.event_name.is_none() && self.data_lines.is_empty() {
            return;
        }

        let event_name = self
            .event_name
            .take()
            .unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data_lines).join("\n");

        tracing::trace!(event = %event_name, "Decoded run stream event");
        self.pending
            .push_back(RunStreamEvent::from_sse(&event_name, &data));
    }

    /// Handle whatever is left once the connection closes
    fn flush_remaining(&mut self) {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.process_line(line.trim_end_matches(['\n', '\r']));
        }
        self.dispatch_event();
    }
}

impl<S, E> Stream for SSEParser<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    type Item = Result<RunStreamEvent, AssistantError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                    this.process_buffer();
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(AssistantError::StreamError(e.to_string()))));
                }
                Poll::Ready(None) => {
                    this.flush_remaining();
                    this.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
