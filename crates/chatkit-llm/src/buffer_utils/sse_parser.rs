use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::str::Utf8Error;

use super::buffering::CircularLineBuffer;
use crate::error::LlmError;
use crate::streaming::StreamEvent;
use crate::traits::EventStream;

const DATA_PREFIX: &str = "data: ";

/// Strategy pattern for parsing different SSE payload shapes
pub trait SseLineParser: Send {
    /// Parse the payload of a `data: ` line into stream events
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>, serde_json::Error>;

    /// Check if this payload signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

enum Frame {
    Events(Vec<StreamEvent>),
    Done,
    Skip,
}

/// Generic SSE stream parser over any chunked byte body
///
/// Malformed frames are logged and skipped; only a failing body ends the
/// stream with an error. The `[DONE]` sentinel stops reading immediately.
pub fn parse_sse_stream<S, B, E, P>(body: S, parser: P) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(body);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut finished = false;

        'read: while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(LlmError::Stream(e.to_string()));
                    finished = true;
                    break 'read;
                }
            };

            buffer.extend(bytes.as_ref());

            // Process all complete lines in buffer
            while let Some(line) = buffer.next_line() {
                match decode_frame(&parser, line) {
                    Frame::Events(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Frame::Done => {
                        yield Ok(StreamEvent::Done { finish_reason: None });
                        finished = true;
                        break 'read;
                    }
                    Frame::Skip => {}
                }
            }
        }

        if !finished {
            if let Some(line) = buffer.take_remaining() {
                match decode_frame(&parser, line) {
                    Frame::Events(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Frame::Done => yield Ok(StreamEvent::Done { finish_reason: None }),
                    Frame::Skip => {}
                }
            }
        }
    })
}

fn decode_frame<P: SseLineParser>(parser: &P, line: Result<String, Utf8Error>) -> Frame {
    let line = match line {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!("Skipping SSE line with invalid UTF-8: {}", e);
            return Frame::Skip;
        }
    };

    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Skip;
    };

    if parser.is_done_marker(data) {
        return Frame::Done;
    }

    match parser.parse_data_line(data) {
        Ok(events) => Frame::Events(events),
        Err(e) => {
            tracing::warn!("Error parsing streaming response: {} (line: {})", e, data);
            Frame::Skip
        }
    }
}
