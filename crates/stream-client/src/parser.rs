//! Incremental parser for the event-stream text protocol.
//!
//! Bytes are appended as they arrive from the network. Every complete frame
//! (terminated by a blank line) is extracted and interpreted; the trailing
//! incomplete fragment stays buffered for the next read. Splitting happens on
//! raw bytes, so a multi-byte character cut across two reads is reassembled
//! before it is decoded.
//!
//! A fragment that grows past the parser's limit without completing is
//! discarded, along with the rest of that frame, and reported as
//! [`ParsedFrame::Overflow`].

/// Default event type for frames without an `event:` line.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// Default cap on bytes held for one incomplete frame.
pub const DEFAULT_MAX_PENDING: usize = 1 << 20;

const FRAME_TERMINATOR: &[u8] = b"\n\n";
const EVENT_FIELD: &str = "event:";
const DATA_FIELD: &str = "data:";

/// Payload of a delivered event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// The data lines parsed as JSON.
    Json(serde_json::Value),
    /// The raw data string, when it is not valid JSON.
    Text(String),
}

impl EventData {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            EventData::Json(value) => Some(value),
            EventData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EventData::Text(text) => Some(text),
            EventData::Json(_) => None,
        }
    }
}

/// A single event decoded from the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub event_type: String,
    pub data: EventData,
}

/// Interpretation of one complete frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFrame {
    /// A frame with data, ready for delivery.
    Event(StreamEvent),
    /// A frame with neither `event:` nor `data:` fields, such as the
    /// `:keepalive` comment.
    KeepAlive,
    /// A frame that named an event type but carried no data. It is not
    /// delivered.
    Dropped { event_type: String },
    /// An incomplete frame outgrew the buffer limit. Its bytes were
    /// discarded and the remainder of the frame is skipped.
    Overflow { discarded: usize },
}

/// Buffering frame extractor. One parser per connection.
#[derive(Debug)]
pub struct FrameParser {
    buffer: Vec<u8>,
    /// Offset below which `buffer` is known to hold no terminator.
    scan_from: usize,
    max_pending: usize,
    /// Set after an overflow until the oversized frame's terminator is seen.
    skipping: bool,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_PENDING)
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that holds at most `max_pending` bytes of an incomplete frame.
    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scan_from: 0,
            max_pending: max_pending.max(FRAME_TERMINATOR.len()),
            skipping: false,
        }
    }

    /// Append a chunk and return every frame it completed, in stream order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ParsedFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(end) = find_terminator(&self.buffer, self.scan_from) {
            let raw: Vec<u8> = self.buffer.drain(..end + FRAME_TERMINATOR.len()).collect();
            self.scan_from = 0;
            if self.skipping {
                self.skipping = false;
                continue;
            }
            let text = String::from_utf8_lossy(&raw[..end]);
            frames.push(parse_frame(&text));
        }

        // Keep the last byte of a terminator that may straddle the next chunk.
        let keep = FRAME_TERMINATOR.len() - 1;
        if self.buffer.len() > self.max_pending {
            let discarded = self.buffer.len() - keep;
            self.buffer.drain(..discarded);
            if !self.skipping {
                frames.push(ParsedFrame::Overflow { discarded });
                self.skipping = true;
            }
        }
        self.scan_from = self.buffer.len().saturating_sub(keep);

        frames
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn find_terminator(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(FRAME_TERMINATOR.len())
        .position(|window| window == FRAME_TERMINATOR)
        .map(|pos| pos + from)
}

/// Interpret the text of one frame (without its terminating blank line).
///
/// `event:` lines set the type; `data:` lines are trimmed and joined with
/// `\n`. Data that parses as JSON is delivered as [`EventData::Json`],
/// anything else as [`EventData::Text`].
pub fn parse_frame(text: &str) -> ParsedFrame {
    let mut event_type: Option<String> = None;
    let mut data = String::new();
    let mut saw_data_field = false;

    for line in text.split('\n') {
        if let Some(rest) = line.strip_prefix(EVENT_FIELD) {
            event_type = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(DATA_FIELD) {
            saw_data_field = true;
            let chunk = rest.trim();
            if data.is_empty() {
                data.push_str(chunk);
            } else {
                data.push('\n');
                data.push_str(chunk);
            }
        }
    }

    if event_type.is_none() && !saw_data_field {
        return ParsedFrame::KeepAlive;
    }

    let event_type = event_type.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());
    if data.is_empty() {
        return ParsedFrame::Dropped { event_type };
    }

    let data = match serde_json::from_str(&data) {
        Ok(value) => EventData::Json(value),
        Err(_) => EventData::Text(data),
    };
    ParsedFrame::Event(StreamEvent { event_type, data })
}
