//! Server-sent event decoding for streamed chat completions.

use std::io::BufRead;

use super::client::GroqError;
use super::types::StreamFrame;

/// Terminal payload sent by the backend after the last frame.
const DONE_MARKER: &str = "[DONE]";

/// Iterator over the text fragments of a streamed completion.
///
/// Reads `data:` lines from an SSE body and yields each non-empty
/// `choices[0].delta.content` in arrival order. Iteration ends at the `[DONE]`
/// marker or end of input. The first error ends the stream: it is yielded
/// once and every later call returns `None`.
pub struct SseFragments<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> SseFragments<R> {
    /// Wraps a buffered SSE body.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    fn fail(&mut self, error: GroqError) -> Option<Result<String, GroqError>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<R: BufRead> Iterator for SseFragments<R> {
    type Item = Result<String, GroqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => return self.fail(GroqError::Io(e)),
            }

            // Comments, event names and blank separators carry no payload
            let Some(data) = line.trim_end_matches(['\r', '\n']).strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();

            if data == DONE_MARKER {
                self.finished = true;
                return None;
            }

            match decode_frame(data) {
                Ok(Some(fragment)) => return Some(Ok(fragment)),
                Ok(None) => continue,
                Err(e) => return self.fail(e),
            }
        }
    }
}

/// Decodes one frame, returning its text fragment if it has one.
fn decode_frame(data: &str) -> Result<Option<String>, GroqError> {
    let frame: StreamFrame = serde_json::from_str(data).map_err(GroqError::Serialization)?;

    if let Some(error) = frame.error {
        return Err(GroqError::Api {
            message: error
                .message
                .unwrap_or_else(|| "unknown stream error".to_string()),
        });
    }

    Ok(frame
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}
