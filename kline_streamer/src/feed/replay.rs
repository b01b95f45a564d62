//! Drives a [`FeedHandler`] from recorded messages instead of a live socket.

use std::io::{self, BufRead};

use tracing::debug;

use crate::feed::FeedHandler;

/// Feeds each non-blank line of `reader` to `handler.on_message`.
///
/// Returns how many messages were delivered. Only read errors stop the replay;
/// bad messages are the handler's business.
pub fn replay<R: BufRead, H: FeedHandler>(reader: R, handler: &mut H) -> io::Result<usize> {
    let mut delivered = 0;
    for line in reader.lines() {
        let line = line?;
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        handler.on_message(raw);
        delivered += 1;
    }
    debug!(delivered, "replay finished");
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::feed::{FeedError, SubscriptionRequest};

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl FeedHandler for Recorder {
        fn on_connect(&mut self) -> SubscriptionRequest {
            SubscriptionRequest::subscribe(vec![], 1)
        }
        fn on_message(&mut self, raw: &str) {
            self.0.push(raw.to_string());
        }
        fn on_error(&mut self, _error: &FeedError) {}
        fn on_close(&mut self, _reason: Option<&str>) {}
    }

    #[test]
    fn skips_blank_lines_and_trims() {
        let input = "{\"a\":1}\n\n   \n  {\"b\":2}  \r\n";
        let mut rec = Recorder::default();
        let n = replay(Cursor::new(input), &mut rec).unwrap();
        assert_eq!(n, 2);
        assert_eq!(rec.0, vec!["{\"a\":1}", "{\"b\":2}"]);
    }
}
