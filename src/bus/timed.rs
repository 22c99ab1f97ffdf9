//! Bounded-time reads on a dedicated reader thread.
//!
//! Bus reads block until the sensor answers. The reader thread owns the
//! underlying source and performs one read per request; the caller waits on
//! the reply channel with a timeout so a stalled sensor surfaces as
//! [`BusError::Timeout`] instead of hanging the agent.

use crate::bus::types::{BusError, FrameSource};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// A frame source whose reads give up after a fixed timeout.
pub struct TimedSource {
    requests: Sender<()>,
    replies: Receiver<Result<Vec<u8>, BusError>>,
    timeout: Duration,
    stalled: bool,
}

impl TimedSource {
    /// Move `source` onto a reader thread.
    pub fn spawn<S>(mut source: S, timeout: Duration) -> Result<Self, BusError>
    where
        S: FrameSource + Send + 'static,
    {
        let (requests, request_rx) = bounded::<()>(1);
        let (reply_tx, replies) = bounded(1);

        thread::Builder::new()
            .name("sensor-bus".to_string())
            .spawn(move || {
                while request_rx.recv().is_ok() {
                    if reply_tx.send(source.read_raw()).is_err() {
                        break;
                    }
                }
                tracing::debug!("Sensor bus reader exiting");
            })
            .map_err(|e| BusError::Transport(format!("could not start reader thread: {e}")))?;

        Ok(Self {
            requests,
            replies,
            timeout,
            stalled: false,
        })
    }
}

impl FrameSource for TimedSource {
    fn read_raw(&mut self) -> Result<Vec<u8>, BusError> {
        // A late reply from a timed-out read would pair with the wrong request.
        if self.stalled {
            return Err(BusError::Timeout(self.timeout));
        }

        self.requests.send(()).map_err(|_| BusError::Disconnected)?;

        match self.replies.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.stalled = true;
                Err(BusError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(BusError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::replay::ReplaySource;

    /// Never answers within any reasonable timeout.
    struct StuckSource;

    impl FrameSource for StuckSource {
        fn read_raw(&mut self) -> Result<Vec<u8>, BusError> {
            thread::sleep(Duration::from_secs(5));
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_reads_pass_through() {
        let replay = ReplaySource::from_frames(vec![vec![1, 2], vec![3]], false);
        let mut timed = TimedSource::spawn(replay, Duration::from_secs(1)).unwrap();
        assert_eq!(timed.read_raw().unwrap(), vec![1, 2]);
        assert_eq!(timed.read_raw().unwrap(), vec![3]);
        assert_eq!(timed.read_raw(), Err(BusError::Exhausted));
    }

    #[test]
    fn test_stalled_read_times_out() {
        let timeout = Duration::from_millis(50);
        let mut timed = TimedSource::spawn(StuckSource, timeout).unwrap();
        assert_eq!(timed.read_raw(), Err(BusError::Timeout(timeout)));
        // Stays failed rather than picking up the late reply.
        assert_eq!(timed.read_raw(), Err(BusError::Timeout(timeout)));
    }
}
