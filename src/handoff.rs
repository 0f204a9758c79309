//! Single-slot frame handoff between the simulation and render threads
//!
//! Frames travel over a `bounded(1)` channel, so the producer may run at most
//! one frame ahead: `publish` waits until the previous frame has been taken,
//! `take` waits until a new one is ready. `close` drops the close-signal
//! sender, which wakes both sides so their loops can exit.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select};

pub struct FrameHandoff<T> {
    frame_tx: Sender<T>,
    frame_rx: Receiver<T>,
    /// Never carries a message; disconnects on `close`
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
}

impl<T> Default for FrameHandoff<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameHandoff<T> {
    pub fn new() -> Self {
        let (frame_tx, frame_rx) = bounded(1);
        let (close_tx, close_rx) = bounded(0);
        Self {
            frame_tx,
            frame_rx,
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
        }
    }

    /// Hand over `frame`, blocking while the previous one is still pending.
    /// Returns false (dropping the frame) once the handoff is closed.
    pub fn publish(&self, frame: T) -> bool {
        if self.is_closed() {
            return false;
        }
        select! {
            send(self.frame_tx, frame) -> sent => sent.is_ok(),
            recv(self.close_rx) -> _ => false,
        }
    }

    /// Wait for the next frame. Returns `None` once closed and drained.
    pub fn take(&self) -> Option<T> {
        if let Ok(frame) = self.frame_rx.try_recv() {
            return Some(frame);
        }
        select! {
            recv(self.frame_rx) -> frame => frame.ok(),
            // A frame published just before the close is still handed out
            recv(self.close_rx) -> _ => self.frame_rx.try_recv().ok(),
        }
    }

    /// Take the pending frame if there is one, without waiting
    pub fn try_take(&self) -> Option<T> {
        self.frame_rx.try_recv().ok()
    }

    /// Stop the handoff and wake everyone waiting on it. A pending frame can
    /// still be taken.
    pub fn close(&self) {
        self.close_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.close_rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_frames_arrive_in_order() {
        let handoff = Arc::new(FrameHandoff::new());
        let producer = {
            let handoff = Arc::clone(&handoff);
            thread::spawn(move || {
                for i in 0..100u32 {
                    assert!(handoff.publish(i));
                }
                handoff.close();
            })
        };
        let mut received = Vec::new();
        while let Some(frame) = handoff.take() {
            received.push(frame);
        }
        producer.join().unwrap();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_producer_waits_for_consumer() {
        let handoff = Arc::new(FrameHandoff::new());
        assert!(handoff.publish(1));
        let producer = {
            let handoff = Arc::clone(&handoff);
            thread::spawn(move || handoff.publish(2))
        };
        thread::sleep(Duration::from_millis(50));
        // Second frame cannot overwrite the first
        assert!(!producer.is_finished());
        assert_eq!(handoff.take(), Some(1));
        assert!(producer.join().unwrap());
        assert_eq!(handoff.take(), Some(2));
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let handoff: Arc<FrameHandoff<u8>> = Arc::new(FrameHandoff::new());
        let consumer = {
            let handoff = Arc::clone(&handoff);
            thread::spawn(move || handoff.take())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!handoff.is_closed());
        handoff.close();
        assert_eq!(consumer.join().unwrap(), None);
        assert!(handoff.is_closed());
    }

    #[test]
    fn test_close_wakes_blocked_producer() {
        let handoff = Arc::new(FrameHandoff::new());
        assert!(handoff.publish(1));
        let producer = {
            let handoff = Arc::clone(&handoff);
            thread::spawn(move || handoff.publish(2))
        };
        thread::sleep(Duration::from_millis(20));
        handoff.close();
        assert!(!producer.join().unwrap());
        // Pending frame survives the close
        assert_eq!(handoff.take(), Some(1));
        assert_eq!(handoff.take(), None);
    }

    #[test]
    fn test_publish_after_close_is_refused() {
        let handoff = FrameHandoff::new();
        handoff.close();
        handoff.close();
        assert!(!handoff.publish(7));
        assert_eq!(handoff.take(), None);
    }

    #[test]
    fn test_try_take() {
        let handoff = FrameHandoff::new();
        assert_eq!(handoff.try_take(), None);
        assert!(handoff.publish("frame"));
        assert_eq!(handoff.try_take(), Some("frame"));
        assert_eq!(handoff.try_take(), None);
    }
}
