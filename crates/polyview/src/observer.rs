use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

/// Publish side of an observer channel. Every subscriber gets its own FIFO
/// queue; publishing never calls back into subscriber code, so a subscriber
/// can't re-enter the publisher.
#[derive(Debug)]
pub struct Subscribers<T> {
    senders: Vec<Sender<T>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<T: Clone> Subscribers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription<T> {
        let (sender, receiver) = unbounded();
        self.senders.push(sender);
        Subscription { receiver }
    }

    /// Deliver `value` to every live subscriber. Subscribers that have been
    /// dropped are forgotten here.
    pub fn publish(&mut self, value: T) {
        self.senders.retain(|sender| sender.send(value.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Receive side. Dropping it (or calling [`Subscription::unsubscribe`])
/// detaches it from the publisher.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn try_recv(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Only the newest queued value; older ones are discarded.
    pub fn latest(&self) -> Option<T> {
        self.receiver.try_iter().last()
    }

    pub fn unsubscribe(self) {}
}
