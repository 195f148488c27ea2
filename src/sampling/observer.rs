use crate::register::Channel;

/// Callback receiving the scaled reading of a channel in volts
pub type Observer = Box<dyn FnMut(f32) + Send + 'static>;

/// Channel to observer table. Registration order is kept and defines the round-robin order of
/// the multi-channel mode.
#[derive(Default)]
pub(crate) struct ObserverTable {
    entries: Vec<(Channel, Observer)>,
}

impl ObserverTable {
    /// Register, replace or remove (`None`) the observer of `channel`. A replaced observer keeps
    /// its position in the order.
    pub fn set(&mut self, channel: Channel, observer: Option<Observer>) {
        let pos = self.entries.iter().position(|(c, _)| *c == channel);
        match (pos, observer) {
            (Some(idx), Some(observer)) => self.entries[idx].1 = observer,
            (Some(idx), None) => {
                self.entries.remove(idx);
            }
            (None, Some(observer)) => self.entries.push((channel, observer)),
            (None, None) => (),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    /// Next channel in registration order after `prev`. Starts over at the first registered
    /// channel when `prev` is `None` or no longer registered.
    pub fn next_after(&self, prev: Option<Channel>) -> Option<Channel> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = prev
            .and_then(|p| self.entries.iter().position(|(c, _)| *c == p))
            .map_or(0, |i| (i + 1) % self.entries.len());
        Some(self.entries[idx].0)
    }

    /// Invoke the observer of `channel`. Returns false if none is registered.
    pub fn dispatch(&mut self, channel: Channel, value: f32) -> bool {
        match self.entries.iter_mut().find(|(c, _)| *c == channel) {
            Some((_, observer)) => {
                observer(value);
                true
            }
            None => false,
        }
    }
}

/// Decides whether a reading differs enough from the last dispatched one to be reported.
///
/// The first reading of a channel is always a change. Afterwards a reading is a change if its
/// absolute distance to the last committed value exceeds the threshold.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    threshold: f32,
    last: [Option<f32>; 4],
}

impl ChangeDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last: [None; 4],
        }
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_change(&self, channel: Channel, value: f32) -> bool {
        match self.last[channel.index()] {
            Some(last) => (value - last).abs() > self.threshold,
            None => true,
        }
    }

    /// Record `value` as the last dispatched reading of `channel`
    pub fn commit(&mut self, channel: Channel, value: f32) {
        self.last[channel.index()] = Some(value);
    }

    pub fn last(&self, channel: Channel) -> Option<f32> {
        self.last[channel.index()]
    }
}
