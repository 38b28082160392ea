use super::input::KeyStates;
use super::world::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Tick,
    RandomNumber,
    Keyboard,
    MouseClick,
    Collision,
    LabelClicked,
}

const CHANNEL_COUNT: usize = 6;

impl Channel {
    const fn index(self) -> usize {
        match self {
            Channel::Tick => 0,
            Channel::RandomNumber => 1,
            Channel::Keyboard => 2,
            Channel::MouseClick => 3,
            Channel::Collision => 4,
            Channel::LabelClicked => 5,
        }
    }
}

/// Tagged event payload. Events are ephemeral: built for one dispatch cycle
/// and dropped after every listener has been notified.
#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    RandomNumber { value: u8 },
    Keyboard { keys: KeyStates },
    MouseClick { x: f32, y: f32 },
    Collision { entity: ObjectId, block: ObjectId },
    LabelClicked { label: ObjectId },
}

impl Event {
    pub fn channel(&self) -> Channel {
        match self {
            Event::Tick => Channel::Tick,
            Event::RandomNumber { .. } => Channel::RandomNumber,
            Event::Keyboard { .. } => Channel::Keyboard,
            Event::MouseClick { .. } => Channel::MouseClick,
            Event::Collision { .. } => Channel::Collision,
            Event::LabelClicked { .. } => Channel::LabelClicked,
        }
    }
}

/// Named event channels with synchronous fan-out.
///
/// The bus holds no simulation state of its own: listeners are plain object
/// ids, so registration does not keep an object alive and an id whose object
/// has been removed is simply skipped at delivery time. An object must be
/// unregistered before removal if stale notifications matter.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: [Vec<ObjectId>; CHANNEL_COUNT],
    queue: Vec<Event>,
    side_queue: Vec<Event>,
}

impl EventBus {
    /// Appends a listener. There is no duplicate check: registering the same
    /// id twice on one channel yields two notifications per event.
    pub fn register(&mut self, channel: Channel, listener: ObjectId) {
        self.listeners[channel.index()].push(listener);
    }

    /// Removes the first matching registration; a no-op when absent.
    pub fn unregister(&mut self, channel: Channel, listener: ObjectId) {
        let list = &mut self.listeners[channel.index()];
        if let Some(position) = list.iter().position(|id| *id == listener) {
            list.remove(position);
        }
    }

    /// Enqueues the per-frame heartbeat events in fixed order: tick, then the
    /// random draw, then the keyboard snapshot, then everything raised onto
    /// the side queue since the previous frame (collision reactions and other
    /// one-off events dispatch behind the normal channels).
    pub fn publish_normal(&mut self, random_value: u8, keys: KeyStates) {
        self.queue.push(Event::Tick);
        self.queue.push(Event::RandomNumber {
            value: random_value,
        });
        self.queue.push(Event::Keyboard { keys });
        self.queue.append(&mut self.side_queue);
    }

    /// Pushes a one-off event onto the side queue, dispatched after the next
    /// frame's normal channels.
    pub fn publish(&mut self, event: Event) {
        self.side_queue.push(event);
    }

    /// Appends directly to the current frame's queue, behind whatever is
    /// already enqueued. Used for input events collected this frame.
    pub fn enqueue(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Synchronously notifies, for every queued event in enqueue order, every
    /// listener registered on that event's channel, then clears the queue.
    ///
    /// Dispatch is single-threaded and holds the bus mutably, so a listener
    /// cannot mutate the channel's listener list while its channel is being
    /// dispatched; reacting by raising new events is done by returning them
    /// from `deliver`, and those follow-ups are placed on the side queue.
    pub fn dispatch<F>(&mut self, mut deliver: F)
    where
        F: FnMut(ObjectId, &Event) -> Vec<Event>,
    {
        let queue = std::mem::take(&mut self.queue);
        for event in &queue {
            let listeners = self.listeners[event.channel().index()].clone();
            for listener in listeners {
                for follow_up in deliver(listener, event) {
                    self.side_queue.push(follow_up);
                }
            }
        }
    }
}
