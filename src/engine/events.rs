use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
    mpsc,
};

/// Identifies an object that emits notifications, e.g. a transition or an animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a new process wide unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum NotificationKind {
    /// An animation wrapped around to its first frame.
    AnimationLoop,
    /// A non looping animation reached its last frame.
    AnimationEnd,
    /// A transition section became active.
    SectionStart,
    /// A transition section ran out of time.
    SectionEnd,
    /// A transition completed or was terminated.
    TransitionEnd,
}

/// A state change posted by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// The object that posted the notification.
    pub source: ObjectId,
    /// Caller supplied identifier of the source, if it was given one.
    pub tag: Option<Arc<str>>,
}

impl Notification {
    pub fn new(kind: NotificationKind, source: ObjectId, tag: Option<Arc<str>>) -> Self {
        Self { kind, source, tag }
    }

    #[inline]
    pub fn is(&self, kind: NotificationKind) -> bool {
        self.kind == kind
    }
}

/// Where engine objects post their notifications. Cloning a sink shares the same receiver.
#[derive(Clone, Debug, Default)]
pub struct EventSink {
    sender: Option<mpsc::Sender<Notification>>,
}

impl EventSink {
    /// Create a sink together with the receiver the host drains every frame.
    pub fn channel() -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A sink that drops everything posted to it.
    pub fn disconnected() -> Self {
        Self { sender: None }
    }

    pub fn post(&self, notification: Notification) {
        let Some(ref sender) = self.sender else {
            tracing::trace!(
                kind = %notification.kind,
                source = %notification.source,
                "Dropping notification, sink is disconnected",
            );
            return;
        };

        if let Err(mpsc::SendError(notification)) = sender.send(notification) {
            tracing::warn!(
                kind = %notification.kind,
                source = %notification.source,
                "Notification receiver is gone",
            );
        }
    }

    /// Convenience for posting a notification built from its parts.
    #[inline]
    pub fn notify(&self, kind: NotificationKind, source: ObjectId, tag: Option<&Arc<str>>) {
        self.post(Notification::new(kind, source, tag.cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ObjectId::next();
        let b = ObjectId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn channel_delivers_in_order() {
        let (sink, receiver) = EventSink::channel();
        let source = ObjectId::next();
        let tag: Arc<str> = Arc::from("intro");

        sink.notify(NotificationKind::SectionStart, source, Some(&tag));
        sink.clone().notify(NotificationKind::SectionEnd, source, None);

        let received: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Notification::new(NotificationKind::SectionStart, source, Some(tag)),
                Notification::new(NotificationKind::SectionEnd, source, None),
            ]
        );
    }

    #[test]
    fn disconnected_and_dropped_receivers_do_not_panic() {
        EventSink::disconnected().notify(NotificationKind::AnimationEnd, ObjectId::next(), None);

        let (sink, receiver) = EventSink::channel();
        drop(receiver);
        sink.notify(NotificationKind::AnimationEnd, ObjectId::next(), None);
    }

    #[test]
    fn kind_names() {
        assert_eq!(NotificationKind::TransitionEnd.to_string(), "TransitionEnd");
        let name: &'static str = NotificationKind::AnimationLoop.into();
        assert_eq!(name, "AnimationLoop");
    }
}
