//! Contracts of the external showcase service.

use std::pin::Pin;
use std::task::{Context, Poll};

use credentials::SdkKey;
use foundation::{ModelSid, SweepId};
use futures::{Stream, StreamExt};
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectionError, ConversionError, LabelError, MoveError, QueryError};
use crate::idmap::IdentifierMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transition {
    #[default]
    #[serde(rename = "transition.fly")]
    Fly,
    #[serde(rename = "transition.fade")]
    Fade,
    #[serde(rename = "transition.instant")]
    Instant,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Fly => "transition.fly",
            Transition::Fade => "transition.fade",
            Transition::Instant => "transition.instant",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct MoveOptions {
    pub transition: Transition,
}

/// A connected showcase.
///
/// All futures run on the caller's (single) thread and need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait Showcase {
    async fn create_id_map(&self) -> Result<IdentifierMap, ConversionError>;

    /// `Ok(None)` when the showcase has no label for `sweep`.
    async fn label_for(&self, sweep: &SweepId) -> Result<Option<String>, LabelError>;

    async fn current_sweep(&self) -> Result<Option<SweepId>, QueryError>;

    /// Location change notifications for as long as the returned handle lives.
    fn subscribe_current_sweep(&self) -> Subscription;

    async fn move_to(&self, sweep: &SweepId, options: MoveOptions) -> Result<(), MoveError>;
}

#[allow(async_fn_in_trait)]
pub trait Connector {
    type Showcase: Showcase;

    async fn connect(
        &self,
        model: &ModelSid,
        key: &SdkKey,
    ) -> Result<Self::Showcase, ConnectionError>;
}

/// Producer half of a [`Subscription`].
#[derive(Debug, Clone)]
pub struct LocationSink(mpsc::UnboundedSender<SweepId>);

impl LocationSink {
    /// Returns `false` once the subscription has been dropped.
    pub fn push(&self, sweep: SweepId) -> bool {
        self.0.unbounded_send(sweep).is_ok()
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Stream of location changes. Dropping it unsubscribes from the showcase.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SweepId>,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn channel(cancel: impl FnOnce() + 'static) -> (LocationSink, Self) {
        let (tx, rx) = mpsc::unbounded();
        (
            LocationSink(tx),
            Self {
                rx,
                cancel: Some(Box::new(cancel)),
            },
        )
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

impl Stream for Subscription {
    type Item = SweepId;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<SweepId>> {
        self.get_mut().rx.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn transition_serializes_to_sdk_names() {
        let json = serde_json::to_string(&Transition::Fly).unwrap();
        assert_eq!(json, "\"transition.fly\"");
        let t: Transition = serde_json::from_str("\"transition.instant\"").unwrap();
        assert_eq!(t, Transition::Instant);
        assert_eq!(MoveOptions::default().transition.as_str(), "transition.fly");
    }

    #[test]
    fn subscription_yields_pushed_locations_in_order() {
        let (sink, mut sub) = Subscription::channel(|| {});
        assert!(sink.push(SweepId::new("a")));
        assert!(sink.push(SweepId::new("b")));
        let got = pollster::block_on(async {
            vec![sub.next().await.unwrap(), sub.next().await.unwrap()]
        });
        assert_eq!(got, vec![SweepId::new("a"), SweepId::new("b")]);
        assert_eq!(sub.next().now_or_never(), None);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        let (sink, sub) = Subscription::channel(move || flag.set(true));
        drop(sub);
        assert!(cancelled.get());
        assert!(sink.is_closed());
        assert!(!sink.push(SweepId::new("late")));
    }
}
