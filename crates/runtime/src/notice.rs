use std::collections::BTreeMap;

/// Default lifetime of a transient notice, in milliseconds.
pub const NOTICE_TTL_MS: u64 = 5_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Shown {
    notice: Notice,
    visible: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct PendingClear<S> {
    due_ms: u64,
    slot: S,
}

/// Transient, self-clearing notices keyed by the control that raised them.
///
/// Every `show` schedules its own clear. A clear hides its slot when due even
/// if a newer notice has replaced the text since; overlapping notices race and
/// the earliest pending clear wins. The board never reads a clock: callers pass
/// `now_ms` and drive [`NoticeBoard::expire`] from their own timer.
#[derive(Debug)]
pub struct NoticeBoard<S> {
    ttl_ms: u64,
    slots: BTreeMap<S, Shown>,
    pending: Vec<PendingClear<S>>,
}

impl<S: Ord + Copy + std::fmt::Debug> Default for NoticeBoard<S> {
    fn default() -> Self {
        Self::new(NOTICE_TTL_MS)
    }
}

impl<S: Ord + Copy + std::fmt::Debug> NoticeBoard<S> {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            slots: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    /// Displays `notice` in `slot` and returns the time its clear is due.
    pub fn show(&mut self, slot: S, notice: Notice, now_ms: u64) -> u64 {
        let due_ms = now_ms.saturating_add(self.ttl_ms);
        tracing::debug!(?slot, kind = notice.kind.as_str(), message = %notice.message, "notice");
        self.slots.insert(
            slot,
            Shown {
                notice,
                visible: true,
            },
        );
        self.pending.push(PendingClear { due_ms, slot });
        due_ms
    }

    /// Applies every clear due at or before `now_ms`; returns the slots hidden.
    pub fn expire(&mut self, now_ms: u64) -> Vec<S> {
        let mut hidden = Vec::new();
        let mut keep = Vec::with_capacity(self.pending.len());
        for clear in self.pending.drain(..) {
            if clear.due_ms > now_ms {
                keep.push(clear);
                continue;
            }
            if let Some(shown) = self.slots.get_mut(&clear.slot)
                && shown.visible
            {
                shown.visible = false;
                hidden.push(clear.slot);
            }
        }
        self.pending = keep;
        hidden
    }

    #[cfg(test)]
    fn visible(&self, slot: S) -> Option<&Notice> {
        self.slots
            .get(&slot)
            .filter(|shown| shown.visible)
            .map(|shown| &shown.notice)
    }

    #[cfg(test)]
    fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|c| c.due_ms).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Slot {
        A,
        B,
    }

    #[test]
    fn notice_clears_after_ttl() {
        let mut board = NoticeBoard::new(5_000);
        assert_eq!(board.show(Slot::A, Notice::success("ok"), 1_000), 6_000);
        assert!(board.visible(Slot::A).is_some());

        assert!(board.expire(5_999).is_empty());
        assert_eq!(board.visible(Slot::A), Some(&Notice::success("ok")));

        assert_eq!(board.expire(6_000), vec![Slot::A]);
        assert!(board.visible(Slot::A).is_none());
        assert_eq!(board.slots.get(&Slot::A).map(|shown| &shown.notice), Some(&Notice::success("ok")));
        assert_eq!(board.next_deadline(), None);
    }

    #[test]
    fn earlier_clear_hides_newer_notice() {
        let mut board = NoticeBoard::new(5_000);
        board.show(Slot::A, Notice::error("first"), 0);
        board.show(Slot::A, Notice::success("second"), 3_000);
        assert_eq!(board.pending.len(), 2);

        // The first notice's clear fires and hides the second notice early.
        assert_eq!(board.expire(5_000), vec![Slot::A]);
        assert!(board.visible(Slot::A).is_none());
        assert_eq!(board.next_deadline(), Some(8_000));
        assert!(board.expire(8_000).is_empty());
    }

    #[test]
    fn slots_are_independent() {
        let mut board = NoticeBoard::default();
        board.show(Slot::A, Notice::success("a"), 0);
        board.show(Slot::B, Notice::error("b"), 4_000);
        assert_eq!(board.expire(NOTICE_TTL_MS), vec![Slot::A]);
        assert_eq!(board.visible(Slot::B).map(|n| n.kind), Some(NoticeKind::Error));
    }
}
