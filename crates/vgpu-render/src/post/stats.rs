use std::sync::atomic::{AtomicU64, Ordering};

use super::command::PostCommandKind;

/// Point-in-time copy of [`PostQueueStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PostQueueStatsSnapshot {
    pub posts: u64,
    pub viewports: u64,
    pub composes: u64,
    pub clears: u64,
    pub screenshots: u64,
    pub blocks: u64,
    pub exits: u64,
    pub callbacks_invoked: u64,
    /// Compositions issued while the previous one on the same target was still running.
    pub compose_target_busy: u64,
}

impl PostQueueStatsSnapshot {
    pub fn commands_executed(&self) -> u64 {
        self.posts
            + self.viewports
            + self.composes
            + self.clears
            + self.screenshots
            + self.blocks
            + self.exits
    }
}

/// Counters updated by the post worker and readable from any thread.
#[derive(Debug, Default)]
pub struct PostQueueStats {
    posts: AtomicU64,
    viewports: AtomicU64,
    composes: AtomicU64,
    clears: AtomicU64,
    screenshots: AtomicU64,
    blocks: AtomicU64,
    exits: AtomicU64,
    callbacks_invoked: AtomicU64,
    compose_target_busy: AtomicU64,
}

impl PostQueueStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_executed(&self, kind: PostCommandKind) {
        let counter = match kind {
            PostCommandKind::Post => &self.posts,
            PostCommandKind::Viewport => &self.viewports,
            PostCommandKind::Compose => &self.composes,
            PostCommandKind::Clear => &self.clears,
            PostCommandKind::Screenshot => &self.screenshots,
            PostCommandKind::Block => &self.blocks,
            PostCommandKind::Exit => &self.exits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_callbacks_invoked(&self) {
        self.callbacks_invoked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_compose_target_busy(&self) {
        self.compose_target_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PostQueueStatsSnapshot {
        PostQueueStatsSnapshot {
            posts: self.posts.load(Ordering::Relaxed),
            viewports: self.viewports.load(Ordering::Relaxed),
            composes: self.composes.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            screenshots: self.screenshots.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            exits: self.exits.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            compose_target_busy: self.compose_target_busy.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_commands() {
        let stats = PostQueueStats::new();
        stats.record_executed(PostCommandKind::Post);
        stats.record_executed(PostCommandKind::Post);
        stats.record_executed(PostCommandKind::Exit);
        stats.inc_callbacks_invoked();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.posts, 2);
        assert_eq!(snapshot.exits, 1);
        assert_eq!(snapshot.callbacks_invoked, 1);
        assert_eq!(snapshot.commands_executed(), 3);
        assert_eq!(snapshot.compose_target_busy, 0);
    }
}
