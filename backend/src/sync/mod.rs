//! # Realtime Sync Module
//!
//! Adapter between a remote change stream and the aggregation layer. A
//! subscription watches three per-group collections (members, tasks, events);
//! each delivered snapshot replaces the matching local mirror wholesale, the
//! aggregates are recomputed from scratch, and the resulting view is published
//! to observers.
//!
//! There is no cross-collection ordering guarantee: a members snapshot and an
//! events snapshot can arrive in either order. The contract is eventual
//! consistency — once every collection has delivered at least once the view is
//! correct, and before that partial data shows up as zeros rather than
//! blocking.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::domain::aggregation_service::{member_totals_sorted, total_minutes_by_task, TaskMinutes};
use crate::domain::models::group::{clamp_color_index, Group, Member, Task, WorkLog};

/// A wholesale replacement for one watched collection.
#[derive(Debug, Clone)]
pub enum CollectionSnapshot {
    Members(Vec<Member>),
    Tasks(Vec<Task>),
    Events(Vec<WorkLog>),
}

/// Lifecycle of a group subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    /// Connected but not every collection has delivered yet
    Subscribing,
    Live,
    Error,
}

/// The published, always-consistent-with-itself view of one group.
#[derive(Debug, Clone)]
pub struct GroupView {
    pub group_id: String,
    pub state: SubscriptionState,
    pub members: Vec<Member>,
    pub tasks: Vec<Task>,
    pub events: Vec<WorkLog>,
    /// (user_id, display name, minutes), descending by minutes
    pub member_totals: Vec<(String, String, u64)>,
    pub task_totals: Vec<TaskMinutes>,
}

impl GroupView {
    fn initial(group_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            state: SubscriptionState::Subscribing,
            members: Vec::new(),
            tasks: Vec::new(),
            events: Vec::new(),
            member_totals: Vec::new(),
            task_totals: Vec::new(),
        }
    }
}

/// One running subscription; dropping or [`shutdown`](Self::shutdown)-ing it
/// stops the background task.
pub struct GroupSubscription {
    group_id: String,
    views: watch::Receiver<GroupView>,
    handle: tokio::task::JoinHandle<()>,
}

impl GroupSubscription {
    /// Spawn a subscription consuming deliveries for `group_id`. An `Err`
    /// delivery moves the subscription to the `Error` state and ends it; the
    /// stream closing cleanly moves it to `Unsubscribed`.
    pub fn start(
        group_id: &str,
        deliveries: mpsc::Receiver<Result<CollectionSnapshot, String>>,
    ) -> Self {
        let (tx, rx) = watch::channel(GroupView::initial(group_id));
        let id = group_id.to_string();
        let handle = tokio::spawn(run_subscription(id.clone(), deliveries, tx));
        info!("Subscribed to group {}", group_id);
        Self {
            group_id: id,
            views: rx,
            handle,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// A receiver for published views; cheap to clone and hand out.
    pub fn views(&self) -> watch::Receiver<GroupView> {
        self.views.clone()
    }

    /// Stop the subscription and wait for its task to finish.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
        debug!("Subscription for group {} torn down", self.group_id);
    }
}

async fn run_subscription(
    group_id: String,
    mut deliveries: mpsc::Receiver<Result<CollectionSnapshot, String>>,
    tx: watch::Sender<GroupView>,
) {
    let mut mirror = empty_mirror(&group_id);
    let mut delivered = DeliveredFlags::default();

    while let Some(delivery) = deliveries.recv().await {
        match delivery {
            Ok(snapshot) => {
                apply_snapshot(&mut mirror, &mut delivered, snapshot);
                let _ = tx.send(build_view(&group_id, &mirror, delivered.state()));
            }
            Err(message) => {
                warn!("Subscription for group {} failed: {}", group_id, message);
                let _ = tx.send(build_view(&group_id, &mirror, SubscriptionState::Error));
                return;
            }
        }
    }

    debug!("Snapshot stream for group {} closed", group_id);
    let _ = tx.send(build_view(&group_id, &mirror, SubscriptionState::Unsubscribed));
}

#[derive(Debug, Clone, Copy, Default)]
struct DeliveredFlags {
    members: bool,
    tasks: bool,
    events: bool,
}

impl DeliveredFlags {
    fn state(&self) -> SubscriptionState {
        if self.members && self.tasks && self.events {
            SubscriptionState::Live
        } else {
            SubscriptionState::Subscribing
        }
    }
}

fn apply_snapshot(mirror: &mut Group, delivered: &mut DeliveredFlags, snapshot: CollectionSnapshot) {
    match snapshot {
        CollectionSnapshot::Members(members) => {
            mirror.members = members;
            delivered.members = true;
        }
        CollectionSnapshot::Tasks(mut tasks) => {
            for task in &mut tasks {
                task.color_index = clamp_color_index(task.color_index);
            }
            mirror.tasks = tasks;
            delivered.tasks = true;
        }
        CollectionSnapshot::Events(events) => {
            mirror.events = events;
            delivered.events = true;
        }
    }
}

fn build_view(group_id: &str, mirror: &Group, state: SubscriptionState) -> GroupView {
    GroupView {
        group_id: group_id.to_string(),
        state,
        members: mirror.members.clone(),
        tasks: mirror.tasks.clone(),
        events: mirror.events.clone(),
        member_totals: member_totals_sorted(mirror),
        task_totals: total_minutes_by_task(mirror),
    }
}

/// A group shell holding only the three mirrored collections; the metadata
/// fields are never read by the aggregator.
fn empty_mirror(group_id: &str) -> Group {
    let epoch: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;
    Group {
        id: group_id.to_string(),
        code: String::new(),
        name: String::new(),
        description: String::new(),
        banner_image: String::new(),
        members: Vec::new(),
        tasks: Vec::new(),
        events: Vec::new(),
        completed_task_ids: BTreeSet::new(),
        created_by: String::new(),
        created_at: epoch,
        updated_at: epoch,
    }
}

/// Owns at most one live subscription and guarantees the previous one is torn
/// down before a new one starts, so a group switch can never leak stale data
/// into the new view.
#[derive(Default)]
pub struct SyncAdapter {
    active: Option<GroupSubscription>,
}

impl SyncAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_group_id(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.group_id())
    }

    /// Switch the adapter to `group_id`, returning a view receiver for it.
    pub async fn subscribe(
        &mut self,
        group_id: &str,
        deliveries: mpsc::Receiver<Result<CollectionSnapshot, String>>,
    ) -> watch::Receiver<GroupView> {
        if let Some(previous) = self.active.take() {
            info!(
                "Switching subscription from group {} to {}",
                previous.group_id(),
                group_id
            );
            previous.shutdown().await;
        }
        let subscription = GroupSubscription::start(group_id, deliveries);
        let views = subscription.views();
        self.active = Some(subscription);
        views
    }

    pub async fn unsubscribe(&mut self) {
        if let Some(subscription) = self.active.take() {
            subscription.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(user_id: &str, name: &str) -> Member {
        Member {
            user_id: user_id.to_string(),
            username: name.to_string(),
            avatar_image: String::new(),
            joined_at: Utc::now(),
        }
    }

    fn task(id: &str, name: &str, color_index: u8) -> Task {
        Task {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            color_index,
        }
    }

    fn event(user_id: &str, task_id: &str, task_name: &str, minutes: u32) -> WorkLog {
        WorkLog {
            id: format!("log::{}", minutes),
            task_id: task_id.to_string(),
            task_name: task_name.to_string(),
            description: String::new(),
            minutes,
            stars: 3,
            photo_image: String::new(),
            user_id: user_id.to_string(),
            user_name: String::new(),
            created_at: Utc::now(),
        }
    }

    async fn wait_for_state(
        rx: &mut watch::Receiver<GroupView>,
        state: SubscriptionState,
    ) -> GroupView {
        loop {
            if rx.borrow().state == state {
                return rx.borrow().clone();
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_eventual_consistency_regardless_of_arrival_order() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = GroupSubscription::start("G1", rx);
        let mut views = subscription.views();

        // events arrive before the roster does
        tx.send(Ok(CollectionSnapshot::Events(vec![
            event("a", "task::1", "Design", 60),
            event("b", "task::1", "Design", 30),
            event("a", "task::2", "Code", 45),
        ])))
        .await
        .unwrap();
        tx.send(Ok(CollectionSnapshot::Tasks(vec![
            task("task::1", "Design", 0),
            task("task::2", "Code", 1),
        ])))
        .await
        .unwrap();
        tx.send(Ok(CollectionSnapshot::Members(vec![
            member("a", "Ada"),
            member("b", "Ben"),
        ])))
        .await
        .unwrap();

        let view = wait_for_state(&mut views, SubscriptionState::Live).await;
        assert_eq!(view.member_totals[0], ("a".to_string(), "Ada".to_string(), 105));
        assert_eq!(view.member_totals[1], ("b".to_string(), "Ben".to_string(), 30));
        let design = view.task_totals.iter().find(|t| t.task_name == "Design").unwrap();
        assert_eq!(design.minutes, 90);

        subscription.shutdown().await;
    }

    #[tokio::test]
    async fn test_partial_data_shows_zeros_while_subscribing() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = GroupSubscription::start("G1", rx);
        let mut views = subscription.views();

        tx.send(Ok(CollectionSnapshot::Members(vec![
            member("a", "Ada"),
            member("b", "Ben"),
        ])))
        .await
        .unwrap();

        loop {
            views.changed().await.unwrap();
            if !views.borrow().members.is_empty() {
                break;
            }
        }
        let view = views.borrow().clone();
        assert_eq!(view.state, SubscriptionState::Subscribing);
        // roster present, totals zero-filled until events deliver
        assert_eq!(view.member_totals.len(), 2);
        assert!(view.member_totals.iter().all(|(_, _, m)| *m == 0));

        subscription.shutdown().await;
    }

    #[tokio::test]
    async fn test_task_color_clamped_on_read() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = GroupSubscription::start("G1", rx);
        let mut views = subscription.views();

        tx.send(Ok(CollectionSnapshot::Tasks(vec![task("task::1", "Design", 9)])))
            .await
            .unwrap();

        loop {
            views.changed().await.unwrap();
            if !views.borrow().tasks.is_empty() {
                break;
            }
        }
        assert_eq!(views.borrow().tasks[0].color_index, 3);

        subscription.shutdown().await;
    }

    #[tokio::test]
    async fn test_stream_error_ends_subscription() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = GroupSubscription::start("G1", rx);
        let mut views = subscription.views();

        tx.send(Err("connection reset".to_string())).await.unwrap();
        let view = wait_for_state(&mut views, SubscriptionState::Error).await;
        assert_eq!(view.state, SubscriptionState::Error);

        // the consuming task has exited, so further sends fail
        let closed = tx
            .send(Ok(CollectionSnapshot::Members(vec![])))
            .await
            .is_err();
        assert!(closed);

        subscription.shutdown().await;
    }

    #[tokio::test]
    async fn test_closed_stream_reports_unsubscribed() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = GroupSubscription::start("G1", rx);
        let mut views = subscription.views();

        drop(tx);
        let view = wait_for_state(&mut views, SubscriptionState::Unsubscribed).await;
        assert_eq!(view.state, SubscriptionState::Unsubscribed);
    }

    #[tokio::test]
    async fn test_switching_groups_tears_down_previous() {
        let mut adapter = SyncAdapter::new();

        let (tx1, rx1) = mpsc::channel(8);
        adapter.subscribe("G1", rx1).await;
        assert_eq!(adapter.current_group_id(), Some("G1"));

        let (_tx2, rx2) = mpsc::channel::<Result<CollectionSnapshot, String>>(8);
        let views2 = adapter.subscribe("G2", rx2).await;
        assert_eq!(adapter.current_group_id(), Some("G2"));
        assert_eq!(views2.borrow().group_id, "G2");

        // the old stream's consumer is gone, nothing from G1 can leak
        assert!(tx1
            .send(Ok(CollectionSnapshot::Members(vec![member("a", "Ada")])))
            .await
            .is_err());

        adapter.unsubscribe().await;
        assert_eq!(adapter.current_group_id(), None);
    }
}
