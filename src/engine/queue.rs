//! Per-connection input queues with fair round-robin draining.
//!
//! Raw lines arrive faster than the single mutation task consumes them; each
//! connection gets its own FIFO and the scheduler of the engine loop pops one
//! line per connection in rotation, so a paste-happy session cannot starve
//! the others.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    queues: BTreeMap<ConnectionId, VecDeque<String>>,
    /// Rotation cursor: the connection served by the previous pop.
    last_served: Option<ConnectionId>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_connection(&mut self, conn: ConnectionId) {
        self.queues.entry(conn).or_default();
    }

    pub fn remove_connection(&mut self, conn: ConnectionId) {
        self.queues.remove(&conn);
        if self.last_served == Some(conn) {
            self.last_served = None;
        }
    }

    pub fn push(&mut self, conn: ConnectionId, line: String) {
        self.queues.entry(conn).or_default().push_back(line);
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Pop the next line, rotating fairly across connections: scanning starts
    /// just past the connection served last time.
    pub fn pop(&mut self) -> Option<(ConnectionId, String)> {
        let ids: Vec<ConnectionId> = self.queues.keys().copied().collect();
        if ids.is_empty() {
            return None;
        }
        let start = match self.last_served {
            Some(last) => ids.iter().position(|c| *c == last).map(|i| i + 1).unwrap_or(0),
            None => 0,
        };
        for offset in 0..ids.len() {
            let conn = ids[(start + offset) % ids.len()];
            if let Some(queue) = self.queues.get_mut(&conn) {
                if let Some(line) = queue.pop_front() {
                    self.last_served = Some(conn);
                    return Some((conn, line));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_across_connections() {
        let mut queue = CommandQueue::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        queue.push(a, "a1".into());
        queue.push(a, "a2".into());
        queue.push(b, "b1".into());
        queue.push(b, "b2".into());

        let mut order = Vec::new();
        while let Some((conn, line)) = queue.pop() {
            order.push((conn, line));
        }
        assert_eq!(order.len(), 4);
        // Connections alternate instead of draining one queue first.
        assert_ne!(order[0].0, order[1].0);
        assert_ne!(order[1].0, order[2].0);
    }

    #[test]
    fn removed_connection_drops_pending_lines() {
        let mut queue = CommandQueue::new();
        let a = ConnectionId::new();
        queue.push(a, "never".into());
        queue.remove_connection(a);
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }
}
