//! Goal poll bookkeeping.
//!
//! The interim goal is checked by a cooperative poll: the host calls
//! [`SessionClock::tick`](super::SessionClock::tick) at its refresh cadence.
//! The poll is armed only while the session is running. Arming an armed poll
//! is a no-op, so a host that re-schedules on every resume can never end up
//! with two pending polls.

/// Identifies one armed period of the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket(u64);

#[derive(Debug, Default)]
pub struct GoalPoll {
    armed: Option<PollTicket>,
    generation: u64,
}

impl GoalPoll {
    /// Arm the poll. Returns `false` when it was already armed.
    pub fn arm(&mut self) -> bool {
        if self.armed.is_some() {
            return false;
        }
        self.generation += 1;
        self.armed = Some(PollTicket(self.generation));
        true
    }

    /// Cancel any pending poll. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Ticket of the current armed period, if any.
    pub fn ticket(&self) -> Option<PollTicket> {
        self.armed
    }

    /// Whether `ticket` still belongs to the current armed period.
    ///
    /// A host holding a ticket from before a pause sees it go stale.
    pub fn is_current(&self, ticket: PollTicket) -> bool {
        self.armed == Some(ticket)
    }

    /// Number of times the poll has been armed.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
