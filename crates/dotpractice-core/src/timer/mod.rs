mod clock;
mod environment;
mod poll;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use environment::{EnvironmentError, FocusEnvironment, Headless};
pub use poll::{GoalPoll, PollTicket};
pub use session::{CompletedSession, SessionClock, SessionPlan, SessionStatus};
