mod progress;
mod session;
mod timer;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::SessionError;
pub use progress::QuizProgress;
pub use session::{Advance, DEFAULT_SUBJECT, DEFAULT_TITLE, QuizRequest, QuizSession, Submission};
pub use timer::{SessionTimer, SharedQuizSession, shared};
pub use view::{QuizResultId, QuizResultListItem, QuizResultsService};
pub use workflow::{QuizLoopService, QuizOptions};
