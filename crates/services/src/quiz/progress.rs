/// Snapshot of a running session, useful for a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub score: u32,
    pub remaining_secs: u32,
    /// Position of the current question as a percentage of the session.
    pub percent_through: u32,
    pub is_completed: bool,
}
