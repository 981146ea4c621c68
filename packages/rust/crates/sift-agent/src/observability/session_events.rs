/// Closed set of `event = ...` ids emitted by the agent.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    SessionCreated,
    SessionMessagesAppended,
    SessionMessagesLoaded,
    SessionPrefixReplaced,
    SessionStatusChanged,
    SessionTurnCompleted,
    SessionStoreLoaded,
    SessionStoreCorrupt,
    RetrievalToolInvoked,
    RetrievalToolDegraded,
    ReasoningLoopStarted,
    ReasoningThinkCompleted,
    ReasoningProtocolRetry,
    ReasoningThinkerFailed,
    ReasoningDeadlineExceeded,
    ReasoningTruncated,
    ReasoningAborted,
    ReasoningAnswered,
    CompressionSkipped,
    CompressionApplied,
    CompressionOverBudget,
    CompressionSummarizerFailed,
    CompressionPrefixConflict,
    ToolRegistered,
    ToolDispatched,
    ToolArgsRejected,
    ToolFailed,
    ToolTimedOut,
    ToolNotFound,
}

impl SessionEvent {
    /// Every event, for registry checks.
    pub const ALL: [Self; 29] = [
        Self::SessionCreated,
        Self::SessionMessagesAppended,
        Self::SessionMessagesLoaded,
        Self::SessionPrefixReplaced,
        Self::SessionStatusChanged,
        Self::SessionTurnCompleted,
        Self::SessionStoreLoaded,
        Self::SessionStoreCorrupt,
        Self::RetrievalToolInvoked,
        Self::RetrievalToolDegraded,
        Self::ReasoningLoopStarted,
        Self::ReasoningThinkCompleted,
        Self::ReasoningProtocolRetry,
        Self::ReasoningThinkerFailed,
        Self::ReasoningDeadlineExceeded,
        Self::ReasoningTruncated,
        Self::ReasoningAborted,
        Self::ReasoningAnswered,
        Self::CompressionSkipped,
        Self::CompressionApplied,
        Self::CompressionOverBudget,
        Self::CompressionSummarizerFailed,
        Self::CompressionPrefixConflict,
        Self::ToolRegistered,
        Self::ToolDispatched,
        Self::ToolArgsRejected,
        Self::ToolFailed,
        Self::ToolTimedOut,
        Self::ToolNotFound,
    ];

    /// Stable dotted id, `<namespace>.<name>`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionCreated => "session.created",
            Self::SessionMessagesAppended => "session.messages.appended",
            Self::SessionMessagesLoaded => "session.messages.loaded",
            Self::SessionPrefixReplaced => "session.prefix.replaced",
            Self::SessionStatusChanged => "session.status.changed",
            Self::SessionTurnCompleted => "session.turn.completed",
            Self::SessionStoreLoaded => "session.store.loaded",
            Self::SessionStoreCorrupt => "session.store.corrupt",
            Self::RetrievalToolInvoked => "retrieval.tool.invoked",
            Self::RetrievalToolDegraded => "retrieval.tool.degraded",
            Self::ReasoningLoopStarted => "reasoning.loop.started",
            Self::ReasoningThinkCompleted => "reasoning.think.completed",
            Self::ReasoningProtocolRetry => "reasoning.protocol.retry",
            Self::ReasoningThinkerFailed => "reasoning.thinker.failed",
            Self::ReasoningDeadlineExceeded => "reasoning.deadline.exceeded",
            Self::ReasoningTruncated => "reasoning.loop.truncated",
            Self::ReasoningAborted => "reasoning.loop.aborted",
            Self::ReasoningAnswered => "reasoning.loop.answered",
            Self::CompressionSkipped => "compression.skipped",
            Self::CompressionApplied => "compression.applied",
            Self::CompressionOverBudget => "compression.over_budget",
            Self::CompressionSummarizerFailed => "compression.summarizer.failed",
            Self::CompressionPrefixConflict => "compression.prefix.conflict",
            Self::ToolRegistered => "tool.registered",
            Self::ToolDispatched => "tool.dispatched",
            Self::ToolArgsRejected => "tool.args.rejected",
            Self::ToolFailed => "tool.failed",
            Self::ToolTimedOut => "tool.timed_out",
            Self::ToolNotFound => "tool.not_found",
        }
    }
}
