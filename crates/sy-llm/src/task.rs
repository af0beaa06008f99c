//! Task-type classification for backend selection.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ChatMessage, Role, TaskType};

/// Keyword groups in priority order. Whole-word matches only, so "show"
/// does not count as "how" and "explanation" does not count as "plan".
static TASK_SIGNALS: LazyLock<Vec<(TaskType, Regex)>> = LazyLock::new(|| {
    [
        (TaskType::Planning, r"\b(plan|planning|strategy|approach|architecture)\b"),
        (TaskType::Debugging, r"\b(fix|bug|bugs|error|errors|debug|debugging)\b"),
        (TaskType::Refactoring, r"\b(refactor|refactoring|rename|restructure|clean\s+up)\b"),
        (TaskType::CodeReview, r"\b(review|check|analyze|analyse|examine)\b"),
        (TaskType::CodeGeneration, r"\b(write|create|implement|generate)\b"),
        (TaskType::Explanation, r"\b(explain|what|how|why)\b"),
    ]
    .into_iter()
    .map(|(task, pattern)| (task, Regex::new(&format!("(?i){pattern}")).unwrap()))
    .collect()
});

/// Classify from the last user message; `CodeAnalysis` when nothing matches
/// or there is no user message.
pub fn classify_task_type(messages: &[ChatMessage]) -> TaskType {
    let Some(last_user) = messages.iter().rev().find(|m| m.role == Role::User) else {
        return TaskType::CodeAnalysis;
    };
    TASK_SIGNALS
        .iter()
        .find(|(_, re)| re.is_match(&last_user.content))
        .map(|(task, _)| *task)
        .unwrap_or(TaskType::CodeAnalysis)
}
