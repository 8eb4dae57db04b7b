pub mod tasks;

pub use tasks::{answer_analytics, answers_to_tasks, AnswerAnalytics, RemediationTasks, Task};
