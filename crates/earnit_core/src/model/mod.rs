mod task;
mod user;

pub use task::{Repetitions, Task, TaskSpec};
pub use user::User;
