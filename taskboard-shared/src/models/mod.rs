/// Typed records for the board
///
/// Each model wraps the document API of [`crate::store::EntityStore`] with
/// serde conversion, in the form `Model::create(store, NewModel)`.
///
/// # Models
///
/// - `user`: registered users, keyed by external identity id
/// - `project`: project boards and their enrollment codes
/// - `membership`: collaborator access to a project ("joined projects")
/// - `task`: task cards, status and priority
/// - `event`: time-bounded groupings of tasks
/// - `comment`: append-only task discussion
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{NewTask, Priority, Task, TaskStatus};
/// use taskboard_shared::store::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let task = Task::create(&store, NewTask {
///     name: "Write release notes".to_string(),
///     short_description: String::new(),
///     status: TaskStatus::Pending,
///     priority_range: Priority::High,
///     owner_id: "user-1".to_string(),
///     project_id: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod event;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
