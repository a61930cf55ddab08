/// Board services
///
/// Each service validates its input, performs the store calls, and returns a
/// typed record or a [`crate::error::BoardError`]. Services are free
/// functions over `&dyn EntityStore` and hold no state of their own.
///
/// - `membership`: enrollment codes, project creation, join/leave
/// - `lifecycle`: task creation, partial update, drag-and-drop
/// - `comments`: per-task discussion
/// - `events`: time-bounded task groupings
/// - `users`: user registration and lookup

pub mod comments;
pub mod events;
pub mod lifecycle;
pub mod membership;
pub mod users;
