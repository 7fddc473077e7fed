//! This file serves as the root for all SeaORM entity modules.
//! Users own projects, projects own tasks, and a task may be assigned to
//! any user.

pub mod project;
pub mod task;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::project::Entity as Project;
    pub use super::task::Entity as Task;
    pub use super::user::Entity as User;
}
