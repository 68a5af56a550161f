/// Application entity module
pub mod app;
/// Event entity module
pub mod event;
/// Project entity module
pub mod project;

pub use app::Entity as App;
pub use event::Entity as Event;
pub use project::Entity as Project;
