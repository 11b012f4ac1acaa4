//! Logic layer: one function per use case, validation first, then store calls.

pub mod pages;
pub mod postits;
pub mod stories;
pub mod users;
pub mod validation;

pub use pages::PageService;
pub use postits::PostitService;
pub use stories::{NewStory, StoryChanges, StoryService};
pub use users::{UserChanges, UserService};
