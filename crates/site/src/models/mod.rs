//! Domain models for the site.

pub mod blog_post;
pub mod comment;
pub mod identity;
pub mod message;
pub mod profile;
pub mod project;
pub mod session;

pub use blog_post::{BlogPost, BlogPostInput, resolve_published_at};
pub use comment::{Comment, CommentWithPost, NewComment};
pub use identity::{CurrentAdmin, CurrentUser, UserIdentity};
pub use message::{Message, NewMessage};
pub use profile::Profile;
pub use project::{Project, ProjectInput};
pub use session::{CookieUpdate, SESSION_COOKIE_NAME, SessionCookie, SessionToken};
