//! Permission system for checking user roles.
//!
//! Role lookups go through `getChatMember` and are cached per
//! (chat, user) so repeated admin commands don't hit the API.
//!
//! ```rust,ignore
//! if state.permissions.is_admin(chat_id, user_id).await? {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::Permissions;
