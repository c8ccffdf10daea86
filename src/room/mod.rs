//! Room-level plumbing around the game session: collaborator ports,
//! the state gateway, and the serialized operation surface.

pub mod manager;
pub mod membership;
pub mod notify;
pub mod rules;
pub mod store;

pub use manager::RoomManager;
pub use membership::{Membership, MembershipError};
pub use notify::{Notifier, NotifyError, NullNotifier};
pub use rules::{RoomRules, RuleStore, RuleStoreError};
pub use store::{InMemorySessionStore, NO_VERSION, SessionStore, StoreError, VersionedSession};
