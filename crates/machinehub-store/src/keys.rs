//! Device storage keys.
//!
//! Centralising key names prevents typos and makes it easy to find every
//! key the agent persists.

/// Bearer token of the signed-in user.
pub const TOKEN: &str = "token";

/// Whether a user is signed in (`"true"` / `"false"`).
pub const AUTH: &str = "auth";

/// Role string of the signed-in user.
pub const ROLE: &str = "role";

/// JSON array of assigned machine ids.
pub const ASSIGNED_MACHINE_IDS: &str = "assignedMachineIds";

/// Legacy single assigned machine id, read when the array is absent.
pub const ASSIGNED_MACHINE_ID: &str = "assignedMachineId";

/// Unread cursor: instant the notification feed was last seen.
pub const NOTIFICATIONS_LAST_SEEN: &str = "notifications_last_seen";

/// Whether the feed filter is "today only" (`"true"` / `"false"`).
pub const NOTIFICATIONS_TODAY: &str = "notifications_today";

/// Explicit feed range lower bound, local `YYYY-MM-DD`.
pub const NOTIFICATIONS_FROM: &str = "notifications_from";

/// Explicit feed range upper bound, local `YYYY-MM-DD`.
pub const NOTIFICATIONS_TO: &str = "notifications_to";

/// Cached coin value map keyed by machine type.
pub const COIN_VALUES_BY_TYPE: &str = "coinValuesByType";
