//! Permission names checked by the bridge.

/// Talk to the AI through trigger words.
pub const AI: &str = "user.ai";

/// Talk to the AI without cooldown.
pub const AI_NO_COOLDOWN: &str = "user.ainocd";

/// Manage other players' prompt modes.
pub const MODE_ADMIN: &str = "admin.gpt";
