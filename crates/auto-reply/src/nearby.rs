//! Proximity addressing: a player standing close to the bot and looking at it
//! talks to it without a trigger word.

use {parley_channels::Pose, parley_config::NearbyConfig};

/// Whether `player` is within `radius` of `bot` and faces it within
/// `max_angle_degrees`.
///
/// Distance is measured in 3-D. The angle is taken on the horizontal plane
/// between the player's facing vector `(-sin yaw, -cos yaw)` and the
/// direction to the bot; a player standing exactly above or below the bot
/// counts as facing it.
#[must_use]
pub fn is_facing(player: &Pose, bot: &Pose, radius: f64, max_angle_degrees: f64) -> bool {
    let (dx, dy, dz) = (bot.x - player.x, bot.y - player.y, bot.z - player.z);
    if (dx * dx + dy * dy + dz * dz).sqrt() > radius {
        return false;
    }
    let horizontal = (dx * dx + dz * dz).sqrt();
    if horizontal <= f64::EPSILON {
        return true;
    }
    let (fx, fz) = (-player.yaw.sin(), -player.yaw.cos());
    let cos = ((fx * dx + fz * dz) / horizontal).clamp(-1.0, 1.0);
    cos.acos().to_degrees() <= max_angle_degrees
}

/// [`is_facing`] with the configured thresholds.
#[must_use]
pub fn addressed_by_proximity(config: &NearbyConfig, player: &Pose, bot: &Pose) -> bool {
    is_facing(player, bot, config.radius, config.max_angle_degrees)
}
