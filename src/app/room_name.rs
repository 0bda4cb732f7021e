use crate::game::types::RoomId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

pub const MAX_ROOM_SLUG_LENGTH: usize = 32;
const ROOM_ID_SUFFIX_LENGTH: usize = 10;
const FALLBACK_SLUG: &str = "room";

pub fn sanitize_room_name(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len().min(MAX_ROOM_SLUG_LENGTH));
    for ch in value.trim().chars() {
        if cleaned.len() >= MAX_ROOM_SLUG_LENGTH {
            break;
        }
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            cleaned.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() && !cleaned.ends_with('-') {
            cleaned.push('-');
        }
    }
    let cleaned = cleaned.trim_matches('-').to_string();
    if cleaned.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        cleaned
    }
}

/// `{slug}-{suffix}` where the suffix hashes the raw name with `nonce`.
/// Only URL-safe characters end up in the id.
pub fn derive_room_id(name: &str, nonce: u64) -> RoomId {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest = URL_SAFE_NO_PAD.encode(hasher.finalize());
    let suffix = &digest[..ROOM_ID_SUFFIX_LENGTH];
    RoomId::new(format!("{}-{}", sanitize_room_name(name), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_slug_characters() {
        assert_eq!(sanitize_room_name("  Cozy Corner!  "), "cozy-corner");
        assert_eq!(sanitize_room_name("team_42-dev"), "team_42-dev");
        assert_eq!(sanitize_room_name("***"), "room");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_room_name(&long).len(), MAX_ROOM_SLUG_LENGTH);
    }

    #[test]
    fn derivation_is_deterministic_per_nonce() {
        assert_eq!(derive_room_id("Lobby", 7), derive_room_id("Lobby", 7));
        assert_ne!(derive_room_id("Lobby", 7), derive_room_id("Lobby", 8));
    }

    #[test]
    fn derived_id_is_url_safe() {
        let id = derive_room_id("My Room / 2", 99);
        assert!(id.as_str().starts_with("my-room-2-"));
        assert!(id
            .as_str()
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }
}
