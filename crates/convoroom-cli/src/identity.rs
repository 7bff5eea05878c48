//! Display names and room names.

use convoroom_proto::RoomId;
use rand::Rng;

const ADJECTIVES: [&str; 15] = [
    "Happy", "Clever", "Brave", "Curious", "Gentle", "Witty", "Calm", "Lively", "Bright", "Bold",
    "Kind", "Smart", "Quick", "Wise", "Proud",
];

const NOUNS: [&str; 15] = [
    "Panda", "Tiger", "Eagle", "Dolphin", "Wolf", "Fox", "Lion", "Falcon", "Rabbit", "Turtle",
    "Owl", "Hawk", "Bear", "Deer", "Koala",
];

const ROOM_ID_LEN: usize = 6;

const ROOM_ID_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `<Adjective><Noun><0..99>`, e.g. `CleverOwl42`.
pub fn generate_username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let number: u8 = rng.gen_range(0..100);
    format!("{adjective}{noun}{number}")
}

/// Six uppercase base36 characters.
pub fn generate_room_id<R: Rng + ?Sized>(rng: &mut R) -> RoomId {
    let id: String = (0..ROOM_ID_LEN)
        .map(|_| char::from(ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())]))
        .collect();
    RoomId::new(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn usernames_follow_pattern() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let name = generate_username(&mut rng);
            let adjective = ADJECTIVES.iter().find(|a| name.starts_with(*a)).unwrap();
            let rest = &name[adjective.len()..];
            let noun = NOUNS.iter().find(|n| rest.starts_with(*n)).unwrap();
            let number: u32 = rest[noun.len()..].parse().unwrap();
            assert!(number < 100);
        }
    }

    #[test]
    fn room_ids_are_six_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(9);
        let id = generate_room_id(&mut rng);
        assert_eq!(id.as_str().len(), 6);
        assert!(id.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(!id.is_temporary());
    }
}
