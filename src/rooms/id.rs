//! Room identifiers and shareable room paths

use rand::Rng;

const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}

/// Fresh room identifier, e.g. `k3x9-ab12`
pub fn generate_room_id() -> String {
    format!("{}-{}", random_string(4), random_string(4))
}

/// Encode an end-to-end encryption passphrase for the URL fragment
pub fn encode_passphrase(passphrase: &str) -> String {
    urlencoding::encode(passphrase).into_owned()
}

/// Decode a passphrase taken from the URL fragment
pub fn decode_passphrase(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

/// Path of a brand-new room, carrying the passphrase in the fragment when set
pub fn new_room_path(passphrase: Option<&str>) -> String {
    let room_id = generate_room_id();
    match passphrase {
        Some(passphrase) => format!("/rooms/{}#{}", room_id, encode_passphrase(passphrase)),
        None => format!("/rooms/{}", room_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_shape() {
        let id = generate_room_id();
        assert_eq!(id.len(), 9);
        let (left, right) = id.split_once('-').unwrap();
        assert_eq!(left.len(), 4);
        assert_eq!(right.len(), 4);
        assert!(left
            .chars()
            .chain(right.chars())
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_room_ids_differ() {
        assert_ne!(generate_room_id(), generate_room_id());
    }

    #[test]
    fn test_passphrase_encoding() {
        let encoded = encode_passphrase("секрет & co");
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('&'));
        assert_eq!(decode_passphrase(&encoded).as_deref(), Some("секрет & co"));
    }

    #[test]
    fn test_new_room_path() {
        let plain = new_room_path(None);
        assert!(plain.starts_with("/rooms/"));
        assert!(!plain.contains('#'));

        let secured = new_room_path(Some("pass word"));
        let (_, fragment) = secured.split_once('#').unwrap();
        assert_eq!(fragment, "pass%20word");
    }
}
