use rand::Rng;

// Ambiguous characters (0/o, 1/l) are left out of join codes
const CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
const ID_LENGTH: usize = 6;

pub fn generate_room_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

pub fn generate_unique_room_id<F>(exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let id = generate_room_id();
        if !exists(&id) {
            return id;
        }
    }
}
