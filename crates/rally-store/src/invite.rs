use rand::Rng;

pub const INVITE_CODE_LEN: usize = 6;

const INVITE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random invite code of uppercase letters and digits. Uniqueness is checked
/// by the caller against existing groups.
pub fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_CHARSET[rng.random_range(0..INVITE_CODE_CHARSET.len())] as char)
        .collect()
}
