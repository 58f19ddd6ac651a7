use rand::Rng;
use rand::seq::SliceRandom;

const BOT_NAMES: &[&str] = &[
    "Nova", "Rook", "Ember", "Vex", "Quill", "Juno", "Onyx", "Sable", "Kestrel", "Mire",
];

/// `bytes` random bytes rendered as lowercase hex.
pub(crate) fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    hex::encode(buf)
}

pub(crate) fn bot_display_name() -> String {
    let name = BOT_NAMES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Bot");
    format!("{name} (bot)")
}
