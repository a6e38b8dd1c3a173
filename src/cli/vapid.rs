use crate::notify::VapidKeys;

/// Env file lines for a key pair.
pub fn env_lines(keys: &VapidKeys) -> String {
    format!(
        "VAPID_PUBLIC_KEY={}\nVAPID_PRIVATE_KEY={}",
        keys.public_key_base64url(),
        keys.private_key_base64url()
    )
}

pub fn run() {
    let keys = VapidKeys::generate();
    println!("{}", env_lines(&keys));
}
