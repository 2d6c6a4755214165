use rand::{distributions::Alphanumeric, Rng};

pub fn generate_random_ascii_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates a random id used to correlate log lines of a single request across nodes
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    hex::encode(bytes)
}
