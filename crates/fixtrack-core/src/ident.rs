//! Minting for ticket identifiers.
//!
//! Two identifiers exist per ticket: an opaque `id` owned by the store, and
//! the human-facing `ticket_number` used for every external lookup. Both are
//! random; uniqueness of the ticket number is NOT guaranteed here — it is
//! enforced by the UNIQUE constraint in the store, and `create_ticket`
//! retries with a fresh candidate on collision.

use rand::Rng;

/// Default prefix for human-facing ticket numbers.
pub const DEFAULT_TICKET_PREFIX: &str = "FT";

/// Alphabet without visually ambiguous characters (no 0/O/1/I/L).
const TICKET_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTVWXYZ";
const TICKET_SUFFIX_LEN: usize = 6;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 12;

/// Mint a candidate ticket number, e.g. `FT-7K2M9Q`.
#[must_use]
pub fn mint_ticket_number(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TICKET_SUFFIX_LEN)
        .map(|_| char::from(TICKET_ALPHABET[rng.gen_range(0..TICKET_ALPHABET.len())]))
        .collect();
    format!("{prefix}-{suffix}")
}

/// Mint an opaque record id with the given prefix, e.g. `tk-4f9q0zj2m1x8`.
#[must_use]
pub fn mint_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("{prefix}-{body}")
}

/// Mint an opaque ticket id.
#[must_use]
pub fn mint_ticket_id() -> String {
    mint_id("tk")
}

/// Mint an opaque customer id.
#[must_use]
pub fn mint_customer_id() -> String {
    mint_id("cu")
}
