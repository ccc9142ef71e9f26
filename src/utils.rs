//! Utility functions for generating client-side identifiers

use rand::Rng;

pub const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ORDER_NUMBER_LEN: usize = 10;

// a convenience code for the order form. not checked against existing orders, so not unique.
pub fn new_order_number() -> String {
    new_order_number_with(&mut rand::thread_rng())
}

pub fn new_order_number_with<R: Rng>(rng: &mut R) -> String {
    (0..ORDER_NUMBER_LEN)
        .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
        .collect()
}
