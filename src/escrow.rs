// 🔐 Escrow Stub - Simulated transaction identifiers
//
// No funds move and nothing leaves the process. The identifier only gives
// the user something to reference: "SOL_" + 10 uppercase hex characters.

pub const TRANSACTION_PREFIX: &str = "SOL_";
const ID_HEX_LEN: usize = 10;

/// Generate a simulated escrow transaction ID, e.g. "SOL_3F9A01C2BE"
pub fn generate_transaction_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", TRANSACTION_PREFIX, &hex[..ID_HEX_LEN])
}

/// Check the shape of a simulated transaction ID
pub fn is_transaction_id(id: &str) -> bool {
    id.strip_prefix(TRANSACTION_PREFIX)
        .map(|hex| {
            hex.len() == ID_HEX_LEN
                && hex
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        })
        .unwrap_or(false)
}
