use serde::{Deserialize, Serialize};

/// Raw stay timestamps as received from a client, resolved by
/// [`crate::resolve_stay`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StayParams {
    pub entry: String,
    pub exit: String,
    pub vehicle_category: Option<String>,
}
