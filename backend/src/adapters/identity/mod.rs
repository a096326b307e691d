//! User identity adapters.
//!
//! - `TelegramInitDataValidator` - verifies signed Telegram WebApp `initData`
//! - `TrustedHeaderValidator` - accepts `X-User-Id` as forwarded by a
//!   trusted proxy; development and private deployments only

mod telegram;
mod trusted_header;

pub use telegram::{sign_init_data, TelegramInitDataValidator, INIT_DATA_HEADER};
pub use trusted_header::{TrustedHeaderValidator, USER_ID_HEADER};
