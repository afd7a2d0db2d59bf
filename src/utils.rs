mod liveness;
mod log_error;
mod process;
mod split;
mod teloxide;

pub use liveness::{with_liveness, LIVENESS_INTERVAL};
pub use log_error::ResultExt;
pub use process::pipe_through;
pub use split::{split_long_message, TELEGRAM_MESSAGE_LIMIT};

pub use self::teloxide::BotExt;
