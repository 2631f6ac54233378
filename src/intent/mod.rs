//! Natural-language command layer. A provider turns a request plus a context
//! snapshot into a reply document; the dispatcher validates it into a closed
//! operation set and runs it against the stores. Failures anywhere along that
//! path become chat error turns, never propagated errors.

pub mod context;
pub mod dispatch;
pub mod provider;
pub mod reply;

pub use context::build_context;
pub use dispatch::{ActionReport, ChatTurn, Interpreter, Stores, DEFAULT_RECEIPT_CONFIDENCE};
pub use provider::{DocumentGuess, IntentProvider, ProviderError};
pub use reply::{parse_reply, IntentOperation, IntentReply, ReplyParseError};
