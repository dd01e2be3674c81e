// Chat transport — the WhatsApp side of the bot.
//
// ChatTransport is the seam; GatewayTransport talks to a WhatsApp Web
// gateway sidecar over HTTP.

pub mod gateway;
pub mod traits;

pub use traits::{ChatInfo, ChatTransport, ContactInfo, InboundMessage, MessageKind};
