//! V1 API handlers.
//!
//! JSON facade over the store and the messaging gateway. Send/admin
//! operations answer with a `DeliveryResult` body whatever happened; store
//! operations answer with the record or a 404.

mod admin;
mod messages;
mod send;

pub use admin::{
    cancel_default_rich_menu, create_rich_menu, delete_rich_menu, get_webhook_endpoint,
    leave_group, leave_room, link_user_rich_menu, set_default_rich_menu, set_webhook_endpoint,
    test_webhook_endpoint, unlink_user_rich_menu,
};
pub use messages::{add_message, edit_message, get_message, list_messages};
pub use send::{
    broadcast, multicast, reply, send_audio, send_card, send_image, send_location, send_sticker,
    send_text, send_video,
};
