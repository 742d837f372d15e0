//! WebSocket Transport
//!
//! Connects browser clients to the [`ChatHub`](crate::chat::ChatHub).
//!
//! Clients connect to `/ws`. Frames are JSON objects tagged by `type`:
//!
//! - client → server: `message`, `ack`, `ping`
//! - server → client: `users_list`, `user_connected`, `user_disconnected`,
//!   `chat`, `notification`, `greeting`, `pong`, `error`
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'greeting') {
//!     ws.send(JSON.stringify({
//!       type: 'ack',
//!       status: 'Received',
//!       message: 'Greeting message received loud and clear!',
//!       timestamp: new Date(),
//!     }));
//!   }
//! };
//!
//! ws.send(JSON.stringify({type: 'message', text: 'hi'}));
//! ```

mod handler;

pub use handler::websocket_handler;
