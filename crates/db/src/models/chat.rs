//! Chat room, membership, message, and flow-room link models.

use serde::Serialize;
use signoff_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `chat_rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatRoom {
    pub id: DbId,
    pub name: String,
    pub title: String,
    pub is_private: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `chat_room_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatRoomMember {
    pub id: DbId,
    pub room_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `chat_messages` table. `user_id` is NULL for system
/// messages posted by the workflow engine.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessage {
    pub id: DbId,
    pub room_id: DbId,
    pub user_id: Option<DbId>,
    pub message_type: String,
    pub content: String,
    pub created_at: Timestamp,
}

/// A row from the `approval_chat_rooms` link table (one per flow).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalChatRoom {
    pub id: DbId,
    pub flow_id: DbId,
    pub room_id: DbId,
    pub created_at: Timestamp,
}

/// Chat member role for workflow participants (submitter, approvers).
pub const ROOM_ROLE_MODERATOR: &str = "moderator";

/// Message type for engine-posted messages.
pub const MESSAGE_TYPE_SYSTEM: &str = "system";
