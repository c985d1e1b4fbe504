//! Repository for chat rooms, members, messages, and the flow-room link.
//!
//! Chat rows live in the same database as the workflow state, so the engine
//! writes them through `&mut PgConnection` inside its transactions. The
//! narrow interface here (create room, add member, post message) is all the
//! workflow core needs; the chat app's own transport is elsewhere.

use signoff_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::chat::{ApprovalChatRoom, ChatMessage, ChatRoom, ChatRoomMember};

/// Column list for chat_rooms queries.
const ROOM_COLUMNS: &str = "id, name, title, is_private, created_by, created_at, updated_at";

/// Column list for chat_room_members queries.
const MEMBER_COLUMNS: &str = "id, room_id, user_id, role, created_at, updated_at";

/// Column list for chat_messages queries.
const MESSAGE_COLUMNS: &str = "id, room_id, user_id, message_type, content, created_at";

/// Column list for approval_chat_rooms queries.
const LINK_COLUMNS: &str = "id, flow_id, room_id, created_at";

pub struct ChatRepo;

impl ChatRepo {
    /// Create a private room.
    pub async fn create_room(
        conn: &mut PgConnection,
        name: &str,
        title: &str,
        is_private: bool,
        created_by: DbId,
    ) -> Result<ChatRoom, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_rooms (name, title, is_private, created_by) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ROOM_COLUMNS}"
        );
        sqlx::query_as::<_, ChatRoom>(&query)
            .bind(name)
            .bind(title)
            .bind(is_private)
            .bind(created_by)
            .fetch_one(conn)
            .await
    }

    /// Get-or-create membership: adding an existing member is a no-op that
    /// returns the existing row unchanged.
    pub async fn add_member_if_absent(
        conn: &mut PgConnection,
        room_id: DbId,
        user_id: DbId,
        role: &str,
    ) -> Result<ChatRoomMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_room_members (room_id, user_id, role) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (room_id, user_id) DO UPDATE SET updated_at = chat_room_members.updated_at \
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, ChatRoomMember>(&query)
            .bind(room_id)
            .bind(user_id)
            .bind(role)
            .fetch_one(conn)
            .await
    }

    /// Post a message. `user_id = None` marks a system message.
    pub async fn post_message(
        conn: &mut PgConnection,
        room_id: DbId,
        user_id: Option<DbId>,
        message_type: &str,
        content: &str,
    ) -> Result<ChatMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_messages (room_id, user_id, message_type, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(room_id)
            .bind(user_id)
            .bind(message_type)
            .bind(content)
            .fetch_one(conn)
            .await
    }

    /// Link a flow to its room (one-to-one, never re-pointed).
    pub async fn link_room(
        conn: &mut PgConnection,
        flow_id: DbId,
        room_id: DbId,
    ) -> Result<ApprovalChatRoom, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_chat_rooms (flow_id, room_id) \
             VALUES ($1, $2) \
             RETURNING {LINK_COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalChatRoom>(&query)
            .bind(flow_id)
            .bind(room_id)
            .fetch_one(conn)
            .await
    }

    /// The room linked to a flow, if one exists (tx variant).
    pub async fn room_for_flow(
        conn: &mut PgConnection,
        flow_id: DbId,
    ) -> Result<Option<ApprovalChatRoom>, sqlx::Error> {
        let query = format!("SELECT {LINK_COLUMNS} FROM approval_chat_rooms WHERE flow_id = $1");
        sqlx::query_as::<_, ApprovalChatRoom>(&query)
            .bind(flow_id)
            .fetch_optional(conn)
            .await
    }

    /// Messages in a room, chronological (used by tests and the chat app).
    pub async fn list_messages(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE room_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// Members of a room.
    pub async fn list_members(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<ChatRoomMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM chat_room_members \
             WHERE room_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ChatRoomMember>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }
}
