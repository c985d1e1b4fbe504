//! Chat-room linkage for approval flows.
//!
//! Each flow gets a private room named deterministically from its document
//! id, created at submission and never re-pointed. Membership is kept in
//! sync with the current approver using get-or-create semantics. Posting a
//! system message to a flow without a linked room is a silent no-op: chat is
//! an enhancement, not a correctness dependency of the engine.

use signoff_core::types::DbId;
use signoff_db::models::chat::{ChatRoom, MESSAGE_TYPE_SYSTEM, ROOM_ROLE_MODERATOR};
use signoff_db::models::document::Document;
use signoff_db::models::organization::User;
use signoff_db::repositories::ChatRepo;
use sqlx::PgConnection;

/// Deterministic room name for a document's approval flow.
pub fn room_name(document_id: DbId) -> String {
    format!("approval-doc-{document_id}")
}

/// Create the flow's private room, add the submitter and first approver as
/// moderators, link it to the flow, and post the welcome message.
pub async fn create_room_for(
    conn: &mut PgConnection,
    flow_id: DbId,
    document: &Document,
    submitter_id: DbId,
    approver: &User,
) -> Result<ChatRoom, sqlx::Error> {
    let room = ChatRepo::create_room(
        conn,
        &room_name(document.id),
        &format!("Approval: {}", document.title),
        true,
        submitter_id,
    )
    .await?;

    ChatRepo::add_member_if_absent(conn, room.id, submitter_id, ROOM_ROLE_MODERATOR).await?;
    ChatRepo::add_member_if_absent(conn, room.id, approver.id, ROOM_ROLE_MODERATOR).await?;
    ChatRepo::link_room(conn, flow_id, room.id).await?;

    ChatRepo::post_message(
        conn,
        room.id,
        None,
        MESSAGE_TYPE_SYSTEM,
        &format!(
            "Approval workflow started for \"{}\". First approver: @{}",
            document.title, approver.display_name
        ),
    )
    .await?;

    Ok(room)
}

/// Idempotently ensure the user is a member of the flow's room.
///
/// Returns `false` (doing nothing) when the flow has no linked room.
pub async fn sync_membership(
    conn: &mut PgConnection,
    flow_id: DbId,
    user_id: DbId,
) -> Result<bool, sqlx::Error> {
    let Some(link) = ChatRepo::room_for_flow(conn, flow_id).await? else {
        return Ok(false);
    };
    ChatRepo::add_member_if_absent(conn, link.room_id, user_id, ROOM_ROLE_MODERATOR).await?;
    Ok(true)
}

/// Post a system message to the flow's room; no-op when no room is linked.
pub async fn post_system_message(
    conn: &mut PgConnection,
    flow_id: DbId,
    text: &str,
) -> Result<(), sqlx::Error> {
    let Some(link) = ChatRepo::room_for_flow(conn, flow_id).await? else {
        return Ok(());
    };
    ChatRepo::post_message(conn, link.room_id, None, MESSAGE_TYPE_SYSTEM, text).await?;
    Ok(())
}
