use wren_core::Jid;
use wren_db::WrenDb;

use crate::error::WaError;
use crate::Result;

/// How many name matches to consider before giving up as ambiguous.
const MAX_CANDIDATES: i64 = 10;

/// Resolves a user-supplied recipient string to exactly one JID.
///
/// Accepts a full identifier, a bare phone (digits, length > 5), or a chat
/// name fragment. Multiple name matches fail with the candidate list so the
/// caller can disambiguate.
pub async fn resolve_recipient(db: &WrenDb, input: &str) -> Result<Jid> {
    let input = input.trim();
    if input.contains('@') {
        return Jid::parse(input).map_err(|_| WaError::InvalidRecipient(input.to_string()));
    }
    if input.len() > 5 && input.chars().all(|c| c.is_ascii_digit()) {
        return Ok(Jid::direct(input));
    }

    let matches = db.match_chats_by_name(input, MAX_CANDIDATES).await?;
    match matches.as_slice() {
        [] => Err(WaError::RecipientNotFound {
            input: input.to_string(),
        }),
        [(jid, _)] => Jid::parse(jid).map_err(|_| WaError::InvalidRecipient(jid.clone())),
        _ => Err(WaError::AmbiguousRecipient {
            input: input.to_string(),
            candidates: matches
                .iter()
                .map(|(jid, name)| format!("{name} ({jid})"))
                .collect(),
        }),
    }
}
