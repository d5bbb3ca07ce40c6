use super::StoreError;

fn segment<'a>(entity: &str, value: &'a str) -> Result<&'a str, StoreError> {
    if value.is_empty() || value.contains(':') {
        return Err(StoreError::Validation(format!(
            "invalid {entity} id '{value}': must be non-empty and must not contain ':'"
        )));
    }
    Ok(value)
}

pub fn deck_key(deck_id: &str) -> Result<String, StoreError> {
    Ok(segment("deck", deck_id)?.to_string())
}

pub fn deck_pathname_index_key(pathname: &str) -> String {
    format!("pathname:{}", pathname.to_lowercase())
}

pub fn card_key(deck_id: &str, card_id: &str) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{}",
        segment("deck", deck_id)?,
        segment("card", card_id)?
    ))
}

pub fn card_prefix(deck_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("deck", deck_id)?))
}

/// Ascending by due time within a deck.
pub fn card_due_index_key(
    deck_id: &str,
    due_at_ms: i64,
    card_id: &str,
) -> Result<String, StoreError> {
    let ts = due_at_ms.max(0) as u64;
    Ok(format!(
        "{}:{:020}:{}",
        segment("deck", deck_id)?,
        ts,
        segment("card", card_id)?
    ))
}

pub fn card_due_index_prefix(deck_id: &str) -> Result<String, StoreError> {
    card_prefix(deck_id)
}

/// Upper bound (inclusive) of the due index scan for cards due at `now_ms`.
pub fn card_due_index_upper_bound(deck_id: &str, now_ms: i64) -> Result<String, StoreError> {
    let ts = now_ms.max(0) as u64;
    Ok(format!("{}:{:020}:\u{ff}", segment("deck", deck_id)?, ts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_index_orders_by_time_asc() {
        let early = card_due_index_key("d1", 1000, "zzz").unwrap();
        let late = card_due_index_key("d1", 2000, "aaa").unwrap();
        assert!(early < late);
        assert!(late <= card_due_index_upper_bound("d1", 2000).unwrap());
        assert!(late > card_due_index_upper_bound("d1", 1999).unwrap());
    }

    #[test]
    fn ids_with_separator_are_rejected() {
        assert!(matches!(
            card_key("d:1", "c1"),
            Err(StoreError::Validation(_))
        ));
        assert!(deck_key("").is_err());
    }

    #[test]
    fn pathname_index_is_normalized() {
        assert_eq!(deck_pathname_index_key("My-Deck"), "pathname:my-deck");
    }
}
