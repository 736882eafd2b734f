/// Canonical form used for lookups and the unique constraint.
///
/// Lowercases the address, and in the local part drops dots and anything
/// after a `+`. Returns `None` when the input is not `local@domain`.
pub fn clean_email(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let (local, domain) = lowered.split_once('@')?;
    if domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return None;
    }
    let local = local.split('+').next().unwrap_or(local).replace('.', "");
    if local.is_empty() {
        return None;
    }
    Some(format!("{local}@{domain}"))
}
