/// Trims `value` and checks it holds 1 to `max` characters. The error is a
/// client-facing message naming `field`.
pub fn bounded(field: &str, value: &str, max: usize) -> Result<String, String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > max {
        return Err(format!("{field} must be 1 to {max} characters"));
    }
    Ok(trimmed.to_string())
}
