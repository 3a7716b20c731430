/// Converts a camelCase key to snake_case.
///
/// A boundary goes before an uppercase letter that follows a lowercase letter
/// or digit, and before the last letter of an uppercase run when a lowercase
/// letter follows it. The result is lowercased, so `facilityId` becomes
/// `facility_id` and `HTTPResponse` becomes `http_response`. Existing
/// underscores are kept as-is, so `manager_Id` becomes `manager__id`.
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut snake = String::with_capacity(key.len() + 4);

    for (index, &current) in chars.iter().enumerate() {
        if current.is_ascii_uppercase()
            && let Some(&previous) = index.checked_sub(1).and_then(|prior| chars.get(prior))
        {
            let next = chars.get(index + 1).copied();
            let after_word = previous.is_ascii_lowercase() || previous.is_ascii_digit();
            let starts_word = next.is_some_and(|following| following.is_ascii_lowercase());
            if after_word || starts_word {
                snake.push('_');
            }
        }
        snake.push(current.to_ascii_lowercase());
    }
    snake
}
