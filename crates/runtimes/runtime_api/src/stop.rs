/// Cut `text` at the earliest occurrence of any stop sequence.
///
/// Returns true when a stop sequence was found. Empty stop strings are
/// ignored.
pub fn truncate_at_stop(text: &mut String, stops: &[String]) -> bool {
    let earliest = stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min();

    match earliest {
        Some(idx) => {
            text.truncate(idx);
            true
        }
        None => false,
    }
}
