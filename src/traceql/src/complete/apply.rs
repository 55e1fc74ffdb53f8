use super::CompletionItem;

/// The editor state a completion is applied to
pub trait EditorView {
    /// Text between two offsets, empty when the range is out of bounds
    fn slice_doc(&self, from: usize, to: usize) -> &str;

    /// Replace `from..to` with `text`
    fn insert_completion_text(&mut self, text: &str, from: usize, to: usize);
}

impl EditorView for String {
    fn slice_doc(&self, from: usize, to: usize) -> &str {
        self.get(from..to).unwrap_or("")
    }

    fn insert_completion_text(&mut self, text: &str, from: usize, to: usize) {
        if from > to || !self.is_char_boundary(from) || !self.is_char_boundary(to) {
            log::warn!("Ignoring completion for invalid range {from}..{to}");
            return;
        }
        self.replace_range(from..to, text);
    }
}

/// Insert a string value, adding the quotes that are not already around the range.
///
/// Handles `{ name=HTTP`, `{ name="x` and `{ name="x"` with the cursor after the `x`.
pub fn apply_quoted_completion(
    view: &mut dyn EditorView,
    completion: &CompletionItem,
    from: usize,
    to: usize,
) {
    let mut text = String::with_capacity(completion.label.len() + 2);
    if from == 0 || view.slice_doc(from - 1, from) != "\"" {
        text.push('"');
    }
    text.push_str(&completion.label);
    if view.slice_doc(to, to + 1) != "\"" {
        text.push('"');
    }
    view.insert_completion_text(&text, from, to);
}
