//! Turns extracted entity strings into literals that can be embedded in a
//! single-quoted Cypher string.

/// Strip possessives, trim, and escape single quotes.
///
/// The result never contains an unescaped `'` and never ends in a lone
/// backslash, and `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.to_string();
    // Removing one "'s" can expose another ("''ss")
    while text.contains("'s") {
        text = text.replace("'s", "");
    }

    escape_quotes(text.trim())
}

/// A quote preceded by an odd run of backslashes is already escaped.
fn escape_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut backslashes = 0usize;

    for ch in text.chars() {
        match ch {
            '\\' => {
                backslashes += 1;
                out.push(ch);
            }
            '\'' => {
                if backslashes % 2 == 0 {
                    out.push('\\');
                }
                out.push(ch);
                backslashes = 0;
            }
            _ => {
                out.push(ch);
                backslashes = 0;
            }
        }
    }

    // A trailing lone backslash would escape the closing quote
    if backslashes % 2 == 1 {
        out.push('\\');
    }

    out
}
