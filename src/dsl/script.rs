//! Minimal script splitting: sentences into commands, commands into tokens.
//! No filler stripping happens here; the compiler skips unknown words.

/// Characters trimmed from both ends of a token.
const TRIM: &[char] = &[',', ';', ':', '!', '?', '(', ')', '\''];

/// Split `script` into commands on `separator`, outside of quotes. A
/// separator between two digits belongs to a number (`2.5cm`). Blank
/// commands are dropped.
pub fn split_commands(script: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        let trimmed = script.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut commands = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut rest = script;

    while let Some(ch) = rest.chars().next() {
        if ch == '"' {
            in_quote = !in_quote;
        }
        if !in_quote {
            if let Some(after) = rest.strip_prefix(separator) {
                let in_number = current.chars().next_back().is_some_and(|c| c.is_ascii_digit())
                    && after.chars().next().is_some_and(|c| c.is_ascii_digit());
                if !in_number {
                    commands.push(std::mem::take(&mut current));
                    rest = after;
                    continue;
                }
            }
        }
        current.push(ch);
        rest = rest.get(ch.len_utf8()..).unwrap_or("");
    }
    commands.push(current);

    commands
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Split one command into tokens. Quoted runs stay one token, quotes
/// included, and keep their case.
pub fn tokenize(command: &str, lowercase: bool) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        let word = current.trim_matches(TRIM);
        if !word.is_empty() {
            let quoted = word.starts_with('"');
            tokens.push(if lowercase && !quoted {
                word.to_lowercase()
            } else {
                word.to_string()
            });
        }
        current.clear();
    };

    for ch in command.chars() {
        if ch == '"' {
            if in_quote {
                current.push(ch);
                flush(&mut current, &mut tokens);
                in_quote = false;
                continue;
            }
            flush(&mut current, &mut tokens);
            in_quote = true;
            current.push(ch);
            continue;
        }
        if ch.is_whitespace() && !in_quote {
            flush(&mut current, &mut tokens);
        } else {
            current.push(ch);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}
