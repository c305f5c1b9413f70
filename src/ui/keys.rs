//! Escape-sequence decoding (§4.7): a buffered escape byte is either
//! completed into a named key within the pending window or returned alone.
//! Mirrors `translate_escape_sequence`/`read_input_key`, adapted to work
//! off a slice the caller has already buffered instead of a blocking
//! re-read loop.

use super::event::Key;

/// Translates a CSI (`ESC [ ...`) or SS3 (`ESC O ...`) sequence, *not*
/// including the leading `ESC`, into a named key. Returns `None` if the
/// sequence isn't recognized, in which case the caller should fall back to
/// a lone `Esc`. Mirrors `translate_escape_sequence`.
pub fn translate_escape_sequence(seq: &[char]) -> Option<Key> {
    if seq.is_empty() {
        return None;
    }

    match seq[0] {
        '[' if seq.len() == 2 => match seq[1] {
            'A' => Some(Key::Up),
            'B' => Some(Key::Down),
            'C' => Some(Key::Right),
            'D' => Some(Key::Left),
            'F' => Some(Key::End),
            'H' => Some(Key::Home),
            _ => None,
        },
        '[' if seq.len() >= 3 && seq[seq.len() - 1] == '~' => {
            let digits: String = seq[1..seq.len() - 1].iter().collect();
            let value: u32 = digits.parse().ok()?;
            match value {
                1 | 7 => Some(Key::Home),
                2 => Some(Key::Insert),
                3 => Some(Key::Delete),
                4 | 8 => Some(Key::End),
                5 => Some(Key::PageUp),
                6 => Some(Key::PageDown),
                11 => Some(Key::F(1)),
                12 => Some(Key::F(2)),
                13 => Some(Key::F(3)),
                14 => Some(Key::F(4)),
                15 => Some(Key::F(5)),
                17 => Some(Key::F(6)),
                18 => Some(Key::F(7)),
                19 => Some(Key::F(8)),
                20 => Some(Key::F(9)),
                21 => Some(Key::F(10)),
                23 => Some(Key::F(11)),
                24 => Some(Key::F(12)),
                _ => None,
            }
        }
        'O' if seq.len() == 2 => match seq[1] {
            'A' => Some(Key::Up),
            'B' => Some(Key::Down),
            'C' => Some(Key::Right),
            'D' => Some(Key::Left),
            'F' => Some(Key::End),
            'H' => Some(Key::Home),
            'P' => Some(Key::F(1)),
            'Q' => Some(Key::F(2)),
            'R' => Some(Key::F(3)),
            'S' => Some(Key::F(4)),
            _ => None,
        },
        _ => None,
    }
}

/// True if `c` is a character the search-string editor accepts verbatim
/// (anything printable that isn't one of the specially-validated markers
/// handled by the caller). Mirrors `is_typeable_key`.
pub fn is_typeable(c: char) -> bool {
    !c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_sequences_decode() {
        assert_eq!(translate_escape_sequence(&['[', 'A']), Some(Key::Up));
        assert_eq!(translate_escape_sequence(&['[', 'D']), Some(Key::Left));
    }

    #[test]
    fn function_key_tilde_sequences_decode() {
        assert_eq!(translate_escape_sequence(&['[', '1', '4', '~']), Some(Key::F(4)));
        assert_eq!(translate_escape_sequence(&['[', '5', '~']), Some(Key::PageUp));
    }

    #[test]
    fn ss3_function_keys_decode() {
        assert_eq!(translate_escape_sequence(&['O', 'P']), Some(Key::F(1)));
    }

    #[test]
    fn unrecognized_sequence_is_none() {
        assert_eq!(translate_escape_sequence(&['[', 'Z']), None);
    }
}
