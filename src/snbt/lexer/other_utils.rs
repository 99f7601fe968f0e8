//! Specialized lexing functions for parsing tokens that require
//! manipulating strings and characters.

use crate::settings::{EscapeSequence, HandleInvalidEscape};
use crate::snbt::SnbtError;
use super::Lexer;


/// Returns whether a character is in `[0-9a-zA-Z]` or is `_`, `-`, `.`, or `+`,
/// which are the characters allowed to be in unquoted strings.
pub fn allowed_unquoted(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
}

/// Returns whether a character is in `[0-9]` or is `-`, `.`, or `+`,
/// which can be the first character of a valid integer or float tag in SNBT.
pub fn starts_unquoted_number(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '.' | '+')
}

fn chars_to_u8(chars: [char; 2]) -> Option<u8> {
    let nibbles = [
        chars[0].to_digit(16)? as u8,
        chars[1].to_digit(16)? as u8,
    ];

    Some((nibbles[0] << 4) + nibbles[1])
}

fn chars_to_u16(chars: [char; 4]) -> Option<u16> {
    let nibbles = chars.map(|c| c.to_digit(16));

    let mut sum: u32 = nibbles[0]?;
    for nibble in nibbles {
        sum = (sum << 4) + nibble?;
    }

    Some(sum as u16)
}

fn chars_to_u32(chars: [char; 8]) -> Option<u32> {
    let nibbles = chars.map(|c| c.to_digit(16));

    let mut sum: u32 = 0;
    for nibble in nibbles {
        sum = (sum << 4) + nibble?;
    }

    Some(sum)
}


// ================================
//      Escape sequence parsing
// ================================

impl Lexer<'_> {
    /// Parses the body of an escape sequence (i.e., excluding the initial backslash),
    /// and returns the character indicated by the escape as well as the number
    /// of characters in the escape sequence's body.
    /// Returns `Ok(None)` if the escape sequence should be ignored;
    /// returns `Ok(Some((None, body_char_width)))` if the escape sequence should be
    /// copied verbatim instead of interpreted as an escaped character.
    ///
    /// `index` should be the index of the escape sequence's start, i.e., the backslash.
    pub fn parse_escape_sequence(
        &mut self,
        index: usize,
    ) -> Result<Option<(Option<char>, usize)>, SnbtError> {
        let escapes = self.opts.enabled_escape_sequences;
        let handle_invalid = self.opts.handle_invalid_escape;
        let check_supported: _ = |escaped: char, escape_type: EscapeSequence, parsed_width: usize| {
            if escapes.is_enabled(escape_type) {
                Ok(Some((Some(escaped), parsed_width)))
            } else {
                match handle_invalid {
                    HandleInvalidEscape::CopyVerbatim => Ok(Some((None, parsed_width))),
                    HandleInvalidEscape::Ignore => Ok(None),
                    HandleInvalidEscape::Error => Err(SnbtError::unsupported_escape_sequence(
                        self.raw,
                        index,
                        parsed_width + 1,
                    )),
                }
            }
        };

        let Some(ch) = self.peek_ch() else {
            self.next_ch();
            return match handle_invalid {
                HandleInvalidEscape::CopyVerbatim => Ok(Some((None, 0))),
                HandleInvalidEscape::Ignore => Ok(None),
                HandleInvalidEscape::Error => Err(SnbtError::unexpected_eos(
                    "a character escape sequence"
                )),
            };
        };

        if matches!(
            ch,
            '\'' | '"' | '\\'
                | 'b' | 's' | 't' | 'n' | 'f' | 'r'
                | 'x' | 'u' | 'U' | 'N'
        ) {
            self.next_ch();
        }

        match ch {
            '\'' | '"' | '\\' => Ok(Some((Some(ch), 1))),
            'b' => check_supported('\x08', EscapeSequence::B, 1),
            's' => check_supported('\x20', EscapeSequence::S, 1),
            't' => check_supported('\x09', EscapeSequence::T, 1),
            'n' => check_supported('\x0a', EscapeSequence::N, 1),
            'f' => check_supported('\x0c', EscapeSequence::F, 1),
            'r' => check_supported('\x0d', EscapeSequence::R, 1),
            'x' => self.parse_unicode_two(index),
            'u' => self.parse_unicode_four(index),
            'U' => self.parse_unicode_eight(index),
            'N' => self.parse_unicode_named(index),
            _ => match handle_invalid {
                HandleInvalidEscape::CopyVerbatim => Ok(Some((None, 0))),
                HandleInvalidEscape::Ignore => Ok(None),
                HandleInvalidEscape::Error => {
                    self.next_ch();
                    Err(SnbtError::unknown_escape_sequence(
                        self.raw,
                        index,
                        2
                    ))
                }
            }
        }
    }

    fn parse_unicode_two(
        &mut self,
        index: usize
    ) -> Result<Option<(Option<char>, usize)>, SnbtError> {

        let enabled = self.opts.enabled_escape_sequences.is_enabled(EscapeSequence::UnicodeTwo);
        let handle_invalid = self.opts.handle_invalid_escape;

        if !enabled {
            match handle_invalid {
                HandleInvalidEscape::Error => {},
                HandleInvalidEscape::Ignore => {
                    self.next_ch();
                    self.next_ch();
                    return Ok(None);
                }
                HandleInvalidEscape::CopyVerbatim => {
                    let mut parsed_width = 0;
                    if self.next_ch().is_some() {
                        parsed_width += 1;
                    }
                    if self.next_ch().is_some() {
                        parsed_width += 1;
                    }

                    return Ok(Some((None, parsed_width)));
                }
            }
        }

        let chars = [
            self.next_ch().ok_or_else(|| SnbtError::unexpected_eos(
                "two-character hex unicode value",
            ))?,
            self.next_ch().ok_or_else(|| SnbtError::unexpected_eos(
                "two-character hex unicode value",
            ))?,
        ];

        let utf_val = u32::from(chars_to_u8(chars).ok_or_else(|| {
            SnbtError::unexpected_token_at(
                self.raw,
                index + 2,
                2,
                "two hexadecimal digits",
            )
        })?);

        let escaped = char::from_u32(utf_val)
            .ok_or_else(|| SnbtError::unknown_escape_sequence(
                self.raw,
                index,
                4,
            ))?;

        if enabled {
            Ok(Some((Some(escaped), 3)))
        } else {
            Err(SnbtError::unsupported_escape_sequence(
                self.raw,
                index,
                3 + 1,
            ))
        }
    }

    fn parse_unicode_four(
        &mut self,
        index: usize
    ) -> Result<Option<(Option<char>, usize)>, SnbtError> {
        let enabled = self.opts.enabled_escape_sequences.is_enabled(EscapeSequence::UnicodeFour);
        let handle_invalid = self.opts.handle_invalid_escape;

        if !enabled {
            match handle_invalid {
                HandleInvalidEscape::Error => {},
                HandleInvalidEscape::Ignore => {
                    for _ in 0..4 {
                        self.next_ch();
                    }
                    return Ok(None);
                }
                HandleInvalidEscape::CopyVerbatim => {
                    let mut parsed_width = 0;
                    for _ in 0..4 {
                        if self.next_ch().is_some() {
                            parsed_width += 1;
                        }
                    }
                    return Ok(Some((None, parsed_width)));
                }
            }
        }

        let mut get_char = || {
            self.next_ch().ok_or_else(|| SnbtError::unexpected_eos(
                "four-character hex unicode value",
            ))
        };

        let chars = [get_char()?, get_char()?, get_char()?, get_char()?];

        let utf_val = u32::from(chars_to_u16(chars).ok_or_else(|| {
            SnbtError::unexpected_token_at(
                self.raw,
                index + 2,
                4,
                "four hexadecimal digits",
            )
        })?);

        let escaped = char::from_u32(utf_val)
            .ok_or_else(|| SnbtError::unknown_escape_sequence(
                self.raw,
                index,
                6,
            ))?;

        if enabled {
            Ok(Some((Some(escaped), 5)))
        } else {
            Err(SnbtError::unsupported_escape_sequence(
                self.raw,
                index,
                5 + 1,
            ))
        }
    }

    fn parse_unicode_eight(
        &mut self,
        index: usize
    ) -> Result<Option<(Option<char>, usize)>, SnbtError> {
        let enabled = self.opts.enabled_escape_sequences.is_enabled(EscapeSequence::UnicodeEight);
        let handle_invalid = self.opts.handle_invalid_escape;

        if !enabled {
            match handle_invalid {
                HandleInvalidEscape::Error => {},
                HandleInvalidEscape::Ignore => {
                    for _ in 0..8 {
                        self.next_ch();
                    }
                    return Ok(None);
                }
                HandleInvalidEscape::CopyVerbatim => {
                    let mut parsed_width = 0;
                    for _ in 0..8 {
                        if self.next_ch().is_some() {
                            parsed_width += 1;
                        }
                    }
                    return Ok(Some((None, parsed_width)));
                }
            }
        }

        let mut get_char = || {
            self.next_ch().ok_or_else(|| SnbtError::unexpected_eos(
                "eight-character hex unicode value",
            ))
        };

        let chars = [
            get_char()?, get_char()?, get_char()?, get_char()?,
            get_char()?, get_char()?, get_char()?, get_char()?,
        ];

        let utf_val = chars_to_u32(chars).ok_or_else(|| {
            SnbtError::unexpected_token_at(
                self.raw,
                index + 2,
                8,
                "eight hexadecimal digits",
            )
        })?;

        let escaped = char::from_u32(utf_val)
            .ok_or_else(|| SnbtError::unknown_escape_sequence(
                self.raw,
                index,
                10,
            ))?;

        if enabled {
            Ok(Some((Some(escaped), 9)))
        } else {
            Err(SnbtError::unsupported_escape_sequence(
                self.raw,
                index,
                9 + 1,
            ))
        }
    }

    fn parse_unicode_named(
        &mut self,
        index: usize
    ) -> Result<Option<(Option<char>, usize)>, SnbtError> {
        let enabled = self.opts.enabled_escape_sequences.is_enabled(EscapeSequence::UnicodeNamed);
        let handle_invalid = self.opts.handle_invalid_escape;

        if !enabled {
            match handle_invalid {
                HandleInvalidEscape::Error => {},
                HandleInvalidEscape::Ignore => {
                    if let Some(ch) = self.next_ch() {
                        if ch == '{' {
                            while let Some(ch) = self.next_ch() {
                                if ch == '}' {
                                    break;
                                }
                            }
                        }
                    }
                    return Ok(None);
                }
                HandleInvalidEscape::CopyVerbatim => {
                    let mut parsed_width = 0;
                    if let Some(ch) = self.next_ch() {
                        parsed_width += 1;
                        if ch == '{' {
                            while let Some(ch) = self.next_ch() {
                                parsed_width += 1;
                                if ch == '}' {
                                    break;
                                }
                            }
                        }
                    }
                    return Ok(Some((None, parsed_width)));
                }
            }
        }

        if let Some(ch) = self.next_ch() {
            if ch != '{' {
                return Err(SnbtError::unexpected_token_at(
                    self.raw,
                    index,
                    1,
                    "an opening curly bracket",
                ));
            }
        } else {
            return Err(SnbtError::unexpected_eos("a named unicode character escape"));
        }

        let mut total_char_width = 3; // '\\', 'N', and '{'
        loop {
            if let Some(ch) = self.next_ch() {
                total_char_width += 1;
                if ch == '}' {
                    break;
                }
            } else {
                // index is '\\', index+1 is 'N', index+2 is '{'
                return Err(SnbtError::unmatched_brace(self.raw, index + 2));
            }
        }

        #[cfg(feature = "named_escapes")]
        {
            let name_start = index + 3;
            let name_end = self.index - 1;

            let escaped = unicode_names2::character(&self.raw[name_start..name_end])
                .ok_or_else(|| SnbtError::unknown_escape_sequence(
                    self.raw,
                    index,
                    total_char_width,
                ))?;

            if enabled {
                Ok(Some((Some(escaped), total_char_width - 1)))
            } else {
                Err(SnbtError::unsupported_escape_sequence(
                    self.raw,
                    index,
                    total_char_width,
                ))
            }
        }
        #[cfg(not(feature = "named_escapes"))]
        {
            Err(SnbtError::named_escape_sequence(self.raw, index, total_char_width))
        }
    }
}
