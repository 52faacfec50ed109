use super::{EncodeResult, Encoder, Encoding};
use crate::blink::{BlinkDescriptor, DEFAULT_PERIOD_MS};

/// A single morse signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Dot,
    Dash,
    LetterBreak,
    WordBreak,
}

impl Symbol {
    pub fn is_break(self) -> bool {
        matches!(self, Self::LetterBreak | Self::WordBreak)
    }

    pub fn blink(self) -> BlinkDescriptor {
        match self {
            Self::Dot => BlinkDescriptor::new(50.0, DEFAULT_PERIOD_MS),
            Self::Dash => BlinkDescriptor::new(75.0, 2000.0),
            Self::LetterBreak => BlinkDescriptor::new(0.0, 500.0),
            Self::WordBreak => BlinkDescriptor::new(0.0, 3500.0),
        }
    }
}

/// Text to morse code, registered as `morse` by default
#[derive(Debug, Clone, Copy, Default)]
pub struct MorseEncoder;

impl Encoder for MorseEncoder {
    fn encode(&self, input: &str) -> Encoding {
        let result: EncodeResult = Ok(to_morse(input).into());
        Encoding::Ready(result)
    }
}

/// Encode `input` as blink descriptors.
///
/// Upper-case letters are encoded like their lower-case form rather than
/// dropped, so `"SOS"` and `"sos"` blink the same. Other characters without a
/// morse code are skipped. Letters are separated by a
/// letter break unless a space follows, spaces become word breaks, and the
/// sequence never ends with a break.
pub fn to_morse(input: &str) -> Vec<BlinkDescriptor> {
    symbols(input).into_iter().map(Symbol::blink).collect()
}

pub(crate) fn symbols(input: &str) -> Vec<Symbol> {
    let chars: Vec<char> = input
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| *c == ' ' || code(*c).is_some())
        .collect();

    let mut out = Vec::new();
    for (i, c) in chars.iter().enumerate() {
        let Some(code) = code(*c) else {
            out.push(Symbol::WordBreak);
            continue;
        };

        out.extend(code.chars().map(|s| match s {
            '.' => Symbol::Dot,
            _ => Symbol::Dash,
        }));

        if matches!(chars.get(i + 1), Some(next) if *next != ' ') {
            out.push(Symbol::LetterBreak);
        }
    }

    while out.last().is_some_and(|s| s.is_break()) {
        out.pop();
    }
    out
}

fn code(c: char) -> Option<&'static str> {
    let code = match c {
        'a' => "._",
        'b' => "_...",
        'c' => "_._.",
        'd' => "_..",
        'e' => ".",
        'f' => ".._.",
        'g' => "__.",
        'h' => "....",
        'i' => "..",
        'j' => ".___",
        'k' => "_._",
        'l' => "._..",
        'm' => "__",
        'n' => "_.",
        'o' => "___",
        'p' => ".__.",
        'q' => "__._",
        'r' => "._.",
        's' => "...",
        't' => "_",
        'u' => ".._",
        'v' => "..._",
        'w' => ".__",
        'x' => "_.._",
        'y' => "_.__",
        'z' => "__..",
        '1' => ".____",
        '2' => "..___",
        '3' => "...__",
        '4' => "...._",
        '5' => ".....",
        '6' => "_....",
        '7' => "__...",
        '8' => "___..",
        '9' => "____.",
        '0' => "_____",
        '.' => "._._._",
        ',' => "__..__",
        '?' => "..__..",
        '\'' => ".____.",
        '!' => "_._.__",
        '/' => "_.._.",
        '(' => "_.__.",
        ')' => "_.__._",
        ':' => "___...",
        ';' => "_._._.",
        '=' => "_..._",
        '+' => "._._.",
        '-' => "_...._",
        '"' => "._.._.",
        '@' => ".__._.",
        _ => return None,
    };
    Some(code)
}
